use crate::error::{RelayError, Result};

/// Open the Zenoh session the relay publishes through.
///
/// With `ZENOH_ENDPOINT` set, connects in client mode to that router with
/// scouting disabled. Otherwise uses the Zenoh default peer configuration.
pub async fn open_session() -> Result<zenoh::Session> {
    let config = match std::env::var("ZENOH_ENDPOINT") {
        Ok(endpoint) => client_config(&endpoint)?,
        Err(_) => {
            log::info!("ZENOH_ENDPOINT not set, using peer mode");
            zenoh::Config::default()
        }
    };

    let session = zenoh::open(config)
        .await
        .map_err(|e| RelayError::Zenoh(format!("Failed to open Zenoh session: {}", e)))?;

    log::info!("Connected to Zenoh");
    Ok(session)
}

fn client_config(endpoint: &str) -> Result<zenoh::Config> {
    if endpoint.is_empty() || endpoint.contains(|c: char| c == '"' || c.is_whitespace()) {
        return Err(RelayError::Zenoh(format!(
            "Invalid ZENOH_ENDPOINT '{}'",
            endpoint
        )));
    }

    log::info!("Connecting to Zenoh router at: {}", endpoint);

    // Client mode only, no scouting for peers beyond the given router
    let json5 = format!(
        r#"{{
            mode: "client",
            connect: {{ endpoints: ["{endpoint}"] }},
            scouting: {{
                multicast: {{ enabled: false }},
                gossip: {{ enabled: false }},
            }},
        }}"#
    );
    zenoh::Config::from_json5(&json5)
        .map_err(|e| RelayError::Zenoh(format!("Invalid Zenoh client config: {}", e)))
}
