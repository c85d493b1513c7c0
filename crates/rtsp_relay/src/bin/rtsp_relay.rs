use rtsp_relay::{cli::Args, session, shutdown, FrameRelayNode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    // Exits with usage and a non-zero status when -t or -l is missing
    let args: Args = argh::from_env();
    let config = args.into_config();
    config.validate()?;

    let shutdown_rx = shutdown::install(&config.node_name)?;

    let session = session::open_session().await?;

    let node = tokio::task::block_in_place(|| FrameRelayNode::connect(&session, &config))?;
    let stats = node.run(shutdown_rx).await?;

    if let Err(e) = session.close().await {
        log::warn!("Failed to close Zenoh session: {}", e);
    }

    log::info!(
        "{} shut down after publishing {} frames",
        config.node_name,
        stats.published
    );

    Ok(())
}
