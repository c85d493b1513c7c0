use crate::config::RelayConfig;
use argh::FromArgs;

#[derive(FromArgs, Debug)]
/// Stream an RTSP video source to a Zenoh image topic.
pub struct Args {
    /// name of the image topic to publish on
    #[argh(option, short = 't')]
    pub topic: String,

    /// RTSP link to stream from
    #[argh(option, short = 'l')]
    pub link: String,
}

impl Args {
    pub fn into_config(self) -> RelayConfig {
        RelayConfig::new(self.topic, self.link)
    }
}
