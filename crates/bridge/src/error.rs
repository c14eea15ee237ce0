#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Bridge is not attached")]
    Detached,

    #[error("Platform watch failed: {0}")]
    Watch(color_eyre::Report),
}
