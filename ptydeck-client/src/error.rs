use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("terminal command channel is closed")]
    ChannelClosed,

    #[error("no display instance for '{0}'")]
    UnknownInstance(String),

    #[error("display surface for '{0}' is not available")]
    SurfaceUnavailable(String),
}
