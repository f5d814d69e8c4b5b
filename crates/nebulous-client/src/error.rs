use nebulous_protocol::CodecError;
use nebulous_types::ConnectResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server refused the connect request: {0:?}")]
    ConnectFailed(ConnectResult),
    #[error("Timed out waiting for the connect result")]
    ConnectTimeout,
    #[error("Socket operation timed out")]
    Timeout,
    #[error("Unexpected packet during handshake")]
    UnexpectedPacket,
    #[error("Client is not connected")]
    NotConnected,
    #[error("Client is already connected")]
    AlreadyConnected,
    #[error("Local player has not been discovered yet")]
    PlayerNotFound,
    #[error("A signed-in account is required")]
    NotSignedIn,
    #[error("Session channels closed")]
    ChannelClosed,
    #[error("Callback failed: {0}")]
    Callback(anyhow::Error),
}

// anyhow::Error is not std::error::Error, so thiserror's #[from] cannot
// derive this one
impl From<anyhow::Error> for ClientError {
    fn from(error: anyhow::Error) -> Self {
        ClientError::Callback(error)
    }
}
