//! Errors surfaced by a transport façade.

/// Failure of a trigger or request at the transport level.
///
/// `Timeout` is kept distinct so callers can retry on a different
/// schedule than for outright transport failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("no responders bound to topic {0}")]
    NoResponders(String),
    #[error("handler on {0} finished without replying")]
    NoReply(String),
    #[error("message did not expect a reply")]
    UnexpectedReply,
    #[error("codec failure: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("transport is shut down")]
    Closed,
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}
