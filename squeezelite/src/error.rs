/// Result type for squeezelite operations
pub type Result<T> = std::result::Result<T, SqueezeliteError>;

/// Error type covering configuration, discovery, control-session and
/// process-supervision failures.
///
/// Every error is fatal to the operation that raised it; nothing is
/// retried internally.
#[derive(Debug, thiserror::Error)]
pub enum SqueezeliteError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no server found on port {port}; check that LMS is running and the correct port has been set")]
    NoServerFound { port: u16 },

    #[error("multiple servers found on port {port}; set an explicit server address")]
    AmbiguousServers { port: u16 },

    #[error("discovery failed: {0}")]
    Discovery(String),

    #[error("server unreachable at {0}")]
    Unreachable(String),

    #[error("no player with MAC address {0} is registered with the server")]
    PlayerNotRegistered(String),

    #[error("no control session established; call connect() first")]
    NotConnected,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("no running process matches {0}")]
    NoSuchProcess(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
