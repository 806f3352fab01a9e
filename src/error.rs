use thiserror::Error;

/// Construction and configuration failures. These are fatal to the
/// component being built and are surfaced at init.
#[derive(Debug, Error)]
pub enum PranaError {
    #[error("host environment is missing required capability: {0}")]
    MissingCapability(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Transient delivery failures. Recovered locally with retry/backoff and
/// never surfaced to callers of `enqueue_packet`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("send timed out after {0}ms")]
    Timeout(u64),

    #[error("ingest endpoint answered with status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to serialize packet: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout(0);
        }
        match err.status() {
            Some(status) => TransportError::Status(status.as_u16()),
            None => TransportError::Network(err.to_string()),
        }
    }
}

/// Durable store failures. Treated as "not persisted this cycle".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored queue is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Malformed packets handed to the Delivery Bridge. Dropped with a warning,
/// never retried, never persisted.
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("packet payload is not a JSON object")]
    NotAnObject,

    #[error("packet payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("window partition does not sum to the window length ({got} != {expected} tenths)")]
    PartitionMismatch { got: u32, expected: u32 },

    #[error("focus score {0} is outside [0, 100]")]
    ScoreOutOfRange(u8),

    #[error("packet has an empty user_id")]
    MissingUser,
}
