use thiserror::Error;

// Failure of a single physical HTTP attempt
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error: {status_code} - {message}")]
    Status { status_code: u16, message: String },

    #[error("Malformed JSON body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status {
                status_code: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

// Caller input the request builder refuses to encode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid airport code {0:?}, expected three letters")]
    InvalidAirport(String),
}

// Payload did not have the shape an endpoint promises
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid price {0}: must be non-negative or the unbookable sentinel")]
    InvalidPrice(f64),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("Circuit breaker open, retry after {retry_after_ms}ms")]
    CircuitBreakerOpen { retry_after_ms: u64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Unexpected response shape: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}
