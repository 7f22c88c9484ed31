// Client library for Ryanair's public fare-finder and availability APIs

pub mod airports;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod parser;
pub mod request;
pub mod retry;
pub mod transport;

// Re-export key types for convenience
pub use client::Ryanair;
pub use crate::config::{CircuitBreakerConfig, ClientConfig, RetryConfig};
pub use error::{ApiError, ClientError, ModelError, ParseError, RequestError, TransportError};
pub use model::{Flight, Trip, UNBOOKABLE};
pub use request::{AvailabilitySearch, DateInput, OneWaySearch, ReturnSearch, TimeInput, TimeWindow};
pub use retry::{BackoffStrategy, ExponentialBackoff, NoBackoff, RetryPolicy};
pub use transport::{HttpTransport, ReqwestTransport};
