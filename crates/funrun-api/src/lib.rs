// funrun-api: Async HTTP client for the fun-run payment backend.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::BackendClient;
pub use error::Error;
pub use models::{DailyStats, SubmitAck};
pub use transport::TransportConfig;
