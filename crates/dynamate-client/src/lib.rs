pub mod client;
pub mod error;
mod retry;

pub use client::{BackendAck, DynamateClient};
pub use error::ClientError;
