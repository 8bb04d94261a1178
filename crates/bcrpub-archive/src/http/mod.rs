//! HTTP downloading with retry.

mod client;

pub use client::{is_retryable_status, HttpClient};
