mod client;

pub use client::{ResponsesClient, ResponsesConfig};
