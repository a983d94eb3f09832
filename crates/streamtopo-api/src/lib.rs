// streamtopo-api: Async client for an SDN topology controller (REST + JSON-RPC socket)

pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use client::ControllerClient;
pub use error::Error;
