// Export modules for the gateway binary and integration tests
pub mod abi;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod rpc;

pub use client::ChainClient;
pub use error::{ClientError, ClientResult};
pub use rpc::AlloyClient;
