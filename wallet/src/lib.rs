pub mod bank;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod signer;
