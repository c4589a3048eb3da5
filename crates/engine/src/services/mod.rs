//! Subprocess-backed auxiliary services
//!
//! Each client implements one of the core service traits on top of a program
//! living in the hooks directory.

pub mod binary;
pub mod cache;
pub mod filter;
pub mod queue;

pub use binary::AuxBinary;
pub use cache::CacheClient;
pub use filter::SmartFilterClient;
pub use queue::BackgroundQueueClient;
