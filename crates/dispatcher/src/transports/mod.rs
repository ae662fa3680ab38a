//! Transport implementations
//!
//! Contains HttpTransport, LogTransport, and MemoryTransport.

mod http;
mod log;
mod memory;

pub use self::http::{HttpTransport, HttpTransportConfig};
pub use self::log::LogTransport;
pub use self::memory::MemoryTransport;
