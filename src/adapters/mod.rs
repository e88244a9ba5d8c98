// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod storage;

pub use http::Fetcher;
pub use storage::{LocalStorage, MemoryStorage};
