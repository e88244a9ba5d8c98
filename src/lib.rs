pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod transform;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalStorage, MemoryStorage};
pub use core::{etl::EtlEngine, pipeline::RecipePipeline};
pub use utils::error::{EtlError, Result};
