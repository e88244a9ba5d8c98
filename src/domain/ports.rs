use crate::domain::model::{Record, TransformResult};
use crate::transform::duration::DurationMode;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Whole-file storage. Paths are relative to the backend's root; writes
/// overwrite and create missing parent directories.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source_url(&self) -> &str;
    /// Where the downloaded feed is stored and repaired in place.
    fn input_file(&self) -> &str;
    /// Detail report, one row per chili recipe.
    fn chilies_file(&self) -> &str;
    /// Summary report, average total time per difficulty.
    fn results_file(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
    fn duration_mode(&self) -> DurationMode;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
