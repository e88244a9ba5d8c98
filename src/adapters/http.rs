use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use std::time::Duration;

/// Downloads the recipe feed. One attempt per call, no retries.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Without a timeout a request waits as long as the transport does.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| EtlError::ConfigError {
            message: format!("cannot build HTTP client: {}", e),
        })?;

        Ok(Self { client })
    }

    /// GETs `url` and stores the body verbatim at `destination`.
    ///
    /// The body is read completely before anything is written, so a failed
    /// download leaves `destination` untouched. Returns the number of bytes
    /// written.
    pub async fn fetch<S: Storage>(&self, url: &str, storage: &S, destination: &str) -> Result<usize> {
        tracing::debug!("Making API request to: {}", url);

        let body = match self.download(url).await {
            Ok(body) => body,
            Err(source) => {
                tracing::error!("Error downloading file: {}", source);
                return Err(EtlError::TransportError {
                    url: url.to_string(),
                    source,
                });
            }
        };

        if let Err(e) = storage.write_file(destination, &body).await {
            tracing::error!("Error saving downloaded file to {}: {}", destination, e);
            return Err(e);
        }

        tracing::info!(
            "File downloaded successfully to {} ({} bytes)",
            destination,
            body.len()
        );
        Ok(body.len())
    }

    async fn download(&self, url: &str) -> std::result::Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        tracing::debug!("API response status: {}", response.status());
        let body = response.error_for_status()?.bytes().await?;
        Ok(body.to_vec())
    }
}
