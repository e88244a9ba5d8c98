use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs a pipeline's phases in order. The first failing phase ends the run;
/// nothing is retried.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting recipe processing");

        tracing::info!("Extracting recipes...");
        let records = self.pipeline.extract().await.map_err(|e| {
            tracing::error!("Extract phase failed: {}", e);
            e
        })?;
        self.monitor.log_stats("Extract");

        tracing::info!("Transforming {} recipes...", records.len());
        let result = self.pipeline.transform(records).await.map_err(|e| {
            tracing::error!("Transform phase failed: {}", e);
            e
        })?;
        tracing::info!(
            "Kept {} chili recipes in {} difficulty groups",
            result.detail.recipes.len(),
            result.summary.len()
        );
        self.monitor.log_stats("Transform");

        tracing::info!("Writing reports...");
        let output = self.pipeline.load(result).await.map_err(|e| {
            tracing::error!("Load phase failed: {}", e);
            e
        })?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        tracing::info!("Reports saved to: {}", output);
        Ok(output)
    }
}
