use crate::adapters::http::Fetcher;
use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformResult};
use crate::transform::{aggregate, filter_and_enrich, parse_records, repair_in_place, report};
use crate::utils::error::{EtlError, Result};

/// Download, repair and parse the feed; build both reports; write them out.
pub struct RecipePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    fetcher: Fetcher,
}

impl<S: Storage, C: ConfigProvider> RecipePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let fetcher = Fetcher::new(config.request_timeout())?;
        Ok(Self {
            storage,
            config,
            fetcher,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for RecipePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        let input_file = self.config.input_file();

        self.fetcher
            .fetch(self.config.source_url(), &self.storage, input_file)
            .await?;
        repair_in_place(&self.storage, input_file).await?;

        let content = self.storage.read_file(input_file).await.map_err(|e| {
            tracing::error!("Error processing recipes: cannot read {}: {}", input_file, e);
            e
        })?;
        let records = parse_records(&content)?;

        tracing::info!("Read {} recipes from {}", records.len(), input_file);
        Ok(records)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let detail = filter_and_enrich(&data, self.config.duration_mode());
        let summary = aggregate(&detail.recipes);

        let render = || -> Result<(String, String)> {
            Ok((report::detail_csv(&detail)?, report::summary_csv(&summary)?))
        };
        let (detail_csv, summary_csv) = render().map_err(|e| {
            tracing::error!("Error processing recipes: {}", e);
            match e {
                EtlError::ProcessingError { .. } => e,
                other => EtlError::processing(format!("cannot render reports: {}", other)),
            }
        })?;

        for row in &summary {
            tracing::debug!(
                "{}: {} recipes, average total time {:?}",
                row.difficulty,
                row.recipe_count,
                row.average_total_time
            );
        }

        Ok(TransformResult {
            detail,
            summary,
            detail_csv,
            summary_csv,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let chilies_file = self.config.chilies_file();
        let results_file = self.config.results_file();

        self.write_report(chilies_file, &result.detail_csv).await?;
        tracing::info!(
            "Chilies data saved to {} ({} recipes)",
            chilies_file,
            result.detail.recipes.len()
        );

        self.write_report(results_file, &result.summary_csv).await?;
        tracing::info!(
            "Results data saved to {} ({} difficulty groups)",
            results_file,
            result.summary.len()
        );

        Ok(format!("{}, {}", chilies_file, results_file))
    }
}

impl<S: Storage, C: ConfigProvider> RecipePipeline<S, C> {
    async fn write_report(&self, path: &str, content: &str) -> Result<()> {
        self.storage
            .write_file(path, content.as_bytes())
            .await
            .map_err(|e| {
                tracing::error!("Error processing recipes: cannot write {}: {}", path, e);
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::transform::duration::DurationMode;
    use httpmock::prelude::*;
    use std::time::Duration;

    struct MockConfig {
        source_url: String,
    }

    impl MockConfig {
        fn new(source_url: String) -> Self {
            Self { source_url }
        }
    }

    impl ConfigProvider for MockConfig {
        fn source_url(&self) -> &str {
            &self.source_url
        }

        fn input_file(&self) -> &str {
            "input/bi_recipes.json"
        }

        fn chilies_file(&self) -> &str {
            "recipes-etl/Chilies.csv"
        }

        fn results_file(&self) -> &str {
            "recipes-etl/Results.csv"
        }

        fn request_timeout(&self) -> Option<Duration> {
            Some(Duration::from_secs(5))
        }

        fn duration_mode(&self) -> DurationMode {
            DurationMode::Positional
        }
    }

    const FEED: &str = concat!(
        r#"{"name": "Recipe 1", "ingredients": "chilies", "prepTime": "PT15M", "cookTime": "PT35M"}"#,
        "\n",
        r#"{"name": "Recipe 2", "ingredients": "tomatoes", "prepTime": "PT20M", "cookTime": "PT45M"}"#,
        "\n"
    );

    fn pipeline(url: String) -> (RecipePipeline<MemoryStorage, MockConfig>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let pipeline = RecipePipeline::new(storage.clone(), MockConfig::new(url)).unwrap();
        (pipeline, storage)
    }

    #[tokio::test]
    async fn test_extract_downloads_repairs_and_parses() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/recipes.json");
            then.status(200).body(FEED);
        });

        let (pipeline, storage) = pipeline(server.url("/recipes.json"));
        let records = pipeline.extract().await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get_str("name"), Some("Recipe 2"));

        let repaired = storage.get_file("input/bi_recipes.json").await.unwrap();
        let repaired = String::from_utf8(repaired).unwrap();
        assert!(repaired.starts_with("[{"));
        assert!(repaired.ends_with("}]"));
        assert!(!repaired.contains('\n'));
    }

    #[tokio::test]
    async fn test_extract_transport_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/recipes.json");
            then.status(404);
        });

        let (pipeline, storage) = pipeline(server.url("/recipes.json"));
        let err = pipeline.extract().await.unwrap_err();

        assert!(matches!(err, EtlError::TransportError { .. }));
        assert!(storage.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_extract_malformed_feed_is_processing_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/recipes.json");
            then.status(200).body("{\"a\":1}\nnot json\n");
        });

        let (pipeline, _) = pipeline(server.url("/recipes.json"));
        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::ProcessingError { .. }));
    }

    #[tokio::test]
    async fn test_transform_builds_both_reports() {
        let records = parse_records(crate::transform::repair_text(FEED).as_bytes()).unwrap();
        let (pipeline, _) = pipeline("http://unused.invalid/".to_string());

        let result = pipeline.transform(records).await.unwrap();

        assert_eq!(result.detail.recipes.len(), 1);
        assert_eq!(
            result.detail_csv,
            "name|ingredients|prepTime|cookTime|totalTime|difficulty\n\
             Recipe 1|chilies|15|35|50|Medium\n"
        );
        assert_eq!(result.summary_csv, "Medium|50.0\n");
    }

    #[tokio::test]
    async fn test_load_writes_both_files() {
        let records = parse_records(crate::transform::repair_text(FEED).as_bytes()).unwrap();
        let (pipeline, storage) = pipeline("http://unused.invalid/".to_string());

        let result = pipeline.transform(records).await.unwrap();
        let output = pipeline.load(result).await.unwrap();

        assert_eq!(output, "recipes-etl/Chilies.csv, recipes-etl/Results.csv");
        assert_eq!(
            storage.paths().await,
            vec!["recipes-etl/Chilies.csv", "recipes-etl/Results.csv"]
        );
        assert_eq!(
            storage.get_file("recipes-etl/Results.csv").await.unwrap(),
            b"Medium|50.0\n"
        );
    }
}
