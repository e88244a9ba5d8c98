use clap::Parser;
use recipes_etl::utils::error::EtlError;
use recipes_etl::utils::{logger, validation::Validate};
use recipes_etl::{CliConfig, EtlEngine, RecipePipeline};

fn report_failure(stage: &str, e: &EtlError) {
    tracing::error!(
        "{} failed: {} (category: {:?}, severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = CliConfig::parse();

    let guard = match logger::init_logger(&config.logging()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    tracing::info!("Starting recipes-etl");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        report_failure("Configuration validation", &e);
        drop(guard);
        std::process::exit(e.exit_code());
    }

    if config.monitor {
        tracing::info!("System monitoring enabled");
    }

    let storage = config.storage();
    let monitor_enabled = config.monitor;
    let pipeline = match RecipePipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            report_failure("Pipeline setup", &e);
            drop(guard);
            std::process::exit(e.exit_code());
        }
    };

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outputs) => {
            tracing::info!("Recipe processing completed successfully");
            println!("Reports saved to: {}", outputs);
        }
        Err(e) => {
            report_failure("Recipe processing", &e);
            drop(guard);
            std::process::exit(e.exit_code());
        }
    }
}
