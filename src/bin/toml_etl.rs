use anyhow::Context;
use clap::Parser;
use recipes_etl::config::toml_config::TomlConfig;
use recipes_etl::core::{ConfigProvider, Pipeline};
use recipes_etl::utils::error::EtlError;
use recipes_etl::utils::logger::{self, LoggingConfig};
use recipes_etl::utils::validation::Validate;
use recipes_etl::{EtlEngine, LocalStorage, MemoryStorage, RecipePipeline};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Recipe report driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "etl-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Run every phase against in-memory storage and print the reports
    /// instead of writing them
    #[arg(long)]
    dry_run: bool,
}

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "Recipe processing failed: {} (category: {:?}, severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            // The file logger is configured by the TOML file, so log this
            // one to the console only.
            let guard = logger::init_logger(&LoggingConfig::console_only(args.verbose)).ok();
            if guard.is_some() {
                tracing::error!("Failed to load config file '{}': {}", args.config, e);
            } else {
                eprintln!("Failed to load config file '{}': {}", args.config, e);
            }
            eprintln!("Make sure the file exists and is valid TOML format");
            drop(guard);
            std::process::exit(e.exit_code());
        }
    };

    let guard = match logger::init_logger(&config.logging(args.verbose)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    tracing::info!("Starting toml-etl with configuration from {}", args.config);

    if let Err(e) = config.validate() {
        drop(guard);
        exit_with(&e);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("DRY RUN MODE - reports are kept in memory");
        if let Err(e) = perform_dry_run(config).await {
            tracing::error!("Dry run failed: {:#}", e);
            eprintln!("Dry run failed: {:#}", e);
            drop(guard);
            std::process::exit(1);
        }
        return;
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("System monitoring enabled");
    }

    let storage = LocalStorage::new(config.work_dir());
    let pipeline = match RecipePipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            drop(guard);
            exit_with(&e);
        }
    };

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outputs) => {
            tracing::info!("Recipe processing completed successfully");
            println!("Reports saved to: {}", outputs);
        }
        Err(e) => {
            drop(guard);
            exit_with(&e);
        }
    }
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("Configuration Summary:");
    println!("  Pipeline: {}", config.pipeline.name);
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Source: {}", config.source_url());
    match config.request_timeout() {
        Some(timeout) => println!("  Timeout: {}s", timeout.as_secs()),
        None => println!("  Timeout: none"),
    }
    println!("  Duration parsing: {:?}", config.duration_mode());
    println!("  Working directory: {}", config.work_dir());
    println!("  Input: {}", config.input_file());
    println!("  Reports: {}, {}", config.chilies_file(), config.results_file());

    if args.dry_run {
        println!("  DRY RUN MODE ENABLED");
    }

    println!();
}

/// Downloads and processes the feed exactly like a real run, but every file
/// lands in memory and the reports are printed.
async fn perform_dry_run(config: TomlConfig) -> anyhow::Result<()> {
    let storage = MemoryStorage::new();
    let pipeline = RecipePipeline::new(storage.clone(), config)
        .context("cannot set up the pipeline")?;

    let records = pipeline
        .extract()
        .await
        .context("extract phase failed")?;
    let result = pipeline
        .transform(records)
        .await
        .context("transform phase failed")?;

    println!("Dry Run Analysis:");
    println!("  Chili recipes: {}", result.detail.recipes.len());
    println!("  Detail columns: {}", result.detail.columns.join(", "));
    for row in &result.summary {
        println!(
            "  {}: {} recipes, average total time {}",
            row.difficulty,
            row.recipe_count,
            row.average_total_time
                .map(|mean| format!("{:.1} min", mean))
                .unwrap_or_else(|| "unknown".to_string())
        );
    }

    println!();
    println!("Results report:");
    print!("{}", result.summary_csv);
    println!();
    println!(
        "Dry run complete. Held in memory only: {}",
        storage.paths().await.join(", ")
    );

    Ok(())
}
