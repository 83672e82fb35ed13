//! CLI command implementations

use anyhow::{Context, bail};
use oru_core::{OruConfig, PathQuery, ResultExt, SegmentIndex};
use oru_pipeline::{
    BatchDecoder, FileProducer, IngestionPipeline, NdjsonStore, PipelineOptions, Shutdown,
    SpoolConsumer, SpoolProducer,
};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::ConfigFormat;
use crate::output;

/// Consume command implementation
pub async fn consume_command(
    config: OruConfig,
    once: bool,
    max_messages: Option<usize>,
) -> anyhow::Result<()> {
    config.validate()?;

    let source = &config.source;
    let consumer = SpoolConsumer::open(&source.spool_dir, &source.topic, &source.group_id)
        .await
        .context("Failed to subscribe to topic")?;
    let store = NdjsonStore::open(
        &config.store.data_dir,
        &config.store.database,
        &config.store.collection,
    )
    .await
    .context("Failed to open document store")?;

    info!(
        "Consuming '{}' as group '{}' into {}",
        source.topic,
        source.group_id,
        store.path().display()
    );
    if let Some(lag) = consumer.lag().await.log_and_continue() {
        info!("{} messages queued from offset {}", lag, consumer.position());
    }

    let options = PipelineOptions::from_config(source)
        .exit_when_idle(once)
        .max_messages(max_messages);
    let mut pipeline = IngestionPipeline::new(consumer, store, options);
    let stats = pipeline.run(Shutdown::on_ctrl_c()).await?;
    if let Some(purged) = pipeline.source().purge_consumed().await.log_and_continue() {
        debug!("Removed {} consumed message files", purged);
    }

    output::print_pipeline_summary(&stats);
    Ok(())
}

/// Produce command implementation
pub async fn produce_command(config: OruConfig) -> anyhow::Result<()> {
    config.validate()?;

    let producer = SpoolProducer::open(&config.source.spool_dir, &config.source.topic)
        .await
        .context("Failed to open topic")?;
    let stats = FileProducer::new(producer, &config.producer)
        .publish_dir(&config.producer.input_dir)
        .await?;

    output::print_produce_summary(&stats);
    if !stats.is_success() {
        bail!("{} of {} files were not delivered", stats.files - stats.delivered, stats.files);
    }
    Ok(())
}

/// Decode command implementation
pub fn decode_command(
    paths: Vec<PathBuf>,
    pretty: bool,
    threads: Option<usize>,
) -> anyhow::Result<()> {
    let payloads = paths
        .iter()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let threads = threads.unwrap_or_else(num_cpus::get).max(1);
    debug!("Decoding {} files on {} threads", paths.len(), threads);
    let results = BatchDecoder::with_threads(threads)?.decode_all(&payloads);

    let mut failures = 0;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(decoded) => {
                let document = if pretty {
                    serde_json::to_string_pretty(&decoded.message)?
                } else {
                    serde_json::to_string(&decoded.message)?
                };
                println!("{document}");
                if !decoded.report.is_clean() {
                    output::print_decode_report(path, &decoded.report);
                }
            }
            Err(e) => {
                failures += 1;
                output::print_decode_failure(path, &e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} messages could not be decoded", failures, paths.len());
    }
    Ok(())
}

/// Query command implementation
pub fn query_command(file: PathBuf, path: &str, all: bool) -> anyhow::Result<()> {
    let query: PathQuery = path.parse()?;
    let raw = std::fs::read(&file).with_context(|| format!("Failed to read '{}'", file.display()))?;
    let index = SegmentIndex::parse(&raw);

    if all {
        let values = index.find_all(&query);
        if values.is_empty() {
            bail!("No {} segment in '{}'", query.segment, file.display());
        }
        for value in values {
            println!("{value}");
        }
    } else {
        match index.find(&query) {
            Some(value) => println!("{value}"),
            None => bail!("No {} segment in '{}'", query.segment, file.display()),
        }
    }
    Ok(())
}

/// Config init command implementation
pub fn config_init_command(format: ConfigFormat, force: bool) -> anyhow::Result<()> {
    debug!("Initializing configuration file with format: {:?}", format);

    let filename = match format {
        ConfigFormat::Toml => ".orurc.toml",
        ConfigFormat::Json => ".orurc.json",
    };
    let config_path = PathBuf::from(filename);

    if config_path.exists() && !force {
        bail!("Configuration file '{filename}' already exists. Use --force to overwrite.");
    }

    let default_config = OruConfig::default();
    let content = match format {
        ConfigFormat::Toml => default_config.to_toml()?,
        ConfigFormat::Json => default_config.to_json()?,
    };
    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write '{filename}'"))?;

    output::print_success(&format!("Created configuration file: {filename}"));
    println!("   Edit the file to point the spool and store at your directories.");
    Ok(())
}

/// Config show command implementation
pub fn config_show_command(config: &OruConfig, format: ConfigFormat) -> anyhow::Result<()> {
    let content = match format {
        ConfigFormat::Toml => config.to_toml()?,
        ConfigFormat::Json => config.to_json()?,
    };
    println!("{content}");
    Ok(())
}
