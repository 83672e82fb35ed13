//! End-to-end ingestion: files → spool topic → decoder → NDJSON collection

use oru_core::{OruConfig, ProducerConfiguration};
use oru_pipeline::{
    FileProducer, IngestionPipeline, NdjsonStore, PipelineOptions, Shutdown, SpoolConsumer,
    SpoolProducer,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn oru_message(control: &str, patient: u32, observations: &[(&str, &str)]) -> String {
    let mut lines = vec![
        format!("MSH|^~\\&|LAB|GENERAL|||20240101120000||ORU^R01|{control}|P|2.3"),
        format!("PID|{patient}||||Doe^Jane"),
        "PV1||I|ICU^2".to_string(),
        "OBR|1|||CHEM7".to_string(),
    ];
    for (i, (code, value)) in observations.iter().enumerate() {
        lines.push(format!(
            "OBX|{}|NM|{code}^{code}^LN||{value}|mmol/L^millimoles per liter^UCUM|||N|F|||20240101121500",
            i + 1
        ));
    }
    lines.join("\r")
}

async fn ingest(config: &OruConfig) -> oru_pipeline::PipelineStats {
    let consumer = SpoolConsumer::open(
        &config.source.spool_dir,
        &config.source.topic,
        &config.source.group_id,
    )
    .await
    .unwrap();
    let store = NdjsonStore::open(
        &config.store.data_dir,
        &config.store.database,
        &config.store.collection,
    )
    .await
    .unwrap();
    let options = PipelineOptions::from_config(&config.source).exit_when_idle(true);

    IngestionPipeline::new(consumer, store, options)
        .run(Shutdown::never())
        .await
        .unwrap()
}

async fn produce(config: &OruConfig, input_dir: &Path) {
    let producer = SpoolProducer::open(&config.source.spool_dir, &config.source.topic)
        .await
        .unwrap();
    let stats = FileProducer::new(producer, &ProducerConfiguration::default())
        .publish_dir(input_dir)
        .await
        .unwrap();
    assert!(stats.is_success());
}

fn config_in(root: &Path) -> OruConfig {
    let mut config = OruConfig::default();
    config.source.spool_dir = root.join("spool");
    config.store.data_dir = root.join("data");
    config.source.poll_interval_ms = 5;
    config
}

fn stored_documents(config: &OruConfig) -> Vec<serde_json::Value> {
    let path = config
        .store
        .data_dir
        .join(&config.store.database)
        .join(format!("{}.ndjson", config.store.collection));
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_files_are_ingested_into_collection() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(temp_dir.path());
    let input = temp_dir.path().join("msghl7");
    fs::create_dir(&input).unwrap();

    fs::write(
        input.join("001.hl7"),
        oru_message("CTRL1", 101, &[("NA", "140"), ("K", "4.1"), ("CL", "102")]),
    )
    .unwrap();
    fs::write(input.join("002.hl7"), "not an hl7 message").unwrap();
    fs::write(input.join("003.hl7"), oru_message("CTRL3", 103, &[])).unwrap();

    produce(&config, &input).await;
    let stats = ingest(&config).await;

    assert_eq!(stats.received, 3);
    assert_eq!(stats.stored, 2);
    assert_eq!(stats.malformed, 1);

    let documents = stored_documents(&config);
    assert_eq!(documents.len(), 2);

    let first = &documents[0];
    assert!(first["_id"].is_string());
    assert_eq!(first["header"]["app"], "LAB");
    assert_eq!(first["patient"]["id"], 101);
    assert_eq!(first["visit"]["location"], "ICU");
    assert_eq!(first["order"]["reportName"], "CHEM7");
    let codes: Vec<&str> = first["observations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["observationIdentifierId"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["NA", "K", "CL"]);

    assert_eq!(documents[1]["patient"]["id"], 103);
    assert_eq!(documents[1]["observations"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_consumer_group_resumes_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(temp_dir.path());
    let input = temp_dir.path().join("batch1");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("a.hl7"), oru_message("A", 1, &[("NA", "139")])).unwrap();

    produce(&config, &input).await;
    assert_eq!(ingest(&config).await.stored, 1);

    // Nothing new: the committed offset is past the first message
    assert_eq!(ingest(&config).await.received, 0);

    let second_batch = temp_dir.path().join("batch2");
    fs::create_dir(&second_batch).unwrap();
    fs::write(second_batch.join("b.hl7"), oru_message("B", 2, &[("K", "3.9")])).unwrap();
    produce(&config, &second_batch).await;

    let stats = ingest(&config).await;
    assert_eq!(stats.received, 1);
    assert_eq!(stored_documents(&config).len(), 2);
}

#[tokio::test]
async fn test_new_group_reads_from_earliest() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config_in(temp_dir.path());
    let input = temp_dir.path().join("msghl7");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("a.hl7"), oru_message("A", 1, &[])).unwrap();
    fs::write(input.join("b.hl7"), oru_message("B", 2, &[])).unwrap();

    produce(&config, &input).await;
    assert_eq!(ingest(&config).await.stored, 2);

    config.source.group_id = "audit".to_string();
    config.store.collection = "AuditCollection".to_string();
    assert_eq!(ingest(&config).await.stored, 2);
    assert_eq!(stored_documents(&config).len(), 2);
}
