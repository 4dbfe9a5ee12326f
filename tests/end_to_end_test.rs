mod common;

use common::MINIDAQ_TOML;
use daq_topology::core::routing::Command;
use daq_topology::core::SystemSource;
use daq_topology::core::wiring::Strategy;
use daq_topology::domain::conf::{MltConf, TrbConf};
use daq_topology::output::{self, OutputFile};
use daq_topology::{LocalStorage, SystemConfig, TopologyError, TopologyGenerator};
use tempfile::TempDir;

fn render(toml: &str) -> anyhow::Result<Vec<OutputFile>> {
    let config = SystemConfig::from_toml_str(toml)?;
    let topology = TopologyGenerator::from_source(&config)?;
    Ok(output::render(
        &topology,
        &config.generator_options(),
        &config.render_options(false),
    )?)
}

fn document(files: &[OutputFile], path: &str) -> serde_json::Value {
    let file = files
        .iter()
        .find(|f| f.path == path)
        .unwrap_or_else(|| panic!("missing {}", path));
    serde_json::from_str(&file.contents).unwrap()
}

#[test]
fn test_generate_from_toml() -> anyhow::Result<()> {
    let config = SystemConfig::from_toml_str(MINIDAQ_TOML)?;
    let topology = TopologyGenerator::from_source(&config)?;

    assert_eq!(
        topology.system.app_names(),
        vec!["ruemu0", "trigger", "dataflow", "hsi"]
    );
    assert_eq!(topology.wiring.strategy_of("ruemu0"), Some(Strategy::Aggregated));
    assert_eq!(topology.link_count, Some(2));

    let mlt = topology.system.app("trigger")?.graph.conf_of::<MltConf>("mlt")?;
    assert_eq!(mlt.buffer_timeout, 200);
    assert_eq!(mlt.links.len(), 2);

    let trb = topology.system.app("dataflow")?.graph.conf_of::<TrbConf>("trb")?;
    assert_eq!(trb.max_time_window, 1000);
    assert_eq!(trb.map["DetectorReadout_0_0"], "data_requests_for_ruemu0");

    let routing = &topology.routing["ruemu0"];
    assert!(routing.accepts("datahandler_0", Command::Record));
    assert!(!routing.accepts("fragment_aggregator_ruemu0", Command::Conf));
    Ok(())
}

#[test]
fn test_rendered_documents() -> anyhow::Result<()> {
    let files = render(MINIDAQ_TOML)?;

    let start = document(&files, "start.json");
    assert_eq!(
        start["order"],
        serde_json::json!(["ruemu0", "hsi", "dataflow", "trigger"])
    );
    assert_eq!(start["apps"]["dataflow"], "data/dataflow_start");

    let stop = document(&files, "stop.json");
    assert_eq!(stop["order"][0], "trigger");

    // dataflow 沒有任何模組處理 pause
    let pause = document(&files, "pause.json");
    assert!(pause["apps"].get("dataflow").is_none());
    assert!(pause["apps"].get("trigger").is_some());

    let ru_start = document(&files, "data/ruemu0_start.json");
    assert_eq!(ru_start["modules"][0]["data"]["run"], 42);

    let df_init = document(&files, "data/dataflow_init.json");
    let endpoints = df_init["endpoints"].as_array().expect("endpoint list");
    assert_eq!(
        endpoints.last().map(|e| e["name"].clone()),
        Some(serde_json::json!("fragments_to_dataflow"))
    );

    let boot = document(&files, "boot.json");
    assert_eq!(boot["apps"]["hsi"]["port"], 3336);
    assert_eq!(boot["env"]["DBT_ROOT"], "env");
    Ok(())
}

#[test]
fn test_identical_inputs_render_identically() -> anyhow::Result<()> {
    let first = render(MINIDAQ_TOML)?;
    let second = render(MINIDAQ_TOML)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_duplicate_module_in_description_fails() {
    let toml = MINIDAQ_TOML.replacen("name = \"datahandler_1\"", "name = \"datahandler_0\"", 1);
    let config = SystemConfig::from_toml_str(&toml).unwrap();
    let err = TopologyGenerator::from_source(&config).unwrap_err();
    assert!(matches!(err, TopologyError::DuplicateModule(_)));
}

#[tokio::test]
async fn test_write_refuses_existing_output() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let out = dir.path().join("minidaq");
    let storage = LocalStorage::new(out.to_string_lossy().to_string());
    let files = render(MINIDAQ_TOML)?;

    let written = output::write_all(&storage, &files).await?;
    assert_eq!(written, files.len());
    assert!(out.join("data").join("ruemu0_conf.json").exists());
    assert!(out.join("boot.json").exists());

    let err = output::write_all(&storage, &files).await.unwrap_err();
    assert!(matches!(err, TopologyError::OutputExists(_)));
    Ok(())
}

#[tokio::test]
async fn test_failed_write_removes_partial_output() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let out = dir.path().join("minidaq");
    let storage = LocalStorage::new(out.to_string_lossy().to_string());

    let mut files = render(MINIDAQ_TOML)?;
    // boot.json 已是檔案，不能再當目錄使用
    files.push(OutputFile {
        path: "boot.json/extra.json".to_string(),
        contents: "{}".to_string(),
    });

    let err = output::write_all(&storage, &files).await.unwrap_err();
    assert!(matches!(err, TopologyError::IoError(_)));
    assert!(!out.exists());

    files.pop();
    assert_eq!(output::write_all(&storage, &files).await?, files.len());
    Ok(())
}
