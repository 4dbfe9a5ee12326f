use clap::Parser;
use daq_topology::core::SystemSource;
use daq_topology::output::{self, OutputFile};
use daq_topology::utils::error::TopologyError;
use daq_topology::utils::{logger, validation::Validate};
use daq_topology::{CliConfig, LocalStorage, SystemConfig, TopologyGenerator};

fn exit_with(e: &TopologyError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Topology generation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = e.severity().exit_code();
    std::process::exit(exit_code);
}

fn generate(config: &CliConfig) -> Result<Vec<OutputFile>, TopologyError> {
    let system_config = SystemConfig::from_file(&config.config)?;
    system_config.validate()?;

    let span = tracing::info_span!("generate", system = %system_config.system.name);
    let _guard = span.enter();

    tracing::info!(
        "📋 System '{}': {} applications, collector '{}', decision '{}'",
        system_config.system.name,
        system_config.apps.len() + usize::from(system_config.hsi.is_some()),
        system_config.system.collector_app,
        system_config.system.decision_app
    );

    let topology = TopologyGenerator::from_source(&system_config)?;
    for (app, wiring) in topology.wiring.iter() {
        tracing::info!(
            "🔗 {}: {:?} wiring, {} producers",
            app,
            wiring.strategy,
            wiring.request_connections.len()
        );
    }
    if let Some(links) = topology.link_count {
        tracing::info!("🎯 MLT links: {}", links);
    }

    output::render(
        &topology,
        &system_config.generator_options(),
        &system_config.render_options(config.dot),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(logger::LogFormat::from_flag(config.json_logs), config.verbose);

    tracing::info!("Starting daq-topology CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.severity().exit_code());
    }

    let files = match generate(&config) {
        Ok(files) => files,
        Err(e) => exit_with(&e),
    };

    if config.dry_run {
        tracing::info!("✅ Dry run: {} documents generated, nothing written", files.len());
        println!("✅ Dry run: {} documents generated, nothing written", files.len());
        return Ok(());
    }

    let storage = LocalStorage::new(config.output.clone());
    match output::write_all(&storage, &files).await {
        Ok(count) => {
            tracing::info!("✅ Topology generated successfully!");
            tracing::info!("📁 {} files saved to: {}", count, config.output);
            println!("✅ Topology generated successfully!");
            println!("📁 {} files saved to: {}", count, config.output);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
