use anyhow::Context;
use batch_coord::config::LogFormat;
use batch_coord::utils::error::{ConverterError, ErrorSeverity};
use batch_coord::utils::{logger, validation::Validate};
use batch_coord::{run_server, AppConfig, AppState, CliArgs};
use clap::Parser;
use std::sync::Arc;

fn exit_with(e: &ConverterError) -> ! {
    tracing::error!(
        "❌ Startup failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 日誌格式需先讀取設定才能決定，設定錯誤以預設格式輸出
    let config = match AppConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            logger::init_logger(args.verbose);
            exit_with(&e);
        }
    };

    match config.log_format {
        LogFormat::Json => logger::init_json_logger(config.verbose),
        LogFormat::Compact => logger::init_logger(config.verbose),
    }

    tracing::info!("Starting batch-coord {}", env!("CARGO_PKG_VERSION"));
    if config.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    for warning in config.warnings() {
        tracing::warn!("⚠️ {}", warning);
    }

    let addr = config
        .socket_addr()
        .context("resolving listen address")?;
    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => exit_with(&e),
    };

    if let Err(e) = run_server(addr, state).await {
        exit_with(&e);
    }

    tracing::info!("✅ Server stopped");
    Ok(())
}
