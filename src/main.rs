use clap::Parser;
use stats_foundations::utils::{logger, validation::Validate};
use stats_foundations::CliConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting stats-foundations CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let ctx = config.run_context();
    if ctx.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }
    if !ctx.render_charts {
        tracing::info!("🖼️ Chart rendering disabled");
    }

    let result = match config.job() {
        Ok(job) => job.run(&ctx).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            tracing::info!("✅ Analysis completed successfully!");
            tracing::info!("📁 Output saved to: {}", ctx.output_path);
            print!("{}", summary.render());
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
