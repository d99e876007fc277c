use chrono::Utc;
use clap::Parser;
use stats_foundations::config::{BatchConfig, ReportEntry, RunReport};
use stats_foundations::core::Storage;
use stats_foundations::utils::{logger, validation::Validate};

#[derive(Parser)]
#[command(name = "stats-batch")]
#[command(about = "Run a list of statistics analyses from a TOML file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "stats-batch.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the seed from config
    #[arg(long)]
    seed: Option<u64>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based statistics batch");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match BatchConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(seed) = args.seed {
        config.batch.seed = Some(seed);
        tracing::info!("🔧 Seed overridden to: {}", seed);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    let mut ctx = config.run_context();
    if let Some(monitor) = args.monitor {
        ctx.monitor = monitor;
    }
    if ctx.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let jobs = match config.jobs() {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code().max(1));
        }
    };

    let started_at = Utc::now();
    let total = jobs.len();
    let mut entries = Vec::with_capacity(total);
    let mut worst_exit = 0;

    for (idx, job) in jobs.into_iter().enumerate() {
        let name = job.name().to_string();
        tracing::info!("▶️ [{}/{}] {}", idx + 1, total, name);

        let result = job.run(&ctx).await;
        match &result {
            Ok(summary) => {
                tracing::info!("✅ {} completed, {} file(s) written", name, summary.written.len());
                print!("{}", summary.render());
                println!();
            }
            Err(e) => {
                tracing::error!(
                    "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
                    name,
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                eprintln!("❌ {}: {}", name, e.user_friendly_message());
                worst_exit = worst_exit.max(e.exit_code());
            }
        }

        let failed = result.is_err();
        entries.push(ReportEntry::from_result(&name, &result));
        if failed && !config.continue_on_error() {
            tracing::warn!("⏹️ Stopping batch after first failure");
            break;
        }
    }

    let report = RunReport {
        batch: config.batch.name.clone(),
        started_at,
        finished_at: Utc::now(),
        seed: ctx.seed,
        entries,
    };

    let storage = ctx.storage();
    let json = serde_json::to_vec_pretty(&report)?;
    storage.write_file("run_report.json", &json).await?;
    tracing::info!(
        "📁 Run report saved to: {}",
        storage.resolve("run_report.json").display()
    );

    println!(
        "📊 {} of {} analyses succeeded",
        report.entries.len() - report.failures(),
        total
    );

    if worst_exit > 0 {
        std::process::exit(worst_exit);
    }

    Ok(())
}

fn display_config_summary(config: &BatchConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Batch: {}", config.batch.name);
    if let Some(description) = &config.batch.description {
        println!("  Description: {}", description);
    }
    println!("  Output: {}", config.output_path());
    println!("  Seed: {}", config.seed());
    println!("  Charts: {}", config.render_charts());
    println!("  Analyses: {}", config.analyses.len());
    println!("  Continue on error: {}", config.continue_on_error());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &BatchConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("🧮 Analyses:");
    for (idx, spec) in config.analyses.iter().enumerate() {
        println!("  {}. {}", idx + 1, spec.describe());
        match spec.to_job(config.seed()) {
            Ok(job) => println!("     ✅ runs as '{}'", job.name()),
            Err(e) => println!("     ❌ {}", e.user_friendly_message()),
        }
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Report: run_report.json");
    if !config.render_charts() {
        println!("  🖼️ PNG charts skipped");
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
