use anyhow::Context;
use clap::Parser;
use team_former::core::policy::{DiscoveryStrategy, MergeOrderStrategy, TieBreakStrategy};
use team_former::core::{ConfigProvider, Storage};
use team_former::utils::error::ErrorSeverity;
use team_former::utils::{logger, validation::Validate};
use team_former::{FormationEngine, LocalStorage, SurveyPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-teams")]
#[command(about = "Team formation driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "teams.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the survey path from config
    #[arg(long)]
    input: Option<String>,

    /// Override the discovery order from config
    #[arg(long, value_enum)]
    discovery_order: Option<DiscoveryStrategy>,

    /// Override the merge order from config
    #[arg(long, value_enum)]
    merge_order: Option<MergeOrderStrategy>,

    /// Override the tie-break rule from config
    #[arg(long, value_enum)]
    tie_break: Option<TieBreakStrategy>,

    /// Dry run - read the survey and show what would be formed without writing
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置；日誌等級可能來自設定檔
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    // 初始化日誌
    logger::init_cli_logger_with_level(args.verbose, config.log_level());

    tracing::info!("🚀 Starting TOML-based team formation");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(input) = &args.input {
        config.input.path = input.clone();
        tracing::info!("🔧 Input overridden to: {}", input);
    }
    if let Some(order) = args.discovery_order {
        config.formation.discovery_order = order;
    }
    if let Some(order) = args.merge_order {
        config.formation.merge_order = order;
    }
    if let Some(rule) = args.tie_break {
        config.formation.tie_break = rule;
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
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        return perform_dry_run(&config);
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.base_dir().to_string());
    let pipeline = SurveyPipeline::new(storage, config);
    let mut engine = FormationEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run() {
        Ok(output_path) => {
            tracing::info!("✅ Team formation completed successfully!");
            println!("✅ Team formation completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Team formation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Run: {}", config.run.name);
    if let Some(description) = &config.run.description {
        println!("  Description: {}", description);
    }
    println!("  Base directory: {}", config.base_dir());
    println!("  Survey: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    println!("  Fuzzy threshold: {:.2}", config.fuzzy_threshold());
    println!(
        "  Policy: discovery={:?}, merge={:?}, tie-break={:?}",
        config.formation.discovery_order, config.formation.merge_order, config.formation.tie_break
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let pipeline = SurveyPipeline::new(LocalStorage::new(config.base_dir().to_string()), config.clone());
    let bytes = pipeline
        .storage()
        .read_file(config.input_path())
        .with_context(|| format!("failed to read survey '{}'", config.input_path()))?;
    let survey = pipeline.parser().parse(&bytes).context("failed to parse survey")?;

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📥 Survey:");
    println!("  Students: {}", survey.summary.students);
    println!("  Projects: {}", survey.projects.len());
    println!(
        "  Students with subteam requests: {}",
        survey.summary.students_with_requests
    );
    println!("  Data quality issues: {}", survey.quality.len());

    let formation = team_former::TeamFormation::new(config.policy());
    let outcome = formation
        .run(&survey.preferences, &survey.requests)
        .context("team formation failed")?;

    println!();
    println!("⚙️ Formation:");
    println!("  Teams: {}", outcome.assignments.len());
    println!("    From complete subteams: {}", outcome.stats.complete_teams);
    println!("    Merged: {}", outcome.stats.merged_teams);
    println!("  Placed students: {}", outcome.stats.placed_students);
    println!("  Unmatched students: {}", outcome.stats.unmatched_students);

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
