use clap::Parser;
use team_former::core::{ConfigProvider, Storage};
use team_former::utils::error::{ErrorSeverity, FormationError};
use team_former::utils::{logger, validation::Validate};
use team_former::{CliConfig, FormationEngine, LocalStorage, SurveyPipeline};

fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting team-former CLI");
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

    if config.check {
        if let Err(e) = check_survey(&config) {
            exit_with(&e);
        }
        return;
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::default();
    let pipeline = SurveyPipeline::new(storage, config);

    let mut engine = FormationEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run() {
        Ok(output_path) => {
            tracing::info!("✅ Team formation completed successfully!");
            println!("✅ Team formation completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => exit_with(&e),
    }
}

/// 只讀取問卷並列出資料問題
fn check_survey(config: &CliConfig) -> team_former::Result<()> {
    let pipeline = SurveyPipeline::new(LocalStorage::default(), config.clone());
    let bytes = pipeline.storage().read_file(config.input_path())?;
    let survey = pipeline.parser().parse(&bytes)?;

    println!("📋 Survey Check: {}", config.input_path());
    println!("  Rows: {}", survey.summary.rows);
    println!("  Students: {}", survey.summary.students);
    println!("  Project columns: {}", survey.summary.project_columns);
    println!("  Team member columns: {}", survey.summary.member_columns);
    println!(
        "  Students with subteam requests: {} ({} entries)",
        survey.summary.students_with_requests, survey.summary.total_request_entries
    );
    for (size, count) in &survey.summary.request_size_distribution {
        println!("    {} requested member(s): {} student(s)", size, count);
    }

    survey.quality.log_summary();
    if survey.quality.is_empty() {
        println!("✅ No data quality issues found");
    } else {
        println!("⚠️ {} data quality issue(s), see log for details", survey.quality.len());
    }
    Ok(())
}

fn exit_with(e: &FormationError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Team formation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
