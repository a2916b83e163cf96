use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// `--verbose` 優先於設定檔的 log_level
fn filter_directive(verbose: bool, level: Option<&str>) -> String {
    match (verbose, level) {
        (true, _) => "team_former=debug,info".to_string(),
        (false, Some(level)) => format!("team_former={},info", level.to_lowercase()),
        (false, None) => "team_former=info".to_string(),
    }
}

fn default_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, level)))
}

pub fn init_cli_logger(verbose: bool) {
    init_cli_logger_with_level(verbose, None);
}

pub fn init_cli_logger_with_level(verbose: bool, level: Option<&str>) {
    tracing_subscriber::registry()
        .with(default_filter(verbose, level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose, None))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(), // 機器可讀的輸出，方便接到其他工具
        )
        .init();
}
