pub mod cli;
pub mod toml_config;

/// 支援的輸出格式
pub const OUTPUT_FORMATS: [&str; 3] = ["csv", "json", "report"];
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use super::{DEFAULT_FUZZY_THRESHOLD, OUTPUT_FORMATS};
    use crate::core::policy::{
        DiscoveryStrategy, FormationPolicy, MergeOrderStrategy, TieBreakStrategy,
    };
    use crate::core::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "team-former")]
    #[command(about = "Form 5-6 person project teams from a preference survey export")]
    pub struct CliConfig {
        /// Survey CSV export
        pub input: String,

        /// Team assignments CSV
        #[arg(default_value = "teams.csv")]
        pub output: String,

        #[arg(long, default_value = "report.txt")]
        pub report: String,

        #[arg(long, value_delimiter = ',', default_value = "csv,report")]
        pub formats: Vec<String>,

        #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
        pub fuzzy_threshold: f64,

        /// Header of the netID column (detected automatically when omitted)
        #[arg(long)]
        pub netid_column: Option<String>,

        #[arg(long, value_enum, default_value_t)]
        pub discovery_order: DiscoveryStrategy,

        #[arg(long, value_enum, default_value_t)]
        pub merge_order: MergeOrderStrategy,

        #[arg(long, value_enum, default_value_t)]
        pub tie_break: TieBreakStrategy,

        /// Only read and check the survey, do not form teams
        #[arg(long)]
        pub check: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub log_json: bool,

        #[arg(long, help = "Log memory and CPU usage per phase")]
        pub monitor: bool,
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.input
        }

        fn output_path(&self) -> &str {
            &self.output
        }

        fn report_path(&self) -> &str {
            &self.report
        }

        fn output_formats(&self) -> &[String] {
            &self.formats
        }

        fn fuzzy_threshold(&self) -> f64 {
            self.fuzzy_threshold
        }

        fn netid_column(&self) -> Option<&str> {
            self.netid_column.as_deref()
        }

        fn policy(&self) -> FormationPolicy {
            FormationPolicy::from_strategies(self.discovery_order, self.merge_order, self.tie_break)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("input", &self.input)?;
            validation::validate_path("output", &self.output)?;
            validation::validate_path("report", &self.report)?;
            validation::validate_output_formats("formats", &self.formats, &OUTPUT_FORMATS)?;
            validation::validate_range("fuzzy_threshold", self.fuzzy_threshold, 0.0, 1.0)?;
            if let Some(column) = &self.netid_column {
                validation::validate_non_empty_string("netid_column", column)?;
            }
            Ok(())
        }
    }

}
