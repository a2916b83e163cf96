use crate::config::{DEFAULT_FUZZY_THRESHOLD, OUTPUT_FORMATS};
use crate::core::policy::{DiscoveryStrategy, FormationPolicy, MergeOrderStrategy, TieBreakStrategy};
use crate::core::ConfigProvider;
use crate::utils::error::{FormationError, Result};
use crate::utils::logger::LOG_LEVELS;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub run: RunConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub formation: FormationConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub description: Option<String>,
    /// 相對路徑的根目錄
    pub base_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub netid_column: Option<String>,
    pub fuzzy_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FormationConfig {
    #[serde(default)]
    pub discovery_order: DiscoveryStrategy,
    #[serde(default)]
    pub merge_order: MergeOrderStrategy,
    #[serde(default)]
    pub tie_break: TieBreakStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub report: Option<String>,
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FormationError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| FormationError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SURVEY_DIR})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("run.name", &self.run.name)?;
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_path("output.report", self.report_path())?;
        validation::validate_output_formats("output.formats", &self.output.formats, &OUTPUT_FORMATS)?;
        validation::validate_range("input.fuzzy_threshold", self.fuzzy_threshold(), 0.0, 1.0)?;
        if let Some(column) = &self.input.netid_column {
            validation::validate_non_empty_string("input.netid_column", column)?;
        }
        if let Some(level) = self.log_level() {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(FormationError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", LOG_LEVELS.join(", ")),
                });
            }
        }

        let unresolved = [&self.input.path, &self.output.path]
            .into_iter()
            .find(|path| ENV_VAR.is_match(path));
        if let Some(path) = unresolved {
            return Err(FormationError::InvalidConfigValueError {
                field: "path".to_string(),
                value: path.clone(),
                reason: "Environment variable is not set".to_string(),
            });
        }

        Ok(())
    }

    pub fn base_dir(&self) -> &str {
        self.run.base_dir.as_deref().unwrap_or(".")
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref()?.log_level.as_deref()
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn report_path(&self) -> &str {
        self.output.report.as_deref().unwrap_or("report.txt")
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn fuzzy_threshold(&self) -> f64 {
        self.input.fuzzy_threshold.unwrap_or(DEFAULT_FUZZY_THRESHOLD)
    }

    fn netid_column(&self) -> Option<&str> {
        self.input.netid_column.as_deref()
    }

    fn policy(&self) -> FormationPolicy {
        FormationPolicy::from_strategies(
            self.formation.discovery_order,
            self.formation.merge_order,
            self.formation.tie_break,
        )
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[run]
name = "fall-cohort"

[input]
path = "survey.csv"
fuzzy_threshold = 0.9

[formation]
discovery-order = "input-order"
tie-break = "best-worst-rank"

[output]
path = "teams.csv"
formats = ["csv", "json"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.run.name, "fall-cohort");
        assert_eq!(config.input_path(), "survey.csv");
        assert_eq!(config.fuzzy_threshold(), 0.9);
        assert_eq!(config.report_path(), "report.txt");
        assert_eq!(config.formation.discovery_order, DiscoveryStrategy::InputOrder);
        assert_eq!(config.formation.merge_order, MergeOrderStrategy::Discovery);
        assert_eq!(config.formation.tie_break, TieBreakStrategy::BestWorstRank);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_formation_section_is_optional() {
        let toml_content = r#"
[run]
name = "defaults"

[input]
path = "survey.csv"

[output]
path = "teams.csv"
formats = ["csv"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.formation.tie_break, TieBreakStrategy::Lexicographic);
        assert_eq!(config.fuzzy_threshold(), DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(config.base_dir(), ".");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEAM_FORMER_TEST_SURVEY", "fall/survey.csv");

        let toml_content = r#"
[run]
name = "test"

[input]
path = "${TEAM_FORMER_TEST_SURVEY}"

[output]
path = "./teams.csv"
formats = ["csv"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input.path, "fall/survey.csv");

        std::env::remove_var("TEAM_FORMER_TEST_SURVEY");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let toml_content = r#"
[run]
name = "test"

[input]
path = "${TEAM_FORMER_TEST_NEVER_SET}"

[output]
path = "teams.csv"
formats = ["csv"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input.path, "${TEAM_FORMER_TEST_NEVER_SET}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[run]
name = "test"

[input]
path = "survey.csv"

[output]
path = "teams.csv"
formats = ["csv", "xlsx"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[run").unwrap_err();
        assert!(matches!(err, FormationError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[run]
name = "file-test"

[input]
path = "survey.csv"

[output]
path = "teams.csv"
formats = ["csv"]

[monitoring]
enabled = true
log_level = "debug"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.run.name, "file-test");
        assert!(config.monitoring_enabled());
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_log_level_fails_validation() {
        let toml_content = r#"
[run]
name = "test"

[input]
path = "survey.csv"

[output]
path = "teams.csv"
formats = ["csv"]

[monitoring]
enabled = false
log_level = "loud"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.log_level(), Some("loud"));
        assert!(matches!(
            config.validate(),
            Err(FormationError::InvalidConfigValueError { ref field, .. }) if field == "monitoring.log_level"
        ));
    }
}
