use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormationError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Survey format error: {message}")]
    SurveyFormatError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Subteam of size {size} cannot be classified (members: {})", .members.join(", "))]
    InvalidSubteamSize { size: usize, members: Vec<String> },

    #[error("Team of size {size} violates the 5-6 member rule (members: {})", .members.join(", "))]
    InvalidTeamSize { size: usize, members: Vec<String> },

    #[error("Team has no common project preference (members: {})", .members.join(", "))]
    NoCommonProject { members: Vec<String> },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Input,
    Configuration,
    ContractViolation,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FormationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FormationError::IoError(_) => ErrorCategory::Io,
            FormationError::CsvError(_) | FormationError::SurveyFormatError { .. } => {
                ErrorCategory::Input
            }
            FormationError::SerializationError(_) | FormationError::ValidationError { .. } => {
                ErrorCategory::Output
            }
            FormationError::ConfigError { .. }
            | FormationError::ConfigValidationError { .. }
            | FormationError::InvalidConfigValueError { .. }
            | FormationError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FormationError::InvalidSubteamSize { .. }
            | FormationError::InvalidTeamSize { .. }
            | FormationError::NoCommonProject { .. } => ErrorCategory::ContractViolation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::ContractViolation => ErrorSeverity::Critical,
            ErrorCategory::Io | ErrorCategory::Input | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Output => ErrorSeverity::Medium,
        }
    }

    /// 契約違反代表上游元件有 bug，而不是資料問題
    pub fn is_contract_violation(&self) -> bool {
        self.category() == ErrorCategory::ContractViolation
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FormationError::IoError(_) => "Check that the input file exists and the output directory is writable",
            FormationError::CsvError(_) => "Make sure the survey export is a valid CSV file with a header row",
            FormationError::SurveyFormatError { .. } => {
                "Check the survey columns: a NetID column, '[Project]' columns and 'Team Member' columns are expected"
            }
            FormationError::SerializationError(_) => "Retry without the json output format",
            FormationError::ConfigError { .. }
            | FormationError::ConfigValidationError { .. }
            | FormationError::InvalidConfigValueError { .. }
            | FormationError::MissingConfigError { .. } => {
                "Fix the configuration value and run again"
            }
            FormationError::InvalidSubteamSize { .. }
            | FormationError::InvalidTeamSize { .. }
            | FormationError::NoCommonProject { .. } => {
                "This is an internal consistency failure; please report it together with the input file"
            }
            FormationError::ValidationError { .. } => "Inspect the generated output file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FormationError::IoError(e) => format!("Could not read or write a file: {}", e),
            FormationError::CsvError(e) => format!("The survey CSV could not be parsed: {}", e),
            FormationError::InvalidSubteamSize { size, .. } => {
                format!("Found a mutual subteam of {} students, which cannot form a 5-6 person team", size)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violations_are_critical() {
        let err = FormationError::NoCommonProject {
            members: vec!["abc".to_string(), "xyz".to_string()],
        };
        assert_eq!(err.category(), ErrorCategory::ContractViolation);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.is_contract_violation());
        assert!(err.to_string().contains("abc, xyz"));
    }

    #[test]
    fn test_config_errors_are_not_contract_violations() {
        let err = FormationError::MissingConfigError {
            field: "input.path".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_invalid_subteam_size_message_names_members() {
        let err = FormationError::InvalidSubteamSize {
            size: 7,
            members: (1..=7).map(|i| format!("s{}", i)).collect(),
        };
        assert!(err.to_string().contains("s1, s2"));
        assert!(err.user_friendly_message().contains("7 students"));
    }
}
