use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Module '{0}' already exists")]
    DuplicateModule(String),

    #[error("Endpoint '{0}' already exists")]
    DuplicateEndpoint(String),

    #[error("Port '{port}' is already bound to '{bound_to}'")]
    DuplicatePort { port: String, bound_to: String },

    #[error("Module '{0}' not found")]
    ModuleNotFound(String),

    #[error("Application '{0}' not found")]
    ApplicationNotFound(String),

    #[error("Fragment producer '{source_id}' is already registered in '{app}'")]
    DuplicateProducer { app: String, source_id: String },

    #[error("SourceID '{0}' not in MLT links list")]
    LinkNotFound(String),

    #[error("Required endpoints missing: {}", missing.join(", "))]
    MissingRequiredEndpoint { missing: Vec<String> },

    #[error("Module '{module}' expects {expected} configuration, got {found}")]
    ConfKindMismatch {
        module: String,
        expected: String,
        found: String,
    },

    #[error("Invalid port reference '{0}', expected 'module.port'")]
    InvalidPortRef(String),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Output path '{0}' already exists")]
    OutputExists(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 圖結構衝突
    Structure,
    /// 查找失敗
    Lookup,
    Configuration,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status of the CLI; never 0, every error aborts the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::High => 1,     // 拓撲錯誤
            Self::Medium => 2,   // 設定錯誤
            Self::Critical => 3, // 輸出錯誤
        }
    }
}

impl TopologyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateModule(_)
            | Self::DuplicateEndpoint(_)
            | Self::DuplicatePort { .. }
            | Self::DuplicateProducer { .. }
            | Self::ConfKindMismatch { .. } => ErrorCategory::Structure,
            Self::ModuleNotFound(_)
            | Self::ApplicationNotFound(_)
            | Self::LinkNotFound(_)
            | Self::MissingRequiredEndpoint { .. } => ErrorCategory::Lookup,
            Self::InvalidPortRef(_)
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::OutputExists(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::Io
            }
        }
    }

    /// 所有錯誤都會中止生成；嚴重度只影響退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Structure | ErrorCategory::Lookup => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::DuplicateModule(_) => {
                "Check for colliding module names or a wiring step invoked twice for the same application"
            }
            Self::DuplicateEndpoint(_) | Self::DuplicatePort { .. } => {
                "Rename the conflicting endpoint or queue in the system description"
            }
            Self::ModuleNotFound(_) => "Declare the module before referencing its ports",
            Self::ApplicationNotFound(_) => "Check the application names in the [system] section",
            Self::DuplicateProducer { .. } => "Give every fragment producer a unique source id",
            Self::LinkNotFound(_) => "Run link synchronization before removing links",
            Self::MissingRequiredEndpoint { .. } => "Add the missing entries to the [network] section",
            Self::ConfKindMismatch { .. } => "Keep the plugin kind when rewriting a module configuration",
            Self::InvalidPortRef(_) => "Write port references as 'module.port'",
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the system description and run again",
            Self::OutputExists(_) => "Choose a new output directory or remove the existing one",
            Self::IoError(_) => "Check file permissions and free disk space",
            Self::SerializationError(_) => "Report this as a bug: generated documents failed to serialize",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Structure => format!("Topology conflict: {}", self),
            ErrorCategory::Lookup => format!("Lookup failed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Io => format!("Could not write output: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, TopologyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_endpoint_lists_every_name() {
        let err = TopologyError::MissingRequiredEndpoint {
            missing: vec!["hsievent".to_string(), "timesync_0".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Required endpoints missing: hsievent, timesync_0"
        );
        assert_eq!(err.category(), ErrorCategory::Lookup);
    }

    #[test]
    fn test_severity_by_category() {
        assert_eq!(
            TopologyError::DuplicateModule("x".into()).severity(),
            ErrorSeverity::High
        );
        assert_eq!(
            TopologyError::MissingConfigError { field: "apps".into() }.severity(),
            ErrorSeverity::Medium
        );
        assert_eq!(
            TopologyError::OutputExists("out".into()).severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_every_error_exits_non_zero() {
        let errors = [
            TopologyError::LinkNotFound("Trigger_0_0".into()),
            TopologyError::InvalidPortRef("mlt".into()),
            TopologyError::OutputExists("out".into()),
            TopologyError::DuplicateProducer {
                app: "ru1".into(),
                source_id: "DetectorReadout_0_0".into(),
            },
        ];
        for err in errors {
            assert_ne!(err.severity().exit_code(), 0, "{}", err);
        }
        assert_eq!(ErrorSeverity::Medium.exit_code(), 2);
    }
}
