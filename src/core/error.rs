use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    PublishBlocked,
    PublishFailed,

    GitSyncFailed,
    GitCommandFailed,

    SourceFetchFailed,

    BundleInvalidData,
    BundleGenerationFailed,
    BundleIncomplete,

    InternalIoError,
    InternalJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::PublishBlocked => "publish.blocked",
            ErrorCode::PublishFailed => "publish.failed",

            ErrorCode::GitSyncFailed => "git.sync_failed",
            ErrorCode::GitCommandFailed => "git.command_failed",

            ErrorCode::SourceFetchFailed => "source.fetch_failed",

            ErrorCode::BundleInvalidData => "bundle.invalid_data",
            ErrorCode::BundleGenerationFailed => "bundle.generation_failed",
            ErrorCode::BundleIncomplete => "bundle.incomplete",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishBlockedDetails {
    pub release: Option<String>,
    pub confirm_publish: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitFailureDetails {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFailedDetails {
    pub generator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleIncompleteDetails {
    pub out_dir: String,
    pub missing: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let key = key.into();
        let message = format!("Missing required configuration key: {}", key);
        let details = to_details(ConfigMissingKeyDetails {
            key: key.clone(),
            path,
        });

        Self::new(ErrorCode::ConfigMissingKey, message, details).with_hint(format!(
            "Export {} or add it to the local env file (see PUBLISH_ENV_FILE)",
            key
        ))
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.clone(),
        });

        Self::new(ErrorCode::ValidationInvalidArgument, problem, details)
    }

    pub fn publish_blocked(release: Option<String>, confirm_publish: Option<String>) -> Self {
        let details = to_details(PublishBlockedDetails {
            release,
            confirm_publish,
        });

        Self::new(
            ErrorCode::PublishBlocked,
            "Publish blocked: RELEASE=1 and CONFIRM_PUBLISH=YES are both required",
            details,
        )
        .with_hint("Run: RELEASE=1 CONFIRM_PUBLISH=YES cardbundle publish")
    }

    pub fn publish_failed(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        let command = command.into();
        let message = format!("Publish failed during {}", command);
        let details = to_details(GitFailureDetails {
            command,
            exit_code,
            stderr: stderr.into(),
        });

        Self::new(ErrorCode::PublishFailed, message, details)
            .with_hint("A local commit may remain; inspect `git log` and push manually")
    }

    pub fn git_sync_failed(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        let details = to_details(GitFailureDetails {
            command: "git pull --rebase".to_string(),
            exit_code,
            stderr: stderr.into(),
        });

        Self::new(
            ErrorCode::GitSyncFailed,
            "Could not rebase the working copy onto the remote",
            details,
        )
        .with_hint("Resolve the rebase (or `git rebase --abort`) and re-run")
    }

    pub fn git_command_failed(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        let command = command.into();
        let message = format!("{} failed", command);
        let details = to_details(GitFailureDetails {
            command,
            exit_code,
            stderr: stderr.into(),
        });

        Self::new(ErrorCode::GitCommandFailed, message, details)
    }

    pub fn source_fetch_failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        let url = url.into();
        let error = error.into();
        Self::new(
            ErrorCode::SourceFetchFailed,
            format!("Failed to fetch {}: {}", url, error),
            serde_json::json!({ "url": url, "error": error }),
        )
    }

    pub fn bundle_invalid_data(problem: impl Into<String>) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::BundleInvalidData,
            format!("Validation error: {}", problem),
            serde_json::json!({ "problem": problem }),
        )
    }

    pub fn bundle_generation_failed(
        generator: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        let generator = generator.into();
        let message = format!("Generator '{}' failed", generator);
        let details = to_details(GenerationFailedDetails {
            generator,
            exit_code,
            stderr: stderr.into(),
        });

        Self::new(ErrorCode::BundleGenerationFailed, message, details)
    }

    pub fn bundle_incomplete(out_dir: impl Into<String>, missing: Vec<String>) -> Self {
        let message = format!("Bundle incomplete, missing: {}", missing.join(", "));
        let details = to_details(BundleIncompleteDetails {
            out_dir: out_dir.into(),
            missing,
        });

        Self::new(ErrorCode::BundleIncomplete, message, details)
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
