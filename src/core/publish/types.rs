use serde::Serialize;

/// Stages of a publish run, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStage {
    Syncing,
    ConfigLoaded,
    Generating,
    Validated,
    Staged,
    NoChange,
    Committed,
    Pushed,
}

impl PublishStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStage::Syncing => "syncing",
            PublishStage::ConfigLoaded => "config_loaded",
            PublishStage::Generating => "generating",
            PublishStage::Validated => "validated",
            PublishStage::Staged => "staged",
            PublishStage::NoChange => "no_change",
            PublishStage::Committed => "committed",
            PublishStage::Pushed => "pushed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    NoChanges,
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishCommit {
    pub sha: String,
    pub message: String,
}

/// Outcome of a successful publish run.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRun {
    pub status: PublishStatus,
    pub stages: Vec<PublishStage>,
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<PublishCommit>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
