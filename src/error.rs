use std::fmt;

/// Error types for a workspace management run
#[derive(Debug)]
pub enum RunError {
    /// Malformed or self-contradictory input, detected before any remote call
    Validation(String),

    /// A per-workspace input references a workspace key outside the known set
    WorkspaceNotFound {
        key: String,
        known: Vec<String>,
    },

    /// Transport or API failure during a remote lookup
    RemoteLookup {
        url: String,
        message: String,
    },

    /// Planning-tool import call failed
    Import {
        address: String,
        message: String,
    },

    /// The computed plan would destroy a protected resource type
    DestructivePlan {
        resource_type: String,
    },

    /// Planning-tool subprocess failed
    Executor {
        command: String,
        message: String,
        exit_code: Option<i32>,
    },

    /// Failed to decode state, plan or API JSON
    Decode(String),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Validation(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            RunError::WorkspaceNotFound { key, known } => {
                write!(
                    f,
                    "Unknown workspace '{}' referenced in per-workspace input (known workspaces: {})",
                    key,
                    known.join(", ")
                )
            }
            RunError::RemoteLookup { url, message } => {
                write!(f, "Remote lookup failed for {}: {}", url, message)
            }
            RunError::Import { address, message } => {
                write!(f, "Import of {} failed: {}", address, message)
            }
            RunError::DestructivePlan { resource_type } => {
                write!(
                    f,
                    "Plan contains destroy actions for protected resource type '{}' (re-run with --allow-destroy to override)",
                    resource_type
                )
            }
            RunError::Executor {
                command,
                message,
                exit_code,
            } => {
                write!(f, "Command '{}' failed", command)?;

                if let Some(code) = exit_code {
                    write!(f, " (exit code {})", code)?;
                }

                write!(f, ": {}", message)
            }
            RunError::Decode(msg) => {
                write!(f, "Failed to decode JSON: {}", msg)
            }
        }
    }
}

impl std::error::Error for RunError {}

impl From<serde_json::Error> for RunError {
    fn from(err: serde_json::Error) -> Self {
        RunError::Decode(err.to_string())
    }
}

/// Result type for run operations
pub type RunResult<T> = Result<T, RunError>;
