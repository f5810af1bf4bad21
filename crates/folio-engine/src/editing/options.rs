use serde::{Deserialize, Serialize};

use crate::clipboard::import::ImportOptions;

/// Code block behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeOptions {
    /// Language given to new code blocks when none is set or detected
    pub default_language: Option<String>,
    /// Guess a language from the code when none is given
    pub detect_language: bool,
}

impl Default for CodeOptions {
    fn default() -> Self {
        Self {
            default_language: None,
            detect_language: true,
        }
    }
}

/// Everything an [`EditorSession`](super::EditorSession) can be tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Undo steps kept; 0 disables history
    pub history_limit: usize,
    /// Merge runs of single-character typing into one undo step
    pub coalesce_typing: bool,
    pub code: CodeOptions,
    pub import: ImportOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_limit: 200,
            coalesce_typing: true,
            code: CodeOptions::default(),
            import: ImportOptions::default(),
        }
    }
}
