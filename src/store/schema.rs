use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::problem_words::ProblemWord;
use crate::session::result::TestSession;

const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryData {
    pub schema_version: u32,
    /// Newest first.
    pub sessions: Vec<TestSession>,
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            sessions: Vec::new(),
        }
    }
}

impl HistoryData {
    pub fn new(sessions: Vec<TestSession>) -> Self {
        Self {
            sessions,
            ..Self::default()
        }
    }

    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProblemWordsData {
    pub schema_version: u32,
    pub words: Vec<ProblemWord>,
}

impl Default for ProblemWordsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            words: Vec::new(),
        }
    }
}

impl ProblemWordsData {
    pub fn new(words: Vec<ProblemWord>) -> Self {
        Self {
            words,
            ..Self::default()
        }
    }

    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub handtype_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
    pub history: HistoryData,
    pub problem_words: ProblemWordsData,
}
