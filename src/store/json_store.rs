use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::config::Config;
use crate::engine::problem_words::ProblemWord;
use crate::error::{StoreError, StoreResult};
use crate::session::result::TestSession;
use crate::store::SessionStore;
use crate::store::schema::{EXPORT_VERSION, ExportData, HistoryData, ProblemWordsData};

const HISTORY_FILE: &str = "history.json";
const PROBLEM_WORDS_FILE: &str = "problem_words.json";
const DATA_FILES: [&str; 2] = [HISTORY_FILE, PROBLEM_WORDS_FILE];
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

pub struct JsonStore {
    base_dir: PathBuf,
    history_limit: usize,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("handtype");
        Ok(Self::with_base_dir(base_dir)?)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> StoreResult<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(file = name, error = %e, "unreadable data file, starting fresh");
                T::default()
            }),
            Err(_) => T::default(),
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> StoreResult<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_history_data(&self) -> HistoryData {
        let data: HistoryData = self.load(HISTORY_FILE);
        if data.needs_reset() {
            warn!(version = data.schema_version, "stale history schema, discarding");
            return HistoryData::default();
        }
        data
    }

    pub fn load_problem_words_data(&self) -> ProblemWordsData {
        let data: ProblemWordsData = self.load(PROBLEM_WORDS_FILE);
        if data.needs_reset() {
            warn!(version = data.schema_version, "stale problem word schema, discarding");
            return ProblemWordsData::default();
        }
        data
    }

    pub fn export_all(&self, config: &Config) -> ExportData {
        ExportData {
            handtype_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            config: config.clone(),
            history: self.load_history_data(),
            problem_words: self.load_problem_words_data(),
        }
    }

    /// Stages every file as `.json.tmp`, then swaps each into place with the
    /// previous copy parked as `.json.bak`. Any failure restores what was
    /// there before.
    pub fn import_all(&self, data: &ExportData) -> StoreResult<()> {
        if data.handtype_export_version != EXPORT_VERSION {
            return Err(StoreError::UnsupportedExportVersion {
                found: data.handtype_export_version,
                expected: EXPORT_VERSION,
            });
        }

        let files: Vec<(&str, String)> = vec![
            (HISTORY_FILE, serde_json::to_string_pretty(&data.history)?),
            (
                PROBLEM_WORDS_FILE,
                serde_json::to_string_pretty(&data.problem_words)?,
            ),
        ];

        let mut staged: Vec<PathBuf> = Vec::new();
        for (name, json) in &files {
            let tmp_path = self.file_path(name).with_extension("json.tmp");
            let written = fs::File::create(&tmp_path).and_then(|mut file| {
                file.write_all(json.as_bytes())?;
                file.sync_all()
            });
            if let Err(source) = written {
                for tmp in &staged {
                    let _ = fs::remove_file(tmp);
                }
                return Err(StoreError::Import {
                    phase: "staging",
                    source,
                });
            }
            staged.push(tmp_path);
        }

        // (final, bak, had_original) so a rollback can restore absence too
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        let rollback = |committed: &[(PathBuf, PathBuf, bool)]| {
            for (final_path, bak_path, had_original) in committed {
                if *had_original {
                    let _ = fs::rename(bak_path, final_path);
                } else {
                    let _ = fs::remove_file(final_path);
                }
            }
        };

        for (i, (name, _)) in files.iter().enumerate() {
            let final_path = self.file_path(name);
            let bak_path = final_path.with_extension("json.bak");
            let had_original = final_path.exists();

            if had_original && let Err(source) = fs::rename(&final_path, &bak_path) {
                rollback(&committed);
                for tmp in &staged {
                    let _ = fs::remove_file(tmp);
                }
                return Err(StoreError::Import {
                    phase: "backup",
                    source,
                });
            }

            if let Err(source) = fs::rename(&staged[i], &final_path) {
                if had_original && bak_path.exists() {
                    let _ = fs::rename(&bak_path, &final_path);
                }
                rollback(&committed);
                for tmp in &staged[i + 1..] {
                    let _ = fs::remove_file(tmp);
                }
                return Err(StoreError::Import {
                    phase: "commit",
                    source,
                });
            }

            committed.push((final_path, bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }
        Ok(())
    }

    /// Removes `.bak` leftovers of an interrupted import. Returns true if any
    /// were found.
    pub fn check_interrupted_import(&self) -> bool {
        let mut found = false;
        for name in DATA_FILES {
            let bak_path = self.file_path(name).with_extension("json.bak");
            if bak_path.exists() {
                found = true;
                let _ = fs::remove_file(&bak_path);
            }
        }
        found
    }

    /// Deletes all persisted history and problem words.
    pub fn clear(&self) -> StoreResult<()> {
        for name in DATA_FILES {
            let path = self.file_path(name);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

impl SessionStore for JsonStore {
    fn save_session(&self, session: &TestSession) -> StoreResult<()> {
        let mut data = self.load_history_data();
        data.sessions.retain(|s| s.id != session.id);
        data.sessions.insert(0, session.clone());
        data.sessions.truncate(self.history_limit);
        self.save(HISTORY_FILE, &data)
    }

    fn save_problem_words(&self, words: &[ProblemWord]) -> StoreResult<()> {
        self.save(PROBLEM_WORDS_FILE, &ProblemWordsData::new(words.to_vec()))
    }

    fn load_history(&self) -> Vec<TestSession> {
        self.load_history_data().sessions
    }

    fn load_problem_words(&self) -> Vec<ProblemWord> {
        self.load_problem_words_data().words
    }

    fn clear_all(&self) -> StoreResult<()> {
        self.clear()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::*;
    use crate::engine::problem_words::Trend;
    use crate::keyboard::finger::WordHand;
    use crate::session::result::TestResults;
    use crate::session::{HandMode, TestMode};

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn make_session(wpm: u32) -> TestSession {
        TestSession {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            mode: TestMode::Words,
            hand_mode: HandMode::Both,
            duration: 10,
            words: Vec::new(),
            results: TestResults {
                wpm,
                ..TestResults::default()
            },
            is_practice: false,
        }
    }

    fn make_problem_word(word: &str) -> ProblemWord {
        ProblemWord {
            word: word.to_string(),
            total_appearances: 2,
            typo_count: 1,
            typo_rate: 0.4,
            avg_time: 1200.0,
            slow_count: 0,
            last_practiced: Some(1_000),
            improvement_trend: Trend::Stable,
            severity_score: 82,
            tags: Vec::new(),
            hand: WordHand::Mixed,
        }
    }

    fn make_test_export(config: &Config) -> ExportData {
        ExportData {
            handtype_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            config: config.clone(),
            history: HistoryData::new(vec![make_session(55)]),
            problem_words: ProblemWordsData::new(vec![make_problem_word("their")]),
        }
    }

    #[test]
    fn test_missing_files_load_empty() {
        let (_dir, store) = make_test_store();
        assert!(store.load_history().is_empty());
        assert!(store.load_problem_words().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path(HISTORY_FILE), "{ not json").unwrap();
        assert!(store.load_history().is_empty());
    }

    #[test]
    fn test_stale_schema_is_discarded() {
        let (_dir, store) = make_test_store();
        let mut data = HistoryData::new(vec![make_session(40)]);
        data.schema_version = 99;
        store.save(HISTORY_FILE, &data).unwrap();
        assert!(store.load_history().is_empty());
    }

    #[test]
    fn test_sessions_saved_newest_first_and_capped() {
        let (_dir, store) = make_test_store();
        let store = store.with_history_limit(3);
        for wpm in [10, 20, 30, 40] {
            store.save_session(&make_session(wpm)).unwrap();
        }
        let wpms: Vec<u32> = store.load_history().iter().map(|s| s.results.wpm).collect();
        assert_eq!(wpms, vec![40, 30, 20]);
    }

    #[test]
    fn test_saving_same_session_twice_keeps_one_copy() {
        let (_dir, store) = make_test_store();
        let session = make_session(70);
        store.save_session(&session).unwrap();
        store.save_session(&session).unwrap();
        assert_eq!(store.load_history().len(), 1);
    }

    #[test]
    fn test_problem_words_round_trip_through_disk() {
        let (_dir, store) = make_test_store();
        let words = vec![make_problem_word("their"), make_problem_word("which")];
        store.save_problem_words(&words).unwrap();
        assert_eq!(store.load_problem_words(), words);
        assert!(!store.file_path("problem_words.tmp").exists());
    }

    #[test]
    fn test_clear_removes_data() {
        let (_dir, store) = make_test_store();
        store.save_session(&make_session(30)).unwrap();
        store
            .save_problem_words(&[make_problem_word("their")])
            .unwrap();
        store.clear().unwrap();
        assert!(store.load_history().is_empty());
        assert!(store.load_problem_words().is_empty());
        // Clearing an empty store is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_round_trip_export_import() {
        let (_dir, store) = make_test_store();
        let config = Config::default();
        store.save_session(&make_session(61)).unwrap();
        store
            .save_problem_words(&[make_problem_word("people")])
            .unwrap();

        let export = store.export_all(&config);
        assert_eq!(export.handtype_export_version, EXPORT_VERSION);

        let (_dir2, store2) = make_test_store();
        store2.import_all(&export).unwrap();

        assert_eq!(store2.load_history(), export.history.sessions);
        assert_eq!(store2.load_problem_words(), export.problem_words.words);
    }

    #[test]
    fn test_version_rejection() {
        let (_dir, store) = make_test_store();
        let mut export = make_test_export(&Config::default());
        export.handtype_export_version = 99;

        let err = store.import_all(&export).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedExportVersion { found: 99, .. }
        ));
        let msg = err.to_string();
        assert!(msg.contains("Unsupported export version"));
        assert!(msg.contains("99"));
    }

    #[test]
    fn test_import_replaces_existing_and_leaves_no_backups() {
        let (_dir, store) = make_test_store();
        store.save_session(&make_session(12)).unwrap();

        let export = make_test_export(&Config::default());
        store.import_all(&export).unwrap();

        let history = store.load_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].results.wpm, 55);
        assert!(!store.check_interrupted_import());
    }

    #[test]
    fn test_import_staging_failure_preserves_originals() {
        let (dir, store) = make_test_store();
        store.save_session(&make_session(42)).unwrap();
        let original = fs::read_to_string(store.file_path(HISTORY_FILE)).unwrap();

        let bad_dir = dir.path().join("nonexistent_subdir");
        let bad_store = JsonStore {
            base_dir: bad_dir.clone(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        };
        let err = bad_store
            .import_all(&make_test_export(&Config::default()))
            .unwrap_err();
        assert!(err.to_string().contains("Import failed during staging"));

        let after = fs::read_to_string(store.file_path(HISTORY_FILE)).unwrap();
        assert_eq!(original, after);
        assert!(!bad_dir.exists());
    }

    #[test]
    fn test_check_interrupted_import_detects_bak_files() {
        let (_dir, store) = make_test_store();
        assert!(!store.check_interrupted_import());

        fs::write(store.file_path("history.json.bak"), "{}").unwrap();
        assert!(store.check_interrupted_import());
        assert!(!store.file_path("history.json.bak").exists());
    }
}
