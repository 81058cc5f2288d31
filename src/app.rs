use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::analytics::LifetimeStats;
use crate::engine::problem_words::ProblemWordStore;
use crate::generator::WordSupply;
use crate::generator::dictionary::Dictionary;
use crate::session::clock::{Clock, SystemClock};
use crate::session::practice::{self, PracticeSource};
use crate::session::result::TestSession;
use crate::session::test::TypingTest;
use crate::session::{HandMode, TestMode, TestStatus};
use crate::store::SessionStore;
use crate::store::json_store::JsonStore;
use crate::store::sync::{SyncStatus, SyncWorker};

/// Owns one user's trainer state: the live run, the problem-word table and
/// the session history, with writes mirrored to disk in the background.
pub struct Trainer {
    pub config: Config,
    pub test: TypingTest,
    pub problem_words: ProblemWordStore,
    /// Newest first, practice runs included.
    history: Vec<TestSession>,
    last_session: Option<TestSession>,
    supply: Box<dyn WordSupply>,
    sync: Option<SyncWorker>,
    /// Where setting changes are written. `None` keeps them in memory.
    config_path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    rng: SmallRng,
}

impl Trainer {
    pub fn new(config: Config) -> Result<Self> {
        let store = match &config.data_dir {
            Some(dir) => JsonStore::with_base_dir(dir.clone())?,
            None => JsonStore::new()?,
        }
        .with_history_limit(config.history_limit);
        if store.check_interrupted_import() {
            warn!(dir = %store.base_dir().display(), "cleaned up after an interrupted import");
        }

        Ok(Self::with_parts(
            config,
            Some(Box::new(store)),
            Box::new(Dictionary::load()),
            Arc::new(SystemClock),
            SmallRng::from_entropy(),
        )
        .with_config_path(Config::default_path()))
    }

    /// Assemble a trainer from explicit collaborators. Without a store the
    /// trainer starts empty and keeps everything in memory.
    pub fn with_parts(
        config: Config,
        store: Option<Box<dyn SessionStore>>,
        supply: Box<dyn WordSupply>,
        clock: Arc<dyn Clock>,
        rng: SmallRng,
    ) -> Self {
        let (history, problem_words, sync) = match store {
            Some(store) => {
                let mut history = store.load_history();
                history.truncate(config.history_limit);
                let problem_words = ProblemWordStore::from_list(store.load_problem_words());
                let sync = SyncWorker::spawn(store, config.retry_policy());
                (history, problem_words, Some(sync))
            }
            None => (Vec::new(), ProblemWordStore::default(), None),
        };
        debug!(
            sessions = history.len(),
            problem_words = problem_words.len(),
            "trainer loaded"
        );

        Self {
            test: TypingTest::new(config.test_settings(), Arc::clone(&clock)),
            config,
            problem_words,
            history,
            last_session: None,
            supply,
            sync,
            config_path: None,
            clock,
            rng,
        }
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn history(&self) -> &[TestSession] {
        &self.history
    }

    pub fn last_session(&self) -> Option<&TestSession> {
        self.last_session.as_ref()
    }

    pub fn lifetime_stats(&self) -> LifetimeStats {
        LifetimeStats::from_history(&self.history)
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync
            .as_ref()
            .map_or(SyncStatus::Idle, SyncWorker::status)
    }

    /// Wait for queued background writes. A no-op when running in memory.
    pub fn flush(&self) -> Result<()> {
        if let Some(sync) = &self.sync {
            sync.flush()?;
        }
        Ok(())
    }

    // Settings follow the config, only change between runs, and are written
    // back to the config file.

    pub fn set_test_mode(&mut self, mode: TestMode) {
        if self.test.is_running() {
            return;
        }
        self.config.test_mode = mode;
        self.test.set_test_mode(mode);
        self.save_config();
    }

    pub fn set_hand_mode(&mut self, mode: HandMode) {
        if self.test.is_running() {
            return;
        }
        self.config.hand_mode = mode;
        self.test.set_hand_mode(mode);
        self.save_config();
    }

    pub fn set_duration(&mut self, duration: u32) {
        if self.test.is_running() {
            return;
        }
        self.config.duration = duration.clamp(1, 600);
        self.test.set_duration(self.config.duration);
        self.save_config();
    }

    fn save_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            warn!(path = %path.display(), error = %e, "failed to save config");
        }
    }

    /// Start a normal run from the configured settings. A previous practice
    /// run may have overridden mode and duration; those are restored first.
    pub fn start_test(&mut self) {
        self.test.settings = self.config.test_settings();
        self.test.start(self.supply.as_mut());
        self.last_session = None;
    }

    pub fn start_practice(&mut self, source: &PracticeSource) -> bool {
        let words = practice::practice_words(
            source,
            &self.problem_words,
            self.supply.as_mut(),
            self.config.practice_word_count,
            self.config.practice_mix_ratio,
            &mut self.rng,
        );
        debug!(source = source.label(), words = words.len(), "practice words built");
        self.last_session = None;
        self.test.start_practice(words)
    }

    pub fn reset_test(&mut self) {
        self.test.settings = self.config.test_settings();
        self.test.reset();
    }

    pub fn type_char(&mut self, ch: char) {
        self.test.handle_key_press(ch);
        self.collect_finished();
    }

    pub fn space(&mut self) {
        self.test.handle_space();
        self.collect_finished();
    }

    pub fn backspace(&mut self) {
        self.test.handle_backspace();
    }

    pub fn tick(&mut self) {
        self.test.tick();
        self.collect_finished();
    }

    /// Forget all history and problem words, on disk as well.
    pub fn reset_all_data(&mut self) {
        self.history.clear();
        self.problem_words.clear();
        self.last_session = None;
        self.reset_test();
        if let Some(sync) = &self.sync {
            sync.clear();
        }
        info!("all trainer data cleared");
    }

    fn collect_finished(&mut self) {
        if self.test.status() != TestStatus::Finished {
            return;
        }
        let Some(session) = self.test.take_completed() else {
            return;
        };

        self.problem_words.update(&session.words, self.clock.now_ms());
        self.history.insert(0, session.clone());
        self.history.truncate(self.config.history_limit);

        info!(
            id = %session.id,
            wpm = session.results.wpm,
            accuracy = session.results.accuracy,
            practice = session.is_practice,
            problem_words = self.problem_words.len(),
            "session recorded"
        );

        if let Some(sync) = &self.sync {
            sync.save_session(session.clone());
            sync.save_problem_words(self.problem_words.to_list());
        }
        self.last_session = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::finger::Hand;
    use crate::session::clock::ManualClock;

    /// Hands out a fixed list, cycling when asked for more.
    struct ListSupply(Vec<&'static str>);

    impl ListSupply {
        fn take(&self, count: usize) -> Vec<String> {
            self.0
                .iter()
                .cycle()
                .take(count)
                .map(|w| w.to_string())
                .collect()
        }
    }

    impl WordSupply for ListSupply {
        fn get_words(&mut self, _hand_mode: HandMode, count: usize) -> Vec<String> {
            self.take(count)
        }

        fn filler_words(&mut self, count: usize) -> Vec<String> {
            self.take(count)
        }

        fn hand_words(&mut self, _hand: Hand, count: usize) -> Vec<String> {
            self.take(count)
        }
    }

    fn trainer(config: Config, clock: &ManualClock) -> Trainer {
        Trainer::with_parts(
            config,
            None,
            Box::new(ListSupply(vec!["ab", "cd"])),
            Arc::new(clock.clone()),
            SmallRng::seed_from_u64(1),
        )
    }

    fn words_config(duration: u32) -> Config {
        Config {
            test_mode: TestMode::Words,
            duration,
            ..Config::default()
        }
    }

    fn type_word(t: &mut Trainer, clock: &ManualClock, word: &str) {
        for ch in word.chars() {
            clock.advance(100);
            t.type_char(ch);
        }
    }

    #[test]
    fn test_finished_run_lands_in_history() {
        let clock = ManualClock::new(0);
        let mut t = trainer(words_config(2), &clock);
        t.start_test();
        type_word(&mut t, &clock, "ab");
        t.space();
        type_word(&mut t, &clock, "cd");

        assert_eq!(t.test.status(), TestStatus::Finished);
        assert_eq!(t.history().len(), 1);
        let last = t.last_session().unwrap();
        assert_eq!(last.results.correct_words, 2);
        assert!(!last.is_practice);
        assert_eq!(t.lifetime_stats().total_tests, 1);
    }

    #[test]
    fn test_typo_prone_word_enters_problem_table() {
        let clock = ManualClock::new(0);
        let mut t = trainer(words_config(2), &clock);
        t.start_test();
        type_word(&mut t, &clock, "xx");
        t.space();
        type_word(&mut t, &clock, "cd");

        assert!(t.problem_words.get("ab").is_some());
        assert!(t.problem_words.get("cd").is_none());
    }

    #[test]
    fn test_practice_runs_excluded_from_lifetime_stats() {
        let clock = ManualClock::new(0);
        let mut t = trainer(words_config(2), &clock);
        assert!(t.start_practice(&PracticeSource::Custom("ab".into())));
        assert_eq!(t.test.settings.test_mode, TestMode::Words);
        type_word(&mut t, &clock, "ab");

        assert_eq!(t.history().len(), 1);
        assert!(t.history()[0].is_practice);
        assert_eq!(t.lifetime_stats().total_tests, 0);
    }

    #[test]
    fn test_start_test_restores_configured_settings_after_practice() {
        let clock = ManualClock::new(0);
        let mut t = trainer(Config::default(), &clock);
        t.start_practice(&PracticeSource::Custom("ab cd ab".into()));
        assert_eq!(t.test.settings.duration, 3);
        t.reset_test();
        assert_eq!(t.test.settings.test_mode, TestMode::Time);
        assert_eq!(t.test.live.time_remaining, Some(30));
        t.start_test();
        assert_eq!(t.test.live.words.len(), 200);
    }

    #[test]
    fn test_empty_custom_practice_stays_idle() {
        let clock = ManualClock::new(0);
        let mut t = trainer(Config::default(), &clock);
        assert!(!t.start_practice(&PracticeSource::Custom("   ".into())));
        assert_eq!(t.test.status(), TestStatus::Idle);
    }

    #[test]
    fn test_history_capped_by_config() {
        let clock = ManualClock::new(0);
        let config = Config {
            history_limit: 2,
            ..words_config(1)
        };
        let mut t = trainer(config, &clock);
        for _ in 0..3 {
            t.start_test();
            type_word(&mut t, &clock, "ab");
        }
        assert_eq!(t.history().len(), 2);
    }

    #[test]
    fn test_settings_locked_while_running() {
        let clock = ManualClock::new(0);
        let mut t = trainer(words_config(2), &clock);
        t.start_test();
        t.set_duration(10);
        t.set_test_mode(TestMode::Time);
        assert_eq!(t.config.duration, 2);
        assert_eq!(t.config.test_mode, TestMode::Words);
        t.reset_test();
        t.set_duration(10);
        assert_eq!(t.config.duration, 10);
        assert_eq!(t.test.settings.duration, 10);
    }

    #[test]
    fn test_setting_changes_written_to_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let clock = ManualClock::new(0);
        let mut t = trainer(words_config(2), &clock).with_config_path(path.clone());

        t.set_test_mode(TestMode::Time);
        t.set_hand_mode(HandMode::Left);
        t.set_duration(45);

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.test_mode, TestMode::Time);
        assert_eq!(saved.hand_mode, HandMode::Left);
        assert_eq!(saved.duration, 45);
        assert_eq!(saved, t.config);
    }

    #[test]
    fn test_locked_setting_not_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let clock = ManualClock::new(0);
        let mut t = trainer(words_config(2), &clock).with_config_path(path.clone());
        t.start_test();
        t.set_duration(10);
        assert!(!path.exists());
    }

    #[test]
    fn test_reset_all_data() {
        let clock = ManualClock::new(0);
        let mut t = trainer(words_config(1), &clock);
        t.start_test();
        type_word(&mut t, &clock, "zz");
        t.space();
        assert_eq!(t.history().len(), 1);
        assert!(!t.problem_words.is_empty());

        t.reset_all_data();
        assert!(t.history().is_empty());
        assert!(t.problem_words.is_empty());
        assert!(t.last_session().is_none());
        assert_eq!(t.test.status(), TestStatus::Idle);
        assert_eq!(t.sync_status(), SyncStatus::Idle);
    }
}
