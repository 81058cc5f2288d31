use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::problem_words::{SLOW_WORD_TIME_MS, TYPO_RATE_THRESHOLD};
use crate::engine::scoring;
use crate::session::input::{Keystroke, WordResult};
use crate::session::{HandMode, TestMode};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResults {
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    pub consistency: u32,
    pub total_chars: usize,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_words: usize,
    pub correct_words: usize,
    #[serde(default)]
    pub problem_words: Vec<String>,
    #[serde(default)]
    pub slow_words: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestSession {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mode: TestMode,
    pub hand_mode: HandMode,
    pub duration: u32,
    pub words: Vec<WordResult>,
    pub results: TestResults,
    #[serde(default)]
    pub is_practice: bool,
}

impl TestSession {
    /// Wall-clock seconds spent typing, from the first committed word to the
    /// last one.
    pub fn typing_secs(&self) -> f64 {
        match (self.words.first(), self.words.last()) {
            (Some(first), Some(last)) => (last.end_time - first.start_time).max(0) as f64 / 1000.0,
            _ => 0.0,
        }
    }

    pub fn burst_wpm(&self) -> u32 {
        scoring::burst_wpm(&self.words, self.results.wpm)
    }
}

/// The word being typed when the run ended, if any.
pub struct PartialWord<'a> {
    pub expected: Option<&'a str>,
    pub typed: &'a str,
    pub keystrokes: &'a [Keystroke],
}

pub struct CompileInput<'a> {
    pub word_results: &'a [WordResult],
    pub partial: Option<PartialWord<'a>>,
    pub start_time: i64,
    pub end_time: i64,
    pub wpm_history: &'a [u32],
}

pub fn compile(input: &CompileInput) -> TestResults {
    let words = input.word_results;
    let mut total_chars = 0usize;
    let mut correct_chars = 0usize;
    let mut total_keystrokes = 0usize;
    let mut correct_keystrokes = 0usize;

    for (i, w) in words.iter().enumerate() {
        total_chars += w.typed.chars().count();
        correct_chars += if w.correct {
            w.expected.chars().count()
        } else {
            scoring::matching_chars(&w.expected, &w.typed)
        };
        // The committing space between two words is always a valid action.
        if i + 1 < words.len() {
            total_chars += 1;
            correct_chars += 1;
        }
        total_keystrokes += w.keystrokes.len();
        correct_keystrokes += w.keystrokes.iter().filter(|k| k.correct).count();
    }

    if let Some(partial) = input.partial.as_ref().filter(|p| !p.typed.is_empty()) {
        total_chars += partial.typed.chars().count();
        correct_chars += partial
            .expected
            .map_or(0, |expected| scoring::matching_chars(expected, partial.typed));
        if !words.is_empty() {
            total_chars += 1;
            correct_chars += 1;
        }
        total_keystrokes += partial.keystrokes.len();
        correct_keystrokes += partial.keystrokes.iter().filter(|k| k.correct).count();
    }

    let elapsed_minutes = (input.end_time - input.start_time) as f64 / 60_000.0;
    let samples: Vec<f64> = input.wpm_history.iter().map(|&s| s as f64).collect();

    TestResults {
        wpm: scoring::wpm(correct_chars, elapsed_minutes),
        raw_wpm: scoring::raw_wpm(total_chars, elapsed_minutes),
        accuracy: scoring::accuracy(correct_keystrokes, total_keystrokes),
        consistency: scoring::consistency(&samples),
        total_chars,
        correct_chars,
        incorrect_chars: total_chars.saturating_sub(correct_chars),
        total_words: words.len(),
        correct_words: words.iter().filter(|w| w.correct).count(),
        problem_words: dedup_words(words, |w| w.typo_rate() > TYPO_RATE_THRESHOLD),
        slow_words: dedup_words(words, |w| w.duration_ms() as f64 > SLOW_WORD_TIME_MS),
    }
}

fn dedup_words(words: &[WordResult], flagged: impl Fn(&WordResult) -> bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for w in words.iter().filter(|w| flagged(w)) {
        if !out.contains(&w.expected) {
            out.push(w.expected.clone());
        }
    }
    out
}
