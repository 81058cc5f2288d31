use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keyboard::finger::WordHand;
use crate::session::input::WordResult;

/// Per-attempt typo rate above which a word counts as a problem.
pub const TYPO_RATE_THRESHOLD: f64 = 0.3;
/// Attempt time above which a word counts as slow.
pub const SLOW_WORD_TIME_MS: f64 = 2000.0;
const TREND_THRESHOLD: f64 = 0.1;
const GRADUATION_TYPO_RATE: f64 = 0.1;
const GRADUATION_MIN_APPEARANCES: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Worsening,
}

impl Trend {
    /// Compares one attempt's typo rate against the running average it is
    /// about to be folded into.
    fn between(old_rate: f64, new_rate: f64) -> Self {
        if new_rate < old_rate - TREND_THRESHOLD {
            Trend::Improving
        } else if new_rate > old_rate + TREND_THRESHOLD {
            Trend::Worsening
        } else {
            Trend::Stable
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemTag {
    TypoProne,
    Slow,
}

impl ProblemTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemTag::TypoProne => "typo-prone",
            ProblemTag::Slow => "slow",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProblemWord {
    pub word: String,
    pub total_appearances: u32,
    pub typo_count: u32,
    pub typo_rate: f64,
    pub avg_time: f64,
    pub slow_count: u32,
    #[serde(default)]
    pub last_practiced: Option<i64>,
    pub improvement_trend: Trend,
    pub severity_score: u32,
    #[serde(default)]
    pub tags: Vec<ProblemTag>,
    pub hand: WordHand,
}

/// Error frequency weighs most, then latency, on top of a constant floor.
pub fn severity_score(typo_rate: f64, avg_time_ms: f64) -> u32 {
    let raw = (typo_rate * 40.0 + (avg_time_ms / 1000.0) * 30.0 + 30.0).round();
    raw.clamp(0.0, 100.0) as u32
}

fn tags_for(typo_rate: f64, avg_time_ms: f64) -> Vec<ProblemTag> {
    let mut tags = Vec::new();
    if typo_rate > TYPO_RATE_THRESHOLD {
        tags.push(ProblemTag::TypoProne);
    }
    if avg_time_ms > SLOW_WORD_TIME_MS {
        tags.push(ProblemTag::Slow);
    }
    tags
}

fn qualifies(typo_rate: f64, word_time_ms: f64) -> bool {
    typo_rate > TYPO_RATE_THRESHOLD || word_time_ms > SLOW_WORD_TIME_MS
}

/// Words the user struggles with, keyed by word text.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProblemWordStore {
    pub words: HashMap<String, ProblemWord>,
}

impl ProblemWordStore {
    pub fn from_list(list: Vec<ProblemWord>) -> Self {
        Self {
            words: list.into_iter().map(|p| (p.word.clone(), p)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&ProblemWord> {
        self.words.get(word)
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Fold one session's attempts into the table, in order. A word seen
    /// twice in the session is updated twice.
    pub fn update(&mut self, results: &[WordResult], now_ms: i64) {
        for result in results {
            self.update_one(result, now_ms);
        }
    }

    fn update_one(&mut self, result: &WordResult, now_ms: i64) {
        let typo_rate = result.typo_rate();
        let word_time = result.duration_ms() as f64;
        let miss = u32::from(!result.correct);

        let Some(existing) = self.words.get_mut(&result.expected) else {
            if qualifies(typo_rate, word_time) {
                self.words.insert(
                    result.expected.clone(),
                    ProblemWord {
                        word: result.expected.clone(),
                        total_appearances: 1,
                        typo_count: miss,
                        typo_rate,
                        avg_time: word_time,
                        slow_count: u32::from(word_time > SLOW_WORD_TIME_MS),
                        last_practiced: Some(now_ms),
                        improvement_trend: Trend::Stable,
                        severity_score: severity_score(typo_rate, word_time),
                        tags: tags_for(typo_rate, word_time),
                        hand: result.hand,
                    },
                );
            }
            return;
        };

        let old_count = existing.total_appearances as f64;
        let appearances = existing.total_appearances + 1;
        let new_rate = (existing.typo_rate * old_count + typo_rate) / appearances as f64;
        let new_avg = (existing.avg_time * old_count + word_time) / appearances as f64;
        let trend = Trend::between(existing.typo_rate, typo_rate);

        if new_rate < GRADUATION_TYPO_RATE
            && appearances >= GRADUATION_MIN_APPEARANCES
            && trend == Trend::Improving
        {
            debug!(word = %result.expected, appearances, "problem word graduated");
            self.words.remove(&result.expected);
            return;
        }

        if word_time > existing.avg_time * 2.0 {
            existing.slow_count += 1;
        }
        existing.total_appearances = appearances;
        existing.typo_count += miss;
        existing.typo_rate = new_rate;
        existing.avg_time = new_avg;
        existing.last_practiced = Some(now_ms);
        existing.improvement_trend = trend;
        existing.severity_score = severity_score(new_rate, new_avg);
        existing.tags = tags_for(new_rate, new_avg);
    }

    /// Records by descending severity. Ties fall back to word text so the
    /// order is stable across runs.
    pub fn ranked(&self) -> Vec<&ProblemWord> {
        let mut list: Vec<&ProblemWord> = self.words.values().collect();
        list.sort_by(|a, b| match b.severity_score.cmp(&a.severity_score) {
            Ordering::Equal => a.word.cmp(&b.word),
            other => other,
        });
        list
    }

    pub fn top(&self, n: usize) -> Vec<String> {
        self.ranked()
            .into_iter()
            .take(n)
            .map(|p| p.word.clone())
            .collect()
    }

    pub fn to_list(&self) -> Vec<ProblemWord> {
        self.ranked().into_iter().cloned().collect()
    }
}
