use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::problem_words::ProblemWordStore;
use crate::generator::WordSupply;
use crate::keyboard::finger::Hand;

pub const MAX_CUSTOM_WORD_LEN: usize = 50;
pub const MAX_CUSTOM_WORDS: usize = 500;
pub const DEFAULT_MIX_RATIO: f64 = 0.7;

/// Where a practice run's words come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PracticeSource {
    /// Weakest tracked words padded with general fillers.
    ProblemWords,
    LeftHand,
    RightHand,
    /// Free text pasted by the user.
    Custom(String),
}

impl PracticeSource {
    pub fn label(&self) -> &'static str {
        match self {
            PracticeSource::ProblemWords => "problem words",
            PracticeSource::LeftHand => "left hand",
            PracticeSource::RightHand => "right hand",
            PracticeSource::Custom(_) => "custom",
        }
    }
}

pub fn parse_custom_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|w| w.chars().count() <= MAX_CUSTOM_WORD_LEN)
        .take(MAX_CUSTOM_WORDS)
        .map(str::to_string)
        .collect()
}

/// Top `floor(total * mix_ratio)` words by severity, the rest filler, all
/// shuffled together.
pub fn mixed_problem_words<R: Rng + ?Sized>(
    table: &ProblemWordStore,
    supply: &mut dyn WordSupply,
    total: usize,
    mix_ratio: f64,
    rng: &mut R,
) -> Vec<String> {
    let problem_count = (total as f64 * mix_ratio.clamp(0.0, 1.0)).floor() as usize;
    let mut words = table.top(problem_count);
    let filler_count = total.saturating_sub(words.len());
    let mut fillers = supply.filler_words(filler_count);
    fillers.shuffle(rng);
    words.extend(fillers);
    words.shuffle(rng);
    words
}

/// Builds the word list for a practice run. Custom text is used verbatim
/// after parsing; the other sources draw `total` words.
pub fn practice_words<R: Rng + ?Sized>(
    source: &PracticeSource,
    table: &ProblemWordStore,
    supply: &mut dyn WordSupply,
    total: usize,
    mix_ratio: f64,
    rng: &mut R,
) -> Vec<String> {
    match source {
        PracticeSource::Custom(text) => parse_custom_words(text),
        PracticeSource::LeftHand => supply.hand_words(Hand::Left, total),
        PracticeSource::RightHand => supply.hand_words(Hand::Right, total),
        PracticeSource::ProblemWords => mixed_problem_words(table, supply, total, mix_ratio, rng),
    }
}
