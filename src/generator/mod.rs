pub mod dictionary;

use crate::keyboard::finger::Hand;
use crate::session::HandMode;

/// Source of target words for a run.
pub trait WordSupply {
    /// Words for a normal run under `hand_mode`.
    fn get_words(&mut self, hand_mode: HandMode, count: usize) -> Vec<String>;

    /// General-purpose words used to pad practice runs.
    fn filler_words(&mut self, count: usize) -> Vec<String>;

    /// Words typed entirely by one hand.
    fn hand_words(&mut self, hand: Hand, count: usize) -> Vec<String>;
}
