use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::generator::WordSupply;
use crate::keyboard::finger::{Hand, WordHand, word_hand};
use crate::session::HandMode;

const WORDS_EN: &str = include_str!("../../assets/words-en.json");

/// The bundled word list split by which hand types each word.
pub struct Dictionary {
    left: Vec<String>,
    right: Vec<String>,
    mixed: Vec<String>,
    rng: SmallRng,
}

impl Dictionary {
    pub fn load() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    pub fn with_rng(rng: SmallRng) -> Self {
        let words: Vec<String> = serde_json::from_str(WORDS_EN).unwrap_or_default();
        Self::from_words(words, rng)
    }

    pub fn from_words(words: Vec<String>, rng: SmallRng) -> Self {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut mixed = Vec::new();
        for word in words
            .into_iter()
            .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_lowercase()))
        {
            match word_hand(&word) {
                WordHand::Left => left.push(word),
                WordHand::Right => right.push(word),
                WordHand::Mixed => mixed.push(word),
            }
        }
        Self {
            left,
            right,
            mixed,
            rng,
        }
    }

    pub fn pool(&self, hand: WordHand) -> &[String] {
        match hand {
            WordHand::Left => &self.left,
            WordHand::Right => &self.right,
            WordHand::Mixed => &self.mixed,
        }
    }

    pub fn len(&self) -> usize {
        self.left.len() + self.right.len() + self.mixed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shuffled(&mut self, pool: &[String]) -> Vec<String> {
        let mut words = pool.to_vec();
        words.shuffle(&mut self.rng);
        words
    }

    /// Shuffled draw of `count` words. A pool smaller than `count` is
    /// reshuffled and drawn again rather than cutting the run short.
    fn draw(&mut self, pool: &[String], count: usize) -> Vec<String> {
        if pool.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            let need = count - out.len();
            out.extend(self.shuffled(pool).into_iter().take(need));
        }
        out
    }

    fn alternating(&mut self, count: usize) -> Vec<String> {
        let (left_pool, right_pool) = (self.left.clone(), self.right.clone());
        let left = self.shuffled(&left_pool);
        let right = self.shuffled(&right_pool);
        if left.is_empty() || right.is_empty() {
            let all = [left, right].concat();
            return self.draw(&all, count);
        }
        (0..count)
            .map(|i| {
                if i % 2 == 0 {
                    left[i % left.len()].clone()
                } else {
                    right[i % right.len()].clone()
                }
            })
            .collect()
    }
}

impl WordSupply for Dictionary {
    fn get_words(&mut self, hand_mode: HandMode, count: usize) -> Vec<String> {
        match hand_mode {
            HandMode::Left => self.hand_words(Hand::Left, count),
            HandMode::Right => self.hand_words(Hand::Right, count),
            HandMode::Alternating => self.alternating(count),
            HandMode::Both => {
                let all = [
                    self.left.as_slice(),
                    self.right.as_slice(),
                    self.mixed.as_slice(),
                ]
                .concat();
                self.draw(&all, count)
            }
        }
    }

    fn filler_words(&mut self, count: usize) -> Vec<String> {
        let pool = self.mixed.clone();
        self.draw(&pool, count)
    }

    fn hand_words(&mut self, hand: Hand, count: usize) -> Vec<String> {
        let pool = match hand {
            Hand::Left => self.left.clone(),
            Hand::Right => self.right.clone(),
        };
        self.draw(&pool, count)
    }
}
