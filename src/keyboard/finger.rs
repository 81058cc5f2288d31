use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finger {
    Pinky,
    Ring,
    Middle,
    Index,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerAssignment {
    pub hand: Hand,
    pub finger: Finger,
}

impl FingerAssignment {
    pub fn new(hand: Hand, finger: Finger) -> Self {
        Self { hand, finger }
    }
}

/// Which side of the keyboard a whole word is typed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordHand {
    Left,
    Right,
    Mixed,
}

impl WordHand {
    pub fn as_str(self) -> &'static str {
        match self {
            WordHand::Left => "left",
            WordHand::Right => "right",
            WordHand::Mixed => "mixed",
        }
    }
}

/// Touch-typing finger for an ASCII letter on QWERTY. Anything that is not a
/// letter has no assignment and does not take part in hand classification.
pub fn qwerty_finger(ch: char) -> Option<FingerAssignment> {
    use Finger::*;
    use Hand::*;

    let assignment = match ch.to_ascii_lowercase() {
        'q' | 'a' | 'z' => FingerAssignment::new(Left, Pinky),
        'w' | 's' | 'x' => FingerAssignment::new(Left, Ring),
        'e' | 'd' | 'c' => FingerAssignment::new(Left, Middle),
        'r' | 'f' | 'v' | 't' | 'g' | 'b' => FingerAssignment::new(Left, Index),
        'y' | 'h' | 'n' | 'u' | 'j' | 'm' => FingerAssignment::new(Right, Index),
        'i' | 'k' => FingerAssignment::new(Right, Middle),
        'o' | 'l' => FingerAssignment::new(Right, Ring),
        'p' => FingerAssignment::new(Right, Pinky),
        _ => return None,
    };
    Some(assignment)
}

pub fn word_hand(word: &str) -> WordHand {
    let mut left = 0usize;
    let mut right = 0usize;
    for assignment in word.chars().filter_map(qwerty_finger) {
        match assignment.hand {
            Hand::Left => left += 1,
            Hand::Right => right += 1,
        }
    }

    match (left > 0, right > 0) {
        (true, false) => WordHand::Left,
        (false, true) => WordHand::Right,
        _ => WordHand::Mixed,
    }
}
