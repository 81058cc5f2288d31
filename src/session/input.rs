use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keyboard::finger::{WordHand, word_hand};
use crate::session::TestStatus;
use crate::session::test::TypingTest;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keystroke {
    pub key: char,
    pub timestamp: i64,
    pub correct: bool,
    pub delay: i64,
}

/// One committed attempt at a target word.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordResult {
    pub expected: String,
    pub typed: String,
    pub correct: bool,
    pub start_time: i64,
    pub end_time: i64,
    pub keystrokes: Vec<Keystroke>,
    pub typo_count: usize,
    pub hand: WordHand,
}

impl WordResult {
    pub fn new(
        expected: &str,
        typed: &str,
        start_time: i64,
        end_time: i64,
        keystrokes: Vec<Keystroke>,
    ) -> Self {
        let typo_count = keystrokes.iter().filter(|k| !k.correct).count();
        Self {
            expected: expected.to_string(),
            typed: typed.to_string(),
            correct: typed == expected,
            start_time,
            end_time,
            keystrokes,
            typo_count,
            hand: word_hand(expected),
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_time - self.start_time
    }

    /// Share of this attempt's surviving keystrokes that were wrong.
    pub fn typo_rate(&self) -> f64 {
        if self.keystrokes.is_empty() {
            return 0.0;
        }
        self.typo_count as f64 / self.keystrokes.len() as f64
    }
}

pub fn process_key(test: &mut TypingTest, key: char) {
    if test.live.status != TestStatus::Running || key == ' ' {
        return;
    }
    let index = test.live.current_word_index;
    let Some(word) = test.live.words.get(index).cloned() else {
        return;
    };

    let now = test.now_ms();
    let live = &mut test.live;
    if live.current_word_start_time.is_none() {
        live.current_word_start_time = Some(now);
    }
    let delay = live.last_keystroke_time.map_or(0, |last| now - last);

    // Past the end of the word there is nothing to match: overflow is wrong.
    let expected = word.chars().nth(live.current_input.chars().count());
    let correct = expected == Some(key);

    live.current_input.push(key);
    live.current_word_keystrokes.push(Keystroke {
        key,
        timestamp: now,
        correct,
        delay,
    });
    live.last_keystroke_time = Some(now);

    if live.current_input == word && test.is_final_word(index) {
        debug!(word = %word, "final word matched, completing without space");
        commit_word(test, now);
    }
}

pub fn process_backspace(test: &mut TypingTest) {
    if test.live.status != TestStatus::Running {
        return;
    }
    let now = test.now_ms();
    let live = &mut test.live;

    if live.current_input.pop().is_some() {
        live.current_word_keystrokes.pop();
        live.last_keystroke_time = Some(now);
        return;
    }

    // Empty input: only the immediately preceding word may be reopened, and
    // only when it was committed wrong.
    if live.current_word_index == 0 || live.current_word_index < live.furthest_word_index {
        return;
    }
    let Some(prev) = live.word_results.pop_if(|prev| !prev.correct) else {
        return;
    };

    live.current_word_index -= 1;
    live.current_input = prev.typed;
    live.current_word_keystrokes = prev.keystrokes;
    live.current_word_start_time = Some(prev.start_time);
    live.last_keystroke_time = Some(now);
}

pub fn process_space(test: &mut TypingTest) {
    if test.live.status != TestStatus::Running || test.live.current_input.is_empty() {
        return;
    }
    let now = test.now_ms();
    commit_word(test, now);
}

/// Close out the in-progress word and either advance or finish the run.
fn commit_word(test: &mut TypingTest, now: i64) {
    let index = test.live.current_word_index;
    let Some(expected) = test.live.words.get(index).cloned() else {
        return;
    };

    let live = &mut test.live;
    let keystrokes = std::mem::take(&mut live.current_word_keystrokes);
    let typed = std::mem::take(&mut live.current_input);
    let start_time = live.current_word_start_time.take().unwrap_or(now);
    live.word_results.push(WordResult::new(
        &expected, &typed, start_time, now, keystrokes,
    ));

    let next = index + 1;
    live.current_word_index = next;
    live.last_keystroke_time = Some(now);

    if test.run_complete_at(next) {
        test.finish();
        return;
    }

    test.live.furthest_word_index = test.live.furthest_word_index.max(next);
}
