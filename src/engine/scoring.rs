use crate::session::input::WordResult;

const CHARS_PER_WORD: f64 = 5.0;
const BURST_WINDOW: usize = 3;
const MAX_WORD_WPM: u32 = 300;

pub fn wpm(correct_chars: usize, elapsed_minutes: f64) -> u32 {
    per_minute(correct_chars, elapsed_minutes)
}

pub fn raw_wpm(total_chars: usize, elapsed_minutes: f64) -> u32 {
    per_minute(total_chars, elapsed_minutes)
}

fn per_minute(chars: usize, elapsed_minutes: f64) -> u32 {
    if elapsed_minutes <= 0.0 || !elapsed_minutes.is_finite() {
        return 0;
    }
    (chars as f64 / CHARS_PER_WORD / elapsed_minutes).round() as u32
}

/// Keystroke accuracy as a whole percentage. Nothing typed means nothing
/// missed, so an empty denominator scores 100.
pub fn accuracy(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    let pct = (correct as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// Score in 0..=100 from the coefficient of variation of the samples
/// (population standard deviation over mean).
pub fn consistency(samples: &[f64]) -> u32 {
    if samples.len() < 2 {
        return 0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0;
    }
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let score = (100.0 * (1.0 - variance.sqrt() / mean)).round();
    score.clamp(0.0, 100.0) as u32
}

/// Positions where `typed` has the same character as `expected`. Anything
/// past the shorter of the two earns nothing.
pub fn matching_chars(expected: &str, typed: &str) -> usize {
    expected
        .chars()
        .zip(typed.chars())
        .filter(|(e, t)| e == t)
        .count()
}

/// Correct characters so far. A fully correct committed word also earns its
/// trailing space; a wrong one earns only its matching positions.
pub fn count_correct_chars(
    completed: &[WordResult],
    current_word: Option<&str>,
    current_input: Option<&str>,
) -> usize {
    let mut correct = 0;
    for w in completed {
        if w.correct {
            correct += w.expected.chars().count() + 1;
        } else {
            correct += matching_chars(&w.expected, &w.typed);
        }
    }

    if let (Some(word), Some(input)) = (current_word, current_input) {
        correct += matching_chars(word, input);
    }

    correct
}

/// Best raw WPM over any three consecutive words. Sessions with fewer than
/// three words report `fallback_wpm` instead.
pub fn burst_wpm(words: &[WordResult], fallback_wpm: u32) -> u32 {
    if words.len() < BURST_WINDOW {
        return fallback_wpm;
    }

    words
        .windows(BURST_WINDOW)
        .filter_map(|window| {
            let chars: usize = window.iter().map(|w| w.typed.chars().count()).sum();
            let elapsed_ms = window[BURST_WINDOW - 1].end_time - window[0].start_time;
            (elapsed_ms > 0).then(|| raw_wpm(chars, elapsed_ms as f64 / 60_000.0))
        })
        .max()
        .unwrap_or(0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordPerformance {
    pub wpm: u32,
    pub accuracy: u32,
    pub time_ms: i64,
}

pub fn word_performance(word: &WordResult) -> WordPerformance {
    let time_ms = word.duration_ms();
    let typed_len = word.typed.chars().count();
    let wpm = raw_wpm(typed_len, time_ms as f64 / 60_000.0).min(MAX_WORD_WPM);
    let accuracy = if typed_len == 0 {
        0
    } else {
        let denom = typed_len.max(word.expected.chars().count());
        self::accuracy(matching_chars(&word.expected, &word.typed), denom)
    };
    WordPerformance {
        wpm,
        accuracy,
        time_ms,
    }
}
