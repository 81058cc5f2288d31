use crate::session::HandMode;
use crate::session::result::TestSession;

const RECENT_WINDOW: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WpmTrend {
    Improving,
    Declining,
    Steady,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandModeStats {
    pub hand_mode: HandMode,
    pub tests: usize,
    pub avg_wpm: u32,
    pub avg_accuracy: u32,
}

/// Lifetime figures over ranked history. Practice runs never count here.
#[derive(Clone, Debug, PartialEq)]
pub struct LifetimeStats {
    pub total_tests: usize,
    pub total_time_secs: f64,
    pub avg_wpm: u32,
    pub avg_accuracy: u32,
    pub best_wpm: u32,
    pub word_accuracy: u32,
    pub recent_trend: WpmTrend,
    pub by_hand_mode: Vec<HandModeStats>,
}

fn mean_rounded(values: impl Iterator<Item = u32>) -> u32 {
    let (sum, n) = values.fold((0u64, 0u64), |(s, n), v| (s + v as u64, n + 1));
    if n == 0 {
        return 0;
    }
    (sum as f64 / n as f64).round() as u32
}

impl LifetimeStats {
    /// `history` is newest first, the order the trainer keeps it in.
    pub fn from_history(history: &[TestSession]) -> Self {
        let ranked: Vec<&TestSession> = history.iter().filter(|s| !s.is_practice).collect();

        let total_words: usize = ranked.iter().map(|s| s.results.total_words).sum();
        let correct_words: usize = ranked.iter().map(|s| s.results.correct_words).sum();
        let word_accuracy = if total_words > 0 {
            (correct_words as f64 / total_words as f64 * 100.0).round() as u32
        } else {
            0
        };

        let recent: Vec<u32> = ranked
            .iter()
            .take(RECENT_WINDOW)
            .map(|s| s.results.wpm)
            .collect();
        let recent_trend = match (recent.first(), recent.last()) {
            (Some(newest), Some(oldest)) if recent.len() >= 2 => match newest.cmp(oldest) {
                std::cmp::Ordering::Greater => WpmTrend::Improving,
                std::cmp::Ordering::Less => WpmTrend::Declining,
                std::cmp::Ordering::Equal => WpmTrend::Steady,
            },
            _ => WpmTrend::Steady,
        };

        let by_hand_mode = HandMode::ALL
            .iter()
            .filter_map(|&mode| {
                let runs: Vec<&&TestSession> =
                    ranked.iter().filter(|s| s.hand_mode == mode).collect();
                if runs.is_empty() {
                    return None;
                }
                Some(HandModeStats {
                    hand_mode: mode,
                    tests: runs.len(),
                    avg_wpm: mean_rounded(runs.iter().map(|s| s.results.wpm)),
                    avg_accuracy: mean_rounded(runs.iter().map(|s| s.results.accuracy)),
                })
            })
            .collect();

        Self {
            total_tests: ranked.len(),
            total_time_secs: ranked.iter().map(|s| s.typing_secs()).sum(),
            avg_wpm: mean_rounded(ranked.iter().map(|s| s.results.wpm)),
            avg_accuracy: mean_rounded(ranked.iter().map(|s| s.results.accuracy)),
            best_wpm: ranked.iter().map(|s| s.results.wpm).max().unwrap_or(0),
            word_accuracy,
            recent_trend,
            by_hand_mode,
        }
    }
}
