pub mod clock;
pub mod input;
pub mod practice;
pub mod result;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    #[default]
    Time,
    Words,
}

impl TestMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TestMode::Time => "time",
            TestMode::Words => "words",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandMode {
    #[default]
    Both,
    Left,
    Right,
    Alternating,
}

impl HandMode {
    pub const ALL: [HandMode; 4] = [
        HandMode::Both,
        HandMode::Left,
        HandMode::Right,
        HandMode::Alternating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HandMode::Both => "both",
            HandMode::Left => "left",
            HandMode::Right => "right",
            HandMode::Alternating => "alternating",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestStatus {
    Idle,
    Running,
    Finished,
}
