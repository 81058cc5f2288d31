pub mod analytics;
pub mod problem_words;
pub mod scoring;

pub use problem_words::{ProblemWord, ProblemWordStore};
