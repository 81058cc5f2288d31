pub mod json_store;
pub mod schema;
pub mod sync;

use crate::engine::problem_words::ProblemWord;
use crate::error::StoreResult;
use crate::session::result::TestSession;

/// Durable home for finished sessions and the problem-word table.
pub trait SessionStore: Send {
    fn save_session(&self, session: &TestSession) -> StoreResult<()>;
    fn save_problem_words(&self, words: &[ProblemWord]) -> StoreResult<()>;
    /// Newest first.
    fn load_history(&self) -> Vec<TestSession>;
    fn load_problem_words(&self) -> Vec<ProblemWord>;
    fn clear_all(&self) -> StoreResult<()>;
}
