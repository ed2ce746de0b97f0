pub mod extract;
pub mod index;

pub use extract::{extract, extract_with_progress, load_history, HistoryOutcome};
pub use index::monthly_index;
