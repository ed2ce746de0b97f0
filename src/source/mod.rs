mod github;
mod transport;

pub use github::GithubSource;
pub use transport::{Page, Transport, UreqTransport};

use crate::error::Result;
use crate::model::{ChangeEvent, EntitySnapshot};

/// Where the history extractor reads its timeline and manifest revisions from.
pub trait HistorySource {
    /// Every commit touching `manifest`, in the order the source lists them.
    fn change_events(&self, manifest: &str) -> Result<Vec<ChangeEvent>>;

    fn snapshot(
        &self,
        snapshot_id: &str,
        manifest: &str,
        metric_field: Option<&str>,
    ) -> Result<EntitySnapshot>;
}
