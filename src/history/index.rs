use crate::error::Result;
use crate::model::{ChangeEvent, MonthlySnapshotIndex};

/// Pick one snapshot per calendar month: the first event seen for that month.
///
/// Input is not re-sorted, so "first" means first in feed order. The feed must
/// be consistently ordered; GitHub lists commits newest first, which makes the
/// chosen snapshot the last revision of each month.
pub fn monthly_index(events: &[ChangeEvent]) -> Result<MonthlySnapshotIndex> {
    let mut index = MonthlySnapshotIndex::new();
    for event in events {
        index
            .entry(event.month()?)
            .or_insert_with(|| event.snapshot_id.clone());
    }
    Ok(index)
}
