use std::collections::BTreeMap;

use govindex_engine::{EventLike, Reducer};
use govindex_world::GovernorLog;

/// Per-kind event counts for one run.
#[derive(Debug, Default)]
pub struct IndexStats {
    pub by_type: BTreeMap<&'static str, u64>,
    pub last_block: Option<u64>,
}

impl IndexStats {
    pub fn count(&self, event_type: &str) -> u64 {
        self.by_type.get(event_type).copied().unwrap_or(0)
    }
}

pub struct StatsReducer;

impl Reducer<GovernorLog, IndexStats> for StatsReducer {
    fn reduce(&self, state: &mut IndexStats, event: &GovernorLog) {
        *state.by_type.entry(event.event_type_str()).or_insert(0) += 1;
        state.last_block = Some(event.block_number);
    }
}
