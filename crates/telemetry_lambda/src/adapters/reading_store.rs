use telemetry_core::contract::Reading;
use telemetry_core::window::SortKeyRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One partition query: exact device match plus an optional sort-key range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingQuery {
    pub device_id: String,
    pub window: Option<SortKeyRange>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

pub trait ReadingStore {
    fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<Reading>, String>;
}
