use serde::{Deserialize, Serialize};

/// accounting of every row of the source table, reported alongside the
/// risk report so data quality can be audited downstream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordAudit {
    /// rows in the source table
    pub total_rows: usize,
    /// rows excluded due to a null congestion indicator
    pub missing_congestion_indicator: usize,
    /// rows excluded because no weather scenario could be determined
    pub undeterminable_scenario: usize,
    /// rows assigned to a weather scenario
    pub assigned: usize,
}

impl RecordAudit {
    pub fn excluded(&self) -> usize {
        self.missing_congestion_indicator + self.undeterminable_scenario
    }
}
