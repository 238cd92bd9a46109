use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named per-tick series collected between two checkpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// First tick covered, inclusive.
    pub from_tick: u64,
    /// Last tick covered, inclusive.
    pub to_tick: u64,
    pub series: BTreeMap<String, Vec<f64>>,
}

impl Checkpoint {
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn total(&self, name: &str) -> f64 {
        self.get(name).map(|s| s.iter().sum()).unwrap_or(0.0)
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
