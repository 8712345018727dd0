pub mod cache_file;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::OhlcvTimeSeries;

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct TimeSeriesCollection {
    pub name: String, // Metadata e.g. "Demo TimeSeries Collection".
    pub version: f64,
    pub series_data: Vec<OhlcvTimeSeries>,
}

impl TimeSeriesCollection {
    pub fn unique_pair_names(&self) -> Vec<String> {
        // BTreeSet maintains sorted order and ensures uniqueness
        self.series_data
            .iter()
            .map(|ts| ts.pair_interval.name().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
