use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::models::server_record::{OnlineState, ServerRecord};

/// The status selector supplied by the status tabs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Online,
    Offline,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Online => "online",
            StatusFilter::Offline => "offline",
        }
    }

    pub fn admits(&self, state: OnlineState) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Online => state == OnlineState::Online,
            StatusFilter::Offline => state == OnlineState::Offline,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "online" => Ok(StatusFilter::Online),
            "offline" => Ok(StatusFilter::Offline),
            other => Err(DashboardError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orders by descending `display_index`, then ascending `id`.
pub fn sort_by_display_index(records: &[ServerRecord]) -> Vec<ServerRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        b.display_index
            .cmp(&a.display_index)
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted
}

/// Keeps records whose derived state matches `status`. Order is preserved.
pub fn filter_by_status(records: &[ServerRecord], status: StatusFilter) -> Vec<ServerRecord> {
    if status == StatusFilter::All {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| status.admits(record.state()))
        .cloned()
        .collect()
}

/// Online records first, busiest first; offline records keep their incoming order.
pub fn sort_by_network(records: &[ServerRecord]) -> Vec<ServerRecord> {
    let mut sorted = records.to_vec();
    // `sort_by` is stable, which keeps the offline bucket deterministic.
    sorted.sort_by(network_order);
    sorted
}

fn network_order(a: &ServerRecord, b: &ServerRecord) -> Ordering {
    match (a.online, b.online) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (true, true) => b.net_total().total_cmp(&a.net_total()),
    }
}
