use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Online state derived from a record's `online_status` signal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OnlineState {
    Online,
    Offline,
}

/// Live throughput as reported by the data source. Both fields may be missing
/// for machines that never reported.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawServerStatus {
    #[serde(rename = "NetInSpeed", default)]
    pub net_in_speed: Option<f64>,
    #[serde(rename = "NetOutSpeed", default)]
    pub net_out_speed: Option<f64>,
}

/// A server record exactly as it arrives on the wire.
#[derive(Deserialize, Debug, Clone)]
pub struct RawServerRecord {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_index: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub online_status: bool,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub status: Option<RawServerStatus>,
}

/// One snapshot from the data source: `{ "result": [...] }`.
/// A missing or null `result` means the data is not available yet.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ServerListSnapshot {
    #[serde(default)]
    pub result: Option<Vec<RawServerRecord>>,
}

impl ServerListSnapshot {
    /// Normalizes every raw record. Records repeating an already seen `id`
    /// are dropped so the working set keeps unique identities.
    pub fn into_records(self) -> Option<Vec<ServerRecord>> {
        let raw = self.result?;
        let mut seen = HashSet::with_capacity(raw.len());
        let mut records = Vec::with_capacity(raw.len());
        for item in raw {
            if !seen.insert(item.id) {
                warn!(server_id = item.id, "Duplicate server id in snapshot, keeping first occurrence.");
                continue;
            }
            records.push(ServerRecord::from(item));
        }
        Some(records)
    }
}

/// A server record with every defaulting rule already applied.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub id: u64,
    pub name: String,
    pub display_index: i64,
    pub online: bool,
    pub tag: Option<String>,
    pub net_in_speed: f64,
    pub net_out_speed: f64,
}

impl ServerRecord {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            display_index: 0,
            online: false,
            tag: None,
            net_in_speed: 0.0,
            net_out_speed: 0.0,
        }
    }

    pub fn with_display_index(mut self, display_index: i64) -> Self {
        self.display_index = display_index;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = normalize_tag(Some(tag.into()));
        self
    }

    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn with_net_speeds(mut self, net_in: f64, net_out: f64) -> Self {
        self.net_in_speed = net_in;
        self.net_out_speed = net_out;
        self
    }

    pub fn state(&self) -> OnlineState {
        if self.online {
            OnlineState::Online
        } else {
            OnlineState::Offline
        }
    }

    /// Combined inbound and outbound throughput.
    pub fn net_total(&self) -> f64 {
        self.net_in_speed + self.net_out_speed
    }
}

impl From<RawServerRecord> for ServerRecord {
    fn from(raw: RawServerRecord) -> Self {
        let status = raw.status.unwrap_or_default();
        Self {
            id: raw.id,
            name: raw
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("#{}", raw.id)),
            display_index: raw.display_index.unwrap_or(0),
            online: raw.online_status,
            tag: normalize_tag(raw.tag),
            net_in_speed: status.net_in_speed.unwrap_or(0.0),
            net_out_speed: status.net_out_speed.unwrap_or(0.0),
        }
    }
}

fn normalize_tag(tag: Option<String>) -> Option<String> {
    tag.filter(|t| !t.is_empty())
}

/// Accepts the loose "online" signal some agents send: booleans, numbers or strings.
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}
