use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::models::server_record::ServerRecord;

/// Persisted form of [`TagSelection::All`]. Older sessions stored this literal.
pub const DEFAULT_TAG: &str = "defaultTag";

/// The tag filter currently chosen by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TagSelection {
    /// No tag filter applied.
    #[default]
    All,
    Tag(String),
}

impl TagSelection {
    /// Reads a session-stored value. Absent and empty values fall back to `All`.
    pub fn from_persisted(value: Option<&str>) -> Self {
        match value {
            None | Some("") | Some(DEFAULT_TAG) => TagSelection::All,
            Some(tag) => TagSelection::Tag(tag.to_string()),
        }
    }

    pub fn as_persisted(&self) -> &str {
        match self {
            TagSelection::All => DEFAULT_TAG,
            TagSelection::Tag(tag) => tag,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, TagSelection::All)
    }

    pub fn matches(&self, record: &ServerRecord) -> bool {
        match self {
            TagSelection::All => true,
            TagSelection::Tag(tag) => record.tag.as_deref() == Some(tag.as_str()),
        }
    }
}

impl fmt::Display for TagSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_persisted())
    }
}

impl Serialize for TagSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_persisted())
    }
}

/// The tag universe of the status-filtered population.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    /// `All` first, then real tags in first-occurrence order.
    pub tags: Vec<TagSelection>,
    /// Per-tag membership. Untagged records are not counted.
    pub counts: HashMap<String, usize>,
}

pub fn aggregate_tags(records: &[ServerRecord]) -> TagSummary {
    let mut tags = vec![TagSelection::All];
    let mut counts: HashMap<String, usize> = HashMap::new();
    // A record literally tagged with the sentinel string would be unselectable.
    let real_tags = records
        .iter()
        .filter_map(|record| record.tag.as_deref())
        .filter(|tag| *tag != DEFAULT_TAG);
    for tag in real_tags {
        let count = counts.entry(tag.to_string()).or_insert(0);
        if *count == 0 {
            tags.push(TagSelection::Tag(tag.to_string()));
        }
        *count += 1;
    }
    TagSummary { tags, counts }
}

/// `All` passes through; a real tag keeps only exact matches.
pub fn filter_by_tag(records: &[ServerRecord], selection: &TagSelection) -> Vec<ServerRecord> {
    if selection.is_all() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| selection.matches(record))
        .cloned()
        .collect()
}
