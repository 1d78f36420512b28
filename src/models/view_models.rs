use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::server_record::ServerRecord;
use crate::pipeline::tags::TagSelection;
use crate::view_state::store::LayoutMode;

/// Everything the list page shows for one render pass.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServerListView {
    Loading { message: String },
    Error { message: String, hint: String },
    Ready(ReadyView),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadyView {
    pub toolbar: Toolbar,
    pub map_visible: bool,
    pub layout: LayoutMode,
    pub servers: Vec<ServerRecord>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Toolbar {
    pub map_active: bool,
    pub inline_active: bool,
    /// Absent when the tag selector is disabled.
    pub tag_switch: Option<TagSwitch>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagSwitch {
    pub tags: Vec<TagSelection>,
    pub selected: TagSelection,
    pub counts: HashMap<String, usize>,
}
