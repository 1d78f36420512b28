//! Builds the list page for one render pass.

pub mod text;

use crate::data_source::DataSourceState;
use crate::models::view_models::{ReadyView, ServerListView, TagSwitch, Toolbar};
use crate::pipeline::stages::StatusFilter;
use crate::pipeline::{self, PipelineInputs};
use crate::view_state::store::{LayoutMode, ViewState};

/// Signals owned by the host rather than by the view-state store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSignals {
    pub status: StatusFilter,
    pub network_view: bool,
    /// Feature flag for the tag selector control.
    pub show_tag: bool,
}

/// Error first, then loading, then the full pipeline over the freshest data.
pub fn compose(source: &DataSourceState, view: &ViewState, signals: ListSignals) -> ServerListView {
    match source {
        DataSourceState::Failed(e) => ServerListView::Error {
            message: e.to_string(),
            hint: t!("server_list.error_message").to_string(),
        },
        DataSourceState::Loading => ServerListView::Loading {
            message: t!("server_list.connecting").to_string(),
        },
        DataSourceState::Ready {
            servers,
            updated_at,
        } => {
            let output = pipeline::run(
                servers,
                PipelineInputs {
                    status: signals.status,
                    tag: &view.selected_tag,
                    network_view: signals.network_view,
                },
            );
            let tag_switch = signals.show_tag.then(|| TagSwitch {
                tags: output.tags.tags,
                selected: view.selected_tag.clone(),
                counts: output.tags.counts,
            });

            ServerListView::Ready(ReadyView {
                toolbar: Toolbar {
                    map_active: view.map_visible,
                    inline_active: view.layout == LayoutMode::Inline,
                    tag_switch,
                },
                map_visible: view.map_visible,
                layout: view.layout,
                servers: output.servers,
                updated_at: *updated_at,
            })
        }
    }
}
