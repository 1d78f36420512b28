use std::fmt::Write;

use crate::models::server_record::ServerRecord;
use crate::models::view_models::{ReadyView, ServerListView, TagSwitch, Toolbar};
use crate::pipeline::tags::TagSelection;
use crate::view_state::scroll::ListViewport;
use crate::view_state::store::LayoutMode;

const CARD_WIDTH: usize = 40;

/// Terminal rendition of a [`ServerListView`], windowed by `viewport`.
pub fn render(view: &ServerListView, viewport: &ListViewport) -> String {
    match view {
        ServerListView::Loading { message } => format!("⟳ {message}...\n"),
        ServerListView::Error { message, hint } => format!("✗ {message}\n  {hint}\n"),
        ServerListView::Ready(ready) => render_ready(ready, viewport),
    }
}

fn render_ready(ready: &ReadyView, viewport: &ListViewport) -> String {
    let mut out = String::new();
    out.push_str(&render_toolbar(&ready.toolbar));
    out.push('\n');

    if ready.map_visible {
        let _ = writeln!(out, "┌─ {} ─┐", t!("server_list.map_placeholder"));
    }

    if ready.servers.is_empty() {
        let _ = writeln!(out, "  {}", t!("server_list.empty"));
        return out;
    }

    let range = viewport.visible_range(ready.servers.len());
    let visible = &ready.servers[range.clone()];
    match ready.layout {
        LayoutMode::Inline => {
            for server in visible {
                let _ = writeln!(out, "{}", inline_row(server));
            }
        }
        LayoutMode::Grid => {
            for pair in visible.chunks(2) {
                let left = format!("{:<width$}", card(&pair[0]), width = CARD_WIDTH);
                match pair.get(1) {
                    Some(right) => {
                        let _ = writeln!(out, "{left} {}", card(right));
                    }
                    None => {
                        let _ = writeln!(out, "{}", left.trim_end());
                    }
                }
            }
        }
    }

    let from = range.start + 1;
    let to = range.end;
    let total = ready.servers.len();
    let time = ready.updated_at.format("%H:%M:%S").to_string();
    let _ = writeln!(
        out,
        "{} · {}",
        t!("server_list.showing", from = from, to = to, total = total),
        t!("server_list.updated_at", time = time)
    );
    out
}

fn render_toolbar(toolbar: &Toolbar) -> String {
    let mut line = format!(
        "[{} {}] [{} {}]",
        t!("server_list.map"),
        switch_mark(toolbar.map_active),
        t!("server_list.inline"),
        switch_mark(toolbar.inline_active),
    );
    if let Some(switch) = &toolbar.tag_switch {
        line.push_str("  ");
        line.push_str(&render_tag_switch(switch));
    }
    line
}

fn render_tag_switch(switch: &TagSwitch) -> String {
    switch
        .tags
        .iter()
        .map(|tag| {
            let label = match tag {
                TagSelection::All => t!("server_list.all_tags").to_string(),
                TagSelection::Tag(name) => {
                    format!("{name} ({})", switch.counts.get(name).copied().unwrap_or(0))
                }
            };
            if *tag == switch.selected {
                format!("*{label}*")
            } else {
                label
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn switch_mark(active: bool) -> &'static str {
    if active { "on" } else { "off" }
}

fn card(server: &ServerRecord) -> String {
    let tag = server
        .tag
        .as_deref()
        .map(|t| format!(" [{t}]"))
        .unwrap_or_default();
    if server.online {
        format!(
            "● {}{tag} ↓{} ↑{}",
            server.name,
            format_speed(server.net_in_speed),
            format_speed(server.net_out_speed)
        )
    } else {
        format!("○ {}{tag} {}", server.name, t!("server_list.offline"))
    }
}

fn inline_row(server: &ServerRecord) -> String {
    let status = if server.online { "●" } else { "○" };
    let traffic = if server.online {
        format!(
            "↓{:>9} ↑{:>9}",
            format_speed(server.net_in_speed),
            format_speed(server.net_out_speed)
        )
    } else {
        t!("server_list.offline").to_string()
    };
    format!(
        "{status} {:<6} {:<24} {:<12} {traffic}",
        server.id,
        server.name,
        server.tag.as_deref().unwrap_or("-"),
    )
}

/// Formats a bytes-per-second figure with a binary unit suffix.
pub fn format_speed(bytes_per_sec: f64) -> String {
    const UNITS: [&str; 5] = ["B/s", "K/s", "M/s", "G/s", "T/s"];
    let mut value = bytes_per_sec.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0}{}", UNITS[unit])
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;

    fn ready_view(layout: LayoutMode, servers: Vec<ServerRecord>) -> ServerListView {
        ServerListView::Ready(ReadyView {
            toolbar: Toolbar {
                map_active: false,
                inline_active: layout == LayoutMode::Inline,
                tag_switch: None,
            },
            map_visible: false,
            layout,
            servers,
            updated_at: Utc::now(),
        })
    }

    fn servers(n: u64) -> Vec<ServerRecord> {
        (1..=n)
            .map(|id| ServerRecord::new(id, format!("node-{id}")).with_online(id % 2 == 0))
            .collect()
    }

    #[test]
    fn test_format_speed_units() {
        assert_eq!(format_speed(0.0), "0B/s");
        assert_eq!(format_speed(512.0), "512B/s");
        assert_eq!(format_speed(1536.0), "1.5K/s");
        assert_eq!(format_speed(3.0 * 1024.0 * 1024.0), "3.0M/s");
        assert_eq!(format_speed(-5.0), "0B/s");
    }

    #[test]
    fn test_loading_and_error_text() {
        let viewport = ListViewport::new(10);
        let loading = ServerListView::Loading {
            message: "Connecting".into(),
        };
        assert_eq!(render(&loading, &viewport), "⟳ Connecting...\n");

        let error = ServerListView::Error {
            message: "boom".into(),
            hint: "check it".into(),
        };
        let text = render(&error, &viewport);
        assert!(text.contains("boom"));
        assert!(text.contains("check it"));
    }

    #[test]
    fn test_inline_layout_one_row_per_server() {
        let viewport = ListViewport::new(10);
        let text = render(&ready_view(LayoutMode::Inline, servers(3)), &viewport);
        let rows: Vec<&str> = text.lines().filter(|l| l.contains("node-")).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with('○'));
        assert!(rows[1].starts_with('●'));
    }

    #[test]
    fn test_grid_layout_two_cards_per_row() {
        let viewport = ListViewport::new(10);
        let text = render(&ready_view(LayoutMode::Grid, servers(3)), &viewport);
        let rows: Vec<&str> = text.lines().filter(|l| l.contains("node-")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("node-1") && rows[0].contains("node-2"));
        assert!(rows[1].contains("node-3"));
    }

    #[test]
    fn test_viewport_windows_the_list() {
        let mut viewport = ListViewport::new(2);
        viewport.scroll_down(3);
        let text = render(&ready_view(LayoutMode::Inline, servers(6)), &viewport);
        assert!(text.contains("node-4"));
        assert!(text.contains("node-5"));
        assert!(!text.contains("node-3"));
        assert!(!text.contains("node-6"));
    }

    #[test]
    fn test_tag_switch_marks_selection() {
        let switch = TagSwitch {
            tags: vec![TagSelection::All, TagSelection::Tag("web".into())],
            selected: TagSelection::Tag("web".into()),
            counts: HashMap::from([("web".to_string(), 4)]),
        };
        let line = render_tag_switch(&switch);
        assert!(line.ends_with("*web (4)*"));
        assert!(!line.starts_with('*'));
    }
}
