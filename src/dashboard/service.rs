use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dashboard::commands::{HELP, ViewerCommand};
use crate::dashboard::config::DashboardConfig;
use crate::data_source::snapshot_poller::SnapshotPoller;
use crate::data_source::{DataSourceState, Refresh, RefreshTracker};
use crate::error::DashboardError;
use crate::models::view_models::ServerListView;
use crate::pipeline::stages::StatusFilter;
use crate::render::{self, ListSignals};
use crate::view_state::scroll::{ListViewport, ScrollContainer};
use crate::view_state::storage::ScopedStorage;
use crate::view_state::store::ViewStateStore;

/// What the host should do after a command was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEffect {
    Render,
    Print(String),
    RequestRefresh,
    Quit,
}

/// The list page: data state, view state, host signals and the list container.
pub struct DashboardService {
    storage: ScopedStorage,
    store: ViewStateStore,
    tracker: RefreshTracker,
    signals: ListSignals,
    page_size: usize,
    /// Exists only while the list itself is on screen.
    viewport: Option<ListViewport>,
}

impl DashboardService {
    pub fn new(config: &DashboardConfig, storage: ScopedStorage) -> Self {
        let store = ViewStateStore::mount(storage.clone(), None);
        Self {
            storage,
            store,
            tracker: RefreshTracker::new(),
            signals: ListSignals {
                status: StatusFilter::All,
                network_view: false,
                show_tag: config.show_tag,
            },
            page_size: config.page_size,
            viewport: None,
        }
    }

    pub fn store(&self) -> &ViewStateStore {
        &self.store
    }

    pub fn signals(&self) -> ListSignals {
        self.signals
    }

    pub fn viewport(&self) -> Option<&ListViewport> {
        self.viewport.as_ref()
    }

    /// Returns `true` when the refresh was applied and the page should re-render.
    pub fn handle_refresh(&mut self, refresh: Refresh) -> bool {
        let was_ready = self.is_ready();
        if !self.tracker.apply(refresh) {
            return false;
        }
        match (was_ready, self.is_ready()) {
            (false, true) => self.mount_container(),
            (true, false) => {
                debug!("List left the screen, dropping its container.");
                self.viewport = None;
            }
            _ => {}
        }
        true
    }

    pub fn handle_command(&mut self, command: ViewerCommand) -> Result<CommandEffect, DashboardError> {
        debug!(command = ?command, "Handling viewer command.");
        match command {
            ViewerCommand::SelectTag(tag) => {
                if !self.signals.show_tag {
                    return Err(DashboardError::InvalidCommand(
                        "the tag selector is disabled".to_string(),
                    ));
                }
                let container = self.viewport.as_ref().map(|v| v as &dyn ScrollContainer);
                self.store.set_tag(tag, container);
            }
            ViewerCommand::SetStatus(status) => self.signals.status = status,
            ViewerCommand::ToggleNetwork => self.signals.network_view = !self.signals.network_view,
            ViewerCommand::ToggleLayout => {
                self.store.toggle_layout_mode();
                // The other layout is a different container.
                if self.viewport.is_some() {
                    self.mount_container();
                }
            }
            ViewerCommand::ToggleMap => {
                self.store.toggle_map();
            }
            ViewerCommand::ScrollDown(rows) => {
                if let Some(viewport) = self.viewport.as_mut() {
                    let rows = rows.unwrap_or(viewport.page_size());
                    viewport.scroll_down(rows);
                }
            }
            ViewerCommand::ScrollUp(rows) => {
                if let Some(viewport) = self.viewport.as_mut() {
                    let rows = rows.unwrap_or(viewport.page_size());
                    viewport.scroll_up(rows);
                }
            }
            ViewerCommand::Back => {
                let container = self.viewport.as_mut().map(|v| v as &mut dyn ScrollContainer);
                self.store.restore_scroll_position(container);
            }
            ViewerCommand::Reload => self.reload(),
            ViewerCommand::Refresh => return Ok(CommandEffect::RequestRefresh),
            ViewerCommand::Help => return Ok(CommandEffect::Print(HELP.to_string())),
            ViewerCommand::Quit => return Ok(CommandEffect::Quit),
        }
        Ok(CommandEffect::Render)
    }

    pub fn view(&self) -> ServerListView {
        render::compose(self.tracker.state(), self.store.state(), self.signals)
    }

    pub fn render_text(&self) -> String {
        let fallback;
        let viewport = match &self.viewport {
            Some(viewport) => viewport,
            None => {
                fallback = ListViewport::new(self.page_size);
                &fallback
            }
        };
        render::text::render(&self.view(), viewport)
    }

    fn is_ready(&self) -> bool {
        matches!(self.tracker.state(), DataSourceState::Ready { .. })
    }

    fn mount_container(&mut self) {
        let mut viewport = ListViewport::new(self.page_size);
        self.store.restore_scroll_position(Some(&mut viewport));
        self.viewport = Some(viewport);
    }

    /// A page reload: transient state and host signals reset, persisted
    /// scopes are read again.
    fn reload(&mut self) {
        info!("Reloading list page.");
        self.signals.status = StatusFilter::All;
        self.signals.network_view = false;
        self.viewport = None;
        self.store = ViewStateStore::mount(self.storage.clone(), None);
        if self.is_ready() {
            self.mount_container();
        }
    }
}

/// Runs the terminal host until `quit`, end of input, or ctrl-c.
pub async fn run(config: DashboardConfig, storage: ScopedStorage) -> Result<(), DashboardError> {
    let mut service = DashboardService::new(&config, storage);

    let (refresh_tx, mut refresh_rx) = mpsc::channel::<Refresh>(32);
    let poller = SnapshotPoller::new(config.snapshot_path.clone(), config.refresh_interval());
    let (poller_handle, refresh_trigger) = poller.spawn(refresh_tx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    write_view(&mut stdout, &service).await?;

    loop {
        tokio::select! {
            Some(refresh) = refresh_rx.recv() => {
                if service.handle_refresh(refresh) {
                    write_view(&mut stdout, &service).await?;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed, shutting down.");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let effect = line
                    .parse::<ViewerCommand>()
                    .and_then(|command| service.handle_command(command));
                match effect {
                    Ok(CommandEffect::Render) => write_view(&mut stdout, &service).await?,
                    Ok(CommandEffect::Print(text)) => write_line(&mut stdout, &text).await?,
                    Ok(CommandEffect::RequestRefresh) => {
                        if refresh_trigger.send(()).await.is_err() {
                            warn!("Snapshot poller is gone, refresh request dropped.");
                        }
                    }
                    Ok(CommandEffect::Quit) => break,
                    Err(e) => {
                        warn!(error = %e, "Rejected viewer command.");
                        write_line(&mut stdout, &format!("! {e}")).await?;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received ctrl-c, shutting down.");
                break;
            }
        }
    }

    poller_handle.abort();
    Ok(())
}

async fn write_view<W>(out: &mut W, service: &DashboardService) -> Result<(), DashboardError>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = String::from("\n");
    frame.push_str(&service.render_text());
    out.write_all(frame.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

async fn write_line<W>(out: &mut W, text: &str) -> Result<(), DashboardError>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(format!("{text}\n").as_bytes()).await?;
    out.flush().await?;
    Ok(())
}
