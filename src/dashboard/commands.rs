use std::str::FromStr;

use crate::error::DashboardError;
use crate::pipeline::stages::StatusFilter;
use crate::pipeline::tags::TagSelection;

/// One viewer action read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    SelectTag(TagSelection),
    SetStatus(StatusFilter),
    ToggleNetwork,
    ToggleLayout,
    ToggleMap,
    /// `None` scrolls by one page.
    ScrollDown(Option<usize>),
    ScrollUp(Option<usize>),
    /// Backward navigation in the hosting environment.
    Back,
    /// Re-mount the page from persisted state.
    Reload,
    Refresh,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  tag [name]                  select a tag filter, no name shows all tags
  status <all|online|offline> filter by online status
  net                         toggle network view
  layout                      toggle grid/inline layout
  map                         toggle the map panel
  down [n] | up [n]           scroll the list
  back                        navigate back (restores scroll position)
  reload                      reload the page
  refresh                     fetch data now
  help | quit";

impl FromStr for ViewerCommand {
    type Err = DashboardError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match (verb, rest) {
            // An empty name and the stored sentinel both clear the filter, so
            // any real tag name stays selectable.
            ("tag", name) => ViewerCommand::SelectTag(TagSelection::from_persisted(Some(name))),
            ("status", value) => ViewerCommand::SetStatus(value.parse()?),
            ("net", "") => ViewerCommand::ToggleNetwork,
            ("layout", "") => ViewerCommand::ToggleLayout,
            ("map", "") => ViewerCommand::ToggleMap,
            ("down", amount) => ViewerCommand::ScrollDown(parse_amount(amount)?),
            ("up", amount) => ViewerCommand::ScrollUp(parse_amount(amount)?),
            ("back", "") => ViewerCommand::Back,
            ("reload", "") => ViewerCommand::Reload,
            ("refresh", "") => ViewerCommand::Refresh,
            ("help", "") | ("?", "") => ViewerCommand::Help,
            ("quit", "") | ("q", "") | ("exit", "") => ViewerCommand::Quit,
            _ => return Err(DashboardError::InvalidCommand(line.to_string())),
        };
        Ok(command)
    }
}

fn parse_amount(raw: &str) -> Result<Option<usize>, DashboardError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<usize>()
        .map(Some)
        .map_err(|_| DashboardError::InvalidCommand(format!("not a row count: {raw}")))
}
