//! The three display panes.

use std::fmt;

use chrono::{DateTime, Local};

use crate::reflector::{DeviceInfo, HeaderTable};
use crate::viewer::session::ViewState;

/// One of the independent display regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    RequestHeaders,
    DeviceInfo,
    ResponseHeaders,
}

impl Pane {
    pub const ALL: [Pane; 3] = [Pane::RequestHeaders, Pane::DeviceInfo, Pane::ResponseHeaders];

    pub fn title(&self) -> &'static str {
        match self {
            Pane::RequestHeaders => "Request Headers",
            Pane::DeviceInfo => "Device Information",
            Pane::ResponseHeaders => "Response Headers",
        }
    }

    fn placeholders(&self) -> usize {
        match self {
            Pane::RequestHeaders => 8,
            Pane::DeviceInfo | Pane::ResponseHeaders => 6,
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Pane::RequestHeaders => "Failed to load headers",
            Pane::DeviceInfo => "Failed to load device info",
            Pane::ResponseHeaders => "Failed to load response headers",
        }
    }

    fn empty_message(&self) -> &'static str {
        match self {
            Pane::RequestHeaders => "No request headers available",
            Pane::DeviceInfo => "No device information available",
            Pane::ResponseHeaders => "No response headers available",
        }
    }

    /// Decide what this pane shows for a view state.
    pub fn view(&self, state: &ViewState) -> PaneView {
        if state.is_loading() {
            return PaneView::Loading {
                placeholders: self.placeholders(),
            };
        }
        if let Some(detail) = &state.error {
            return PaneView::Failed {
                message: self.failure_message(),
                detail: detail.clone(),
            };
        }

        let rows = state.data.as_ref().and_then(|payload| match self {
            Pane::RequestHeaders => table_rows(&payload.request_headers),
            Pane::ResponseHeaders => table_rows(&payload.response_headers),
            Pane::DeviceInfo => payload.device_info.as_ref().map(device_rows),
        });

        match rows {
            Some(rows) => PaneView::Rows(rows),
            None => PaneView::Empty(self.empty_message()),
        }
    }
}

fn table_rows(table: &HeaderTable) -> Option<Vec<(String, String)>> {
    if table.is_empty() {
        return None;
    }
    Some(table.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn device_rows(info: &DeviceInfo) -> Vec<(String, String)> {
    vec![
        ("IP Address".into(), info.ip.clone()),
        ("Method".into(), info.method.clone()),
        ("Protocol".into(), info.protocol.clone()),
        ("HTTP Version".into(), info.http_version.clone()),
        ("Timestamp".into(), local_time(&info.timestamp)),
        ("User Agent".into(), info.user_agent.clone()),
    ]
}

/// The timestamp in local time, or verbatim when it does not parse.
fn local_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(instant) => instant
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// Rendered content of one pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneView {
    /// Skeleton rows while nothing has arrived.
    Loading { placeholders: usize },
    /// The last fetch failed.
    Failed { message: &'static str, detail: String },
    /// Data arrived but this pane has nothing to show.
    Empty(&'static str),
    /// Key/value rows in payload order.
    Rows(Vec<(String, String)>),
}

const SKELETON: &str = "░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░";

impl fmt::Display for PaneView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaneView::Loading { placeholders } => {
                for _ in 0..*placeholders {
                    writeln!(f, "  {SKELETON}")?;
                }
                Ok(())
            }
            PaneView::Failed { message, detail } => {
                writeln!(f, "  {message}")?;
                writeln!(f, "  {detail}")
            }
            PaneView::Empty(message) => writeln!(f, "  {message}"),
            // Values are written whole; the terminal wraps long lines.
            PaneView::Rows(rows) => {
                for (key, value) in rows {
                    writeln!(f, "  {key}: {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Render the selected panes, each under its title.
pub fn render_panes(state: &ViewState, panes: &[Pane]) -> String {
    let mut out = String::new();
    for pane in panes {
        out.push_str(&format!("== {} ==\n{}\n", pane.title(), pane.view(state)));
    }
    out
}
