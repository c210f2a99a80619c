//! Table and JSON output for a finished [`PrStatus`].

use std::io::Write;

use anyhow::Result;
use tracker::{ChannelStatus, PrState, PrStatus, REPO_NAME, REPO_OWNER};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const PURPLE: &str = "\x1b[35m";
const GRAY: &str = "\x1b[90m";

const ICON_PRESENT: &str = "✓";
const ICON_NOT_PRESENT: &str = "✗";
const ICON_UNKNOWN: &str = "?";

// Nerd Font octicons.
const ICON_DRAFT: &str = "\u{f4dd}";
const ICON_PULL_REQUEST: &str = "\u{f407}";
const ICON_CLOSED: &str = "\u{f4dc}";

const CHANNEL_HEADER: &str = "CHANNEL";
const STATUS_HEADER: &str = "STATUS";

/// Writes reports to `writer`.
pub struct Renderer<W: Write> {
    writer: W,
    use_color: bool,
    use_hyperlinks: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(writer: W, use_color: bool, use_hyperlinks: bool) -> Self {
        Self {
            writer,
            use_color,
            use_hyperlinks,
        }
    }

    /// Writes the PR line followed by an aligned channel table.
    pub fn render_table(&mut self, status: &PrStatus) -> Result<()> {
        let title = self.pr_title(status);
        let icon = self.state_icon(status.state);
        writeln!(self.writer, "{icon} {title}")?;

        let width = status
            .channels
            .iter()
            .map(|c| c.name.as_str().chars().count())
            .chain(std::iter::once(CHANNEL_HEADER.len()))
            .max()
            .unwrap_or(CHANNEL_HEADER.len());

        writeln!(self.writer, "{CHANNEL_HEADER:<width$}  {STATUS_HEADER}")?;
        writeln!(self.writer, "{}", "-".repeat(width + 2 + STATUS_HEADER.len()))?;
        for channel in &status.channels {
            let icon = self.channel_icon(channel.status);
            writeln!(self.writer, "{:<width$}  {icon}", channel.name.as_str())?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes the report as pretty-printed JSON followed by a newline.
    pub fn render_json(&mut self, status: &PrStatus) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, status)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    fn pr_title(&self, status: &PrStatus) -> String {
        let text = format!("PR #{}", status.number);
        let text = self.paint(BOLD, &text);

        if self.use_hyperlinks {
            let url = format!(
                "https://github.com/{REPO_OWNER}/{REPO_NAME}/pull/{}",
                status.number
            );
            format!("\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\")
        } else {
            text
        }
    }

    fn state_icon(&self, state: PrState) -> String {
        match state {
            PrState::Draft => self.paint(GRAY, ICON_DRAFT),
            PrState::Open => self.paint(GREEN, ICON_PULL_REQUEST),
            PrState::Merged => self.paint(PURPLE, ICON_PULL_REQUEST),
            PrState::Closed => self.paint(RED, ICON_CLOSED),
        }
    }

    fn channel_icon(&self, status: ChannelStatus) -> String {
        match status {
            ChannelStatus::Present => self.paint(GREEN, ICON_PRESENT),
            ChannelStatus::NotPresent => self.paint(RED, ICON_NOT_PRESENT),
            ChannelStatus::Unknown => self.paint(YELLOW, ICON_UNKNOWN),
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}
