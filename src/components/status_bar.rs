use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// Status bar widget that displays the current folder, clipboard and sync
/// state, key hints, or a transient status message.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    clipboard_info: Option<&'a str>,
    syncing: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            path_str,
            theme,
            status_message: None,
            is_error: false,
            clipboard_info: None,
            syncing: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn clipboard_info(mut self, info: &'a str) -> Self {
        self.clipboard_info = Some(info);
        self
    }

    pub fn syncing(mut self, syncing: bool) -> Self {
        self.syncing = syncing;
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };

            // Pad or truncate message to fill full width
            let display: String = if msg.chars().count() >= width {
                msg.chars().take(width).collect()
            } else {
                format!("{:<width$}", msg, width = width)
            };

            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // Normal bar: [path] [clipboard] [sync] ... [key hints]
        let key_hints = " n:new  r:ren  d:del  c:copy  x:cut  p:paste ";

        let mut left = format!(" /{}", self.path_str);
        if let Some(info) = self.clipboard_info {
            left.push_str("  [");
            left.push_str(info);
            left.push(']');
        }
        if self.syncing {
            left.push_str("  ~syncing");
        }

        let left_budget = width.saturating_sub(key_hints.len());
        let left_display: String = if left.chars().count() > left_budget {
            left.chars().take(left_budget).collect()
        } else {
            let gap = left_budget - left.chars().count();
            format!("{}{}", left, " ".repeat(gap))
        };

        let line = Line::from(vec![
            Span::styled(
                left_display,
                Style::default().bg(self.theme.status_bg).fg(self.theme.status_fg),
            ),
            Span::styled(
                key_hints,
                Style::default()
                    .bg(self.theme.status_bg)
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
