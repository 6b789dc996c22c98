use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::{App, Row, RowKind};
use crate::theme::ThemeColors;

/// Tree widget that renders the drive hierarchy with box-drawing characters.
pub struct TreeWidget<'a> {
    app: &'a App,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(app: &'a App, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            app,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Build the prefix string for tree indentation using box-drawing characters.
    ///
    /// We need to know the ancestor chain to draw continuation lines correctly.
    fn build_prefix(row: &Row, rows: &[Row], row_index: usize) -> String {
        let mut parts: Vec<&str> = Vec::new();

        // For each ancestor level, determine if it's the last sibling at that
        // level by walking backwards through the visible rows.
        for d in 0..row.depth {
            let mut ancestor_is_last = false;
            for j in (0..row_index).rev() {
                if rows[j].depth == d {
                    ancestor_is_last = rows[j].is_last_sibling;
                    break;
                }
                if rows[j].depth < d {
                    break;
                }
            }
            if ancestor_is_last {
                parts.push("   ");
            } else {
                parts.push("│  ");
            }
        }

        // The connector for this row
        if row.is_last_sibling {
            parts.push("└──");
        } else {
            parts.push("├──");
        }

        parts.join("")
    }

    /// Get the folder/file indicator.
    fn row_indicator(&self, row: &Row) -> &'static str {
        if self.use_icons {
            match &row.kind {
                RowKind::Folder { expanded: true } => " ",
                RowKind::Folder { expanded: false } => " ",
                RowKind::File { entry } => Self::file_icon(&entry.name, &entry.file_type),
            }
        } else {
            match &row.kind {
                RowKind::Folder { .. } => "[D] ",
                RowKind::File { .. } => "[F] ",
            }
        }
    }

    /// Get a Nerd Font icon for a file from its stored type or extension.
    fn file_icon(name: &str, file_type: &str) -> &'static str {
        // The Telegram bot stores coarse categories for media it handled.
        match file_type {
            "photo" => return " ",
            "video" | "video_note" => return " ",
            "audio" | "voice" => return " ",
            "document" => return " ",
            _ => {}
        }
        let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "rs" => " ",
            "py" => " ",
            "js" | "jsx" => " ",
            "ts" | "tsx" => " ",
            "html" | "htm" => " ",
            "css" | "scss" | "sass" => " ",
            "json" => " ",
            "toml" | "yaml" | "yml" | "ini" | "cfg" => " ",
            "md" | "markdown" | "rst" | "txt" => " ",
            "sh" | "bash" | "zsh" | "fish" => " ",
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "svg" | "ico" | "webp" => " ",
            "mp3" | "wav" | "flac" | "ogg" | "aac" => " ",
            "mp4" | "mkv" | "avi" | "mov" | "webm" => " ",
            "zip" | "tar" | "gz" | "xz" | "bz2" | "rar" | "7z" => " ",
            "pdf" => " ",
            "doc" | "docx" | "odt" => " ",
            "sql" | "db" | "sqlite" => " ",
            _ => " ",
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let rows = &self.app.rows;
        let selected = self.app.selected_index;
        let visible_height = inner_area.height as usize;

        if visible_height == 0 {
            return;
        }

        if rows.is_empty() {
            let line = Line::from(Span::styled(
                "Drive is empty",
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        let scroll = self.app.scroll_offset;
        let visible_rows = rows.iter().enumerate().skip(scroll).take(visible_height);

        for (i, (idx, row)) in visible_rows.enumerate() {
            let y = inner_area.y + i as u16;
            if y >= inner_area.y + inner_area.height {
                break;
            }

            let prefix = Self::build_prefix(row, rows, idx);
            let indicator = self.row_indicator(row);

            let is_selected = idx == selected;
            let style = if is_selected {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else if row.is_cut {
                Style::default()
                    .fg(self.theme.tree_cut_fg)
                    .add_modifier(Modifier::DIM)
            } else {
                match row.kind {
                    RowKind::Folder { .. } => Style::default()
                        .fg(self.theme.tree_folder_fg)
                        .add_modifier(Modifier::BOLD),
                    RowKind::File { .. } => Style::default().fg(self.theme.tree_file_fg),
                }
            };

            let line_content = format!("{}{}{}", prefix, indicator, row.name);
            let span = Span::styled(line_content, style);
            let line = Line::from(span);

            let line_area = Rect::new(inner_area.x, y, inner_area.width, 1);
            buf.set_line(line_area.x, line_area.y, &line, line_area.width);
        }
    }
}
