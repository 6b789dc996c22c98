use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState) -> Self {
        Self { mode, dialog_state }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let w = width.min(area.width);
        let h = height.min(area.height);
        Rect::new(x, y, w, h)
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let kind = match &self.mode {
            AppMode::Dialog(kind) => kind,
            _ => return,
        };

        match kind {
            DialogKind::CreateFolder { .. } => {
                render_input_dialog("New Folder", self.dialog_state, area, buf);
            }
            DialogKind::RenameFolder { .. } => {
                render_input_dialog("Rename Folder", self.dialog_state, area, buf);
            }
            DialogKind::RenameFile { .. } => {
                render_input_dialog("Rename File", self.dialog_state, area, buf);
            }
            DialogKind::ConfirmDeleteFile { name, .. } => {
                render_confirm_dialog("Delete File", name, area, buf);
            }
            DialogKind::ConfirmDeleteFolder { name, .. } => {
                render_confirm_dialog("Delete Folder", name, area, buf);
            }
            DialogKind::Error { message } => {
                render_error_dialog(message, area, buf);
            }
        }
    }
}

fn render_input_dialog(title: &str, state: &DialogState, area: Rect, buf: &mut Buffer) {
    let dialog_width = 50.min(area.width.saturating_sub(4));
    let dialog_height = 5;
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    // Render input line with cursor
    let input = &state.input;
    let cursor_pos = state.cursor_position;
    let max_width = inner.width as usize;

    let (before, cursor_char, after) = if cursor_pos < input.len() {
        let next = input[cursor_pos..]
            .chars()
            .next()
            .map(|c| c.len_utf8())
            .unwrap_or(1);
        (
            &input[..cursor_pos],
            &input[cursor_pos..cursor_pos + next],
            &input[cursor_pos + next..],
        )
    } else {
        (input.as_str(), " ", "")
    };

    // Truncate from left if input is too long
    let total_len = before.len() + 1 + after.len();
    let before_display = if total_len > max_width && before.len() > max_width.saturating_sub(2) {
        let mut skip = before.len().saturating_sub(max_width.saturating_sub(2));
        while skip < before.len() && !before.is_char_boundary(skip) {
            skip += 1;
        }
        &before[skip..]
    } else {
        before
    };

    let input_style = Style::default().fg(Color::White);
    let cursor_style = Style::default()
        .bg(Color::White)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD);

    let spans = vec![
        Span::styled(before_display, input_style),
        Span::styled(cursor_char, cursor_style),
        Span::styled(after, input_style),
    ];

    let line = Line::from(spans);
    buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);

    // Render hint at bottom
    let hint = "[Enter] Confirm  [Esc] Cancel";
    let hint_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM);
    let hint_line = Line::from(Span::styled(hint, hint_style));
    if inner.height > 1 {
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint_line, inner.width);
    }
}

fn render_confirm_dialog(title: &str, name: &str, area: Rect, buf: &mut Buffer) {
    let dialog_width = (name.len() as u16 + 14)
        .max(40)
        .min(area.width.saturating_sub(4));
    let dialog_height = 6;
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let header = Line::from(Span::styled(
        "Delete the following?",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));
    buf.set_line(inner.x, inner.y, &header, inner.width);

    let target_line = Line::from(Span::styled(
        format!("  • {}", name),
        Style::default().fg(Color::White),
    ));
    buf.set_line(inner.x, inner.y + 2, &target_line, inner.width);

    // Render hint at bottom
    let hint = "[y] Yes  [n/Esc] Cancel";
    let hint_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM);
    let hint_line = Line::from(Span::styled(hint, hint_style));
    buf.set_line(inner.x, inner.y + inner.height - 1, &hint_line, inner.width);
}

fn render_error_dialog(message: &str, area: Rect, buf: &mut Buffer) {
    let dialog_width = (message.chars().count() as u16 + 6)
        .max(30)
        .min(area.width.saturating_sub(4));
    let dialog_height = 5;
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let msg_line = Line::from(Span::styled(message, Style::default().fg(Color::Red)));
    buf.set_line(inner.x, inner.y + inner.height / 2, &msg_line, inner.width);

    let hint = "[Enter/Esc] Dismiss";
    let hint_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM);
    let hint_line = Line::from(Span::styled(hint, hint_style));
    if inner.height > 1 {
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint_line, inner.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_to_string(buf: &Buffer, area: Rect) -> String {
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn test_create_folder_dialog_renders() {
        let mode = AppMode::Dialog(DialogKind::CreateFolder { parent: vec![] });
        let state = DialogState {
            input: "new_folder".to_string(),
            cursor_position: 10,
        };
        let widget = DialogWidget::new(&mode, &state);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("New Folder"));
        assert!(content.contains("new_folder"));
    }

    #[test]
    fn test_rename_file_dialog_renders() {
        let mode = AppMode::Dialog(DialogKind::RenameFile {
            parent: vec!["docs".into()],
            file_id: "f1".into(),
            original: "notes.txt".into(),
        });
        let state = DialogState {
            input: "notes".to_string(),
            cursor_position: 5,
        };
        let widget = DialogWidget::new(&mode, &state);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Rename File"));
        assert!(content.contains("notes"));
    }

    #[test]
    fn test_confirm_dialog_renders_target() {
        let mode = AppMode::Dialog(DialogKind::ConfirmDeleteFolder {
            path: vec!["archive".into()],
            name: "archive".into(),
        });
        let state = DialogState::default();
        let widget = DialogWidget::new(&mode, &state);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Delete Folder"));
        assert!(content.contains("archive"));
        assert!(content.contains("[y] Yes"));
    }

    #[test]
    fn test_error_dialog_renders() {
        let mode = AppMode::Dialog(DialogKind::Error {
            message: "A folder named \"pics\" already exists here".to_string(),
        });
        let state = DialogState::default();
        let widget = DialogWidget::new(&mode, &state);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Error"));
        assert!(content.contains("already exists"));
    }

    #[test]
    fn test_normal_mode_is_noop() {
        let mode = AppMode::Normal;
        let state = DialogState::default();
        let widget = DialogWidget::new(&mode, &state);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.trim().is_empty());
    }
}
