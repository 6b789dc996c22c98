use ratatui::{
    layout::{Constraint, Layout},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::dialog::DialogWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::drive::store;
use crate::theme::ThemeColors;

/// Render the application UI.
pub fn render(app: &mut App, theme: &ThemeColors, use_icons: bool, frame: &mut Frame) {
    let [tree_area, status_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());

    // Update scroll offset to keep selected item visible
    let visible_height = tree_area.height.saturating_sub(2) as usize; // account for border
    app.update_scroll(visible_height);

    let block = Block::default()
        .title(" Cloud Drive ")
        .borders(Borders::ALL)
        .border_style(ratatui::style::Style::default().fg(theme.border_fg));

    let tree_widget = TreeWidget::new(app, theme, use_icons).block(block);
    frame.render_widget(tree_widget, tree_area);

    let path_str = store::join_path(&app.current_folder_path());
    let clipboard_label = app.store.clipboard().label();
    let mut status_bar = StatusBarWidget::new(&path_str, theme).syncing(app.syncs_in_flight > 0);
    if let Some((msg, is_error, _)) = &app.status_message {
        status_bar = status_bar.status_message(msg, *is_error);
    }
    if let Some(label) = &clipboard_label {
        status_bar = status_bar.clipboard_info(label);
    }
    frame.render_widget(status_bar, status_area);

    // Dialog overlay on top of everything
    let dialog = DialogWidget::new(&app.mode, &app.dialog_state);
    frame.render_widget(dialog, frame.area());
}
