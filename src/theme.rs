//! Theme data model: built-in palettes and resolution from config.

use ratatui::style::Color;

use crate::config::AppConfig;

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_folder_fg: Color,
    pub tree_file_fg: Color,
    pub tree_cut_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & dialogs
    pub border_fg: Color,
    pub dialog_border_fg: Color,

    // Semantic colors (consistent across themes)
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub dim_fg: Color,
}

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        tree_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        tree_folder_fg: Color::Rgb(137, 180, 250),   // #89b4fa (blue)
        tree_file_fg: Color::Rgb(205, 214, 244),     // #cdd6f4
        tree_cut_fg: Color::Rgb(108, 112, 134),      // #6c7086 (overlay0)

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112), // #585b70 (surface2)
        dialog_border_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        success_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        info_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        dim_fg: Color::Rgb(108, 112, 134),     // #6c7086
    }
}

/// Light theme — complementary light palette (Catppuccin Latte).
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(76, 79, 105),             // #4c4f69 (text)
        tree_selected_bg: Color::Rgb(204, 208, 218),  // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),    // #4c4f69
        tree_folder_fg: Color::Rgb(30, 102, 245),     // #1e66f5 (blue)
        tree_file_fg: Color::Rgb(76, 79, 105),        // #4c4f69
        tree_cut_fg: Color::Rgb(156, 160, 176),       // #9ca0b0 (overlay0)

        status_bg: Color::Rgb(230, 233, 239), // #e6e9ef (mantle)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        dialog_border_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),    // #d20f39 (red)
        warning_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        success_fg: Color::Rgb(64, 160, 43),  // #40a02b (green)
        info_fg: Color::Rgb(30, 102, 245),    // #1e66f5 (blue)
        dim_fg: Color::Rgb(156, 160, 176),    // #9ca0b0
    }
}

/// Resolve the runtime theme from config.
pub fn resolve_theme(config: &AppConfig) -> ThemeColors {
    match config.theme_scheme() {
        "light" => light_theme(),
        _ => dark_theme(),
    }
}
