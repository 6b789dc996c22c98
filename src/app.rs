use std::time::Instant;

use crate::drive::clipboard::ClipboardItem;
use crate::drive::record;
use crate::drive::store::DriveStore;
use crate::drive::tree::{FileEntry, FolderNode};

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    CreateFolder {
        parent: Vec<String>,
    },
    RenameFolder {
        path: Vec<String>,
    },
    RenameFile {
        parent: Vec<String>,
        file_id: String,
        original: String,
    },
    ConfirmDeleteFile {
        parent: Vec<String>,
        file_id: String,
        name: String,
    },
    ConfirmDeleteFolder {
        path: Vec<String>,
        name: String,
    },
    Error {
        message: String,
    },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
}

/// What a visible row represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Folder { expanded: bool },
    File { entry: FileEntry },
}

/// One visible line of the drive tree.
#[derive(Debug, Clone)]
pub struct Row {
    pub name: String,
    pub depth: usize,
    /// The folder's own path for folder rows; the parent folder path for
    /// file rows.
    pub path: Vec<String>,
    pub kind: RowKind,
    pub is_last_sibling: bool,
    /// The row is the current cut subject (rendered dimmed).
    pub is_cut: bool,
}

impl Row {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, RowKind::Folder { .. })
    }
}

/// Main application state: the drive store plus everything the terminal
/// session layers on top of it.
pub struct App {
    pub store: DriveStore,
    pub rows: Vec<Row>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub status_message: Option<(String, bool, Instant)>,
    pub should_quit: bool,
    pub folders_first: bool,
    /// Echoed back to the backend on every persist when present.
    pub last_message_id: Option<i64>,
    /// Monotonic id handed to each queued persist task.
    pub sync_generation: u64,
    /// Persist tasks still in flight.
    pub syncs_in_flight: usize,
}

impl App {
    pub fn new(store: DriveStore, folders_first: bool, last_message_id: Option<i64>) -> Self {
        let mut app = Self {
            store,
            rows: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            should_quit: false,
            folders_first,
            last_message_id,
            sync_generation: 0,
            syncs_in_flight: 0,
        };
        app.rebuild_rows();
        app
    }

    // ── Row list ────────────────────────────────────────────────────────

    /// Rebuild the visible row list from the tree: folders in map order,
    /// files alphabetically (display order only — storage keeps insertion
    /// order), descending into expanded folders.
    pub fn rebuild_rows(&mut self) {
        let mut rows = Vec::new();
        let mut path = Vec::new();
        collect_rows(
            self.store.root(),
            &self.store,
            self.folders_first,
            &mut path,
            0,
            &mut rows,
        );
        self.rows = rows;
        if !self.rows.is_empty() && self.selected_index >= self.rows.len() {
            self.selected_index = self.rows.len() - 1;
        }
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected_index)
    }

    /// The folder a contextual operation applies to: the selected folder
    /// itself, a file's parent, or the root when the drive is empty.
    pub fn current_folder_path(&self) -> Vec<String> {
        match self.selected_row() {
            Some(row) => row.path.clone(),
            None => Vec::new(),
        }
    }

    // ── Selection & scrolling ───────────────────────────────────────────

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        let len = self.rows.len();
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    /// Move selection up by one item.
    pub fn select_previous(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// Jump to the first item.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Jump to the last item.
    pub fn select_last(&mut self) {
        let len = self.rows.len();
        if len > 0 {
            self.selected_index = len - 1;
        }
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }

    /// Toggle expansion of the selected folder.
    pub fn toggle_selected_folder(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if !row.is_folder() {
            return;
        }
        let path = row.path.clone();
        self.store.toggle_expanded(&path);
        self.rebuild_rows();
    }

    /// Collapse the selected folder if it is expanded, otherwise jump to
    /// its parent row.
    pub fn collapse_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if let RowKind::Folder { expanded: true } = row.kind {
            let path = row.path.clone();
            self.store.collapse(&path);
            self.rebuild_rows();
            return;
        }
        // Jump to the parent folder row.
        let parent: Vec<String> = if row.is_folder() {
            row.path[..row.path.len().saturating_sub(1)].to_vec()
        } else {
            row.path.clone()
        };
        if parent.is_empty() {
            return;
        }
        if let Some(idx) = self
            .rows
            .iter()
            .position(|r| r.is_folder() && r.path == parent)
        {
            self.selected_index = idx;
        }
    }

    // ── Dialogs ─────────────────────────────────────────────────────────

    /// Open a dialog of the given kind, prefilling the input where the
    /// operation edits an existing name.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        match &kind {
            DialogKind::RenameFolder { path } => {
                if let Some(name) = path.last() {
                    self.dialog_state.input = name.clone();
                    self.dialog_state.cursor_position = self.dialog_state.input.len();
                }
            }
            DialogKind::RenameFile { original, .. } => {
                // The extension is preserved by the store; edit the base only.
                let base = record::base_of(original).to_string();
                self.dialog_state.cursor_position = base.len();
                self.dialog_state.input = base;
            }
            _ => {}
        }
        self.mode = AppMode::Dialog(kind);
    }

    /// Close the current dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        if self.dialog_state.cursor_position > 0 {
            let byte_pos = self.dialog_state.cursor_position;
            let prev_char = self.dialog_state.input[..byte_pos]
                .chars()
                .next_back()
                .expect("cursor > 0 guarantees at least one char");
            self.dialog_state.cursor_position -= prev_char.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    /// Move cursor left by one character.
    pub fn dialog_move_cursor_left(&mut self) {
        if self.dialog_state.cursor_position > 0 {
            let prev_char = self.dialog_state.input[..self.dialog_state.cursor_position]
                .chars()
                .next_back()
                .expect("cursor > 0 guarantees at least one char");
            self.dialog_state.cursor_position -= prev_char.len_utf8();
        }
    }

    /// Move cursor right by one character.
    pub fn dialog_move_cursor_right(&mut self) {
        if self.dialog_state.cursor_position < self.dialog_state.input.len() {
            let next_char = self.dialog_state.input[self.dialog_state.cursor_position..]
                .chars()
                .next()
                .expect("cursor < len guarantees at least one char");
            self.dialog_state.cursor_position += next_char.len_utf8();
        }
    }

    /// Move cursor to the beginning of the input.
    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    /// Move cursor to the end of the input.
    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── Status & sync bookkeeping ───────────────────────────────────────

    /// Set a status message with current timestamp.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), false, Instant::now()));
    }

    /// Set an error status message.
    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), true, Instant::now()));
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, _, ref created)) = self.status_message {
            if created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    /// Hand out the generation id for the next queued persist.
    pub fn next_sync_generation(&mut self) -> u64 {
        self.sync_generation += 1;
        self.syncs_in_flight += 1;
        self.sync_generation
    }

    /// Record a finished persist. Failures are a notification only — the
    /// in-memory mutation stands, and a later persist pushes the full state
    /// again anyway.
    pub fn on_sync_done(&mut self, _generation: u64, result: Result<(), String>) {
        self.syncs_in_flight = self.syncs_in_flight.saturating_sub(1);
        if let Err(err) = result {
            self.set_error(format!("Sync failed — changes not saved remotely ({})", err));
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn collect_rows(
    node: &FolderNode,
    store: &DriveStore,
    folders_first: bool,
    path: &mut Vec<String>,
    depth: usize,
    out: &mut Vec<Row>,
) {
    let folder_names: Vec<String> = node.folders.keys().cloned().collect();
    let mut file_entries: Vec<&FileEntry> = node.files.iter().collect();
    file_entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let folder_count = folder_names.len();
    let file_count = file_entries.len();
    let total = folder_count + file_count;

    if !folders_first {
        for (i, entry) in file_entries.iter().enumerate() {
            out.push(file_row(store, entry, depth, path, i + 1 == total));
        }
    }

    for (j, name) in folder_names.iter().enumerate() {
        let position = if folders_first { j + 1 } else { file_count + j + 1 };
        path.push(name.clone());
        let expanded = store.is_expanded(path);
        out.push(Row {
            name: name.clone(),
            depth,
            path: path.clone(),
            kind: RowKind::Folder { expanded },
            is_last_sibling: position == total,
            is_cut: is_cut_folder(store, path),
        });
        if expanded {
            let child = &node.folders[name];
            collect_rows(child, store, folders_first, path, depth + 1, out);
        }
        path.pop();
    }

    if folders_first {
        for (i, entry) in file_entries.iter().enumerate() {
            out.push(file_row(store, entry, depth, path, folder_count + i + 1 == total));
        }
    }
}

fn file_row(
    store: &DriveStore,
    entry: &FileEntry,
    depth: usize,
    parent: &[String],
    is_last_sibling: bool,
) -> Row {
    Row {
        name: entry.name.clone(),
        depth,
        path: parent.to_vec(),
        kind: RowKind::File {
            entry: entry.clone(),
        },
        is_last_sibling,
        is_cut: is_cut_file(store, entry),
    }
}

fn is_cut_file(store: &DriveStore, entry: &FileEntry) -> bool {
    matches!(
        store.clipboard().item(),
        Some(ClipboardItem::CutFile { entry: cut, .. }) if cut.file_id == entry.file_id
    )
}

fn is_cut_folder(store: &DriveStore, path: &[String]) -> bool {
    matches!(
        store.clipboard().item(),
        Some(ClipboardItem::CutFolder { source }) if source == path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::record::FileRecord;
    use crate::drive::tree::FileEntry;

    fn rec(id: &str, ty: &str, path: &str) -> FileRecord {
        FileRecord {
            file_id: id.into(),
            file_type: ty.into(),
            file_path: path.into(),
        }
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn setup_app() -> App {
        let store = DriveStore::from_records(
            &[
                rec("f1", "txt", "/docs/notes.txt"),
                rec("f2", "png", "/pics/sunset.png"),
                rec("f3", "txt", "/readme.txt"),
                rec("f4", "txt", "/alpha.txt"),
            ],
            false,
        );
        App::new(store, true, None)
    }

    #[test]
    fn rows_list_folders_then_files_alphabetically() {
        let app = setup_app();
        let names: Vec<&str> = app.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "pics", "alpha.txt", "readme.txt"]);
    }

    #[test]
    fn files_first_when_configured() {
        let store = DriveStore::from_records(
            &[rec("f1", "txt", "/z.txt"), rec("f2", "txt", "/docs/a.txt")],
            false,
        );
        let app = App::new(store, false, None);
        let names: Vec<&str> = app.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["z.txt", "docs"]);
    }

    #[test]
    fn expanding_folder_reveals_children() {
        let mut app = setup_app();
        assert_eq!(app.rows.len(), 4);
        app.selected_index = 0; // docs
        app.toggle_selected_folder();
        let names: Vec<&str> = app.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "notes.txt", "pics", "alpha.txt", "readme.txt"]);
        assert_eq!(app.rows[1].depth, 1);
        assert_eq!(app.rows[1].path, path(&["docs"]));
    }

    #[test]
    fn toggle_twice_collapses_again() {
        let mut app = setup_app();
        app.toggle_selected_folder();
        app.toggle_selected_folder();
        assert_eq!(app.rows.len(), 4);
    }

    #[test]
    fn last_sibling_flags() {
        let app = setup_app();
        assert!(!app.rows[0].is_last_sibling);
        assert!(app.rows[3].is_last_sibling);
    }

    #[test]
    fn selection_clamps_at_ends() {
        let mut app = setup_app();
        app.select_previous();
        assert_eq!(app.selected_index, 0);
        app.select_last();
        assert_eq!(app.selected_index, 3);
        app.select_next();
        assert_eq!(app.selected_index, 3);
        app.select_first();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn selection_clamped_after_rows_shrink() {
        let mut app = setup_app();
        app.select_last();
        app.store.delete_file(&path(&["docs"]), "f1").unwrap();
        app.store.delete_file(&[], "f3").unwrap();
        app.rebuild_rows();
        assert!(app.selected_index < app.rows.len());
    }

    #[test]
    fn current_folder_path_for_folder_and_file() {
        let mut app = setup_app();
        app.selected_index = 0; // docs folder
        assert_eq!(app.current_folder_path(), path(&["docs"]));
        app.selected_index = 2; // alpha.txt at root
        assert_eq!(app.current_folder_path(), Vec::<String>::new());
    }

    #[test]
    fn collapse_jumps_to_parent_for_files() {
        let mut app = setup_app();
        app.toggle_selected_folder(); // expand docs
        app.selected_index = 1; // notes.txt inside docs
        app.collapse_selected();
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.rows[0].name, "docs");
    }

    #[test]
    fn cut_file_row_is_marked() {
        let mut app = setup_app();
        let entry = FileEntry {
            name: "notes.txt".into(),
            file_id: "f1".into(),
            file_type: "txt".into(),
        };
        app.store.cut_file(entry, path(&["docs"]));
        app.store.toggle_expanded(&path(&["docs"]));
        app.rebuild_rows();
        let row = app.rows.iter().find(|r| r.name == "notes.txt").unwrap();
        assert!(row.is_cut);
    }

    #[test]
    fn cut_folder_row_is_marked() {
        let mut app = setup_app();
        app.store.cut_folder(path(&["pics"])).unwrap();
        app.rebuild_rows();
        let row = app.rows.iter().find(|r| r.name == "pics").unwrap();
        assert!(row.is_cut);
        let other = app.rows.iter().find(|r| r.name == "docs").unwrap();
        assert!(!other.is_cut);
    }

    #[test]
    fn open_rename_folder_dialog_prefills_name() {
        let mut app = setup_app();
        app.open_dialog(DialogKind::RenameFolder {
            path: path(&["docs"]),
        });
        assert_eq!(app.dialog_state.input, "docs");
        assert_eq!(app.dialog_state.cursor_position, 4);
    }

    #[test]
    fn open_rename_file_dialog_prefills_base_name() {
        let mut app = setup_app();
        app.open_dialog(DialogKind::RenameFile {
            parent: path(&["docs"]),
            file_id: "f1".into(),
            original: "notes.txt".into(),
        });
        assert_eq!(app.dialog_state.input, "notes");
        assert_eq!(app.dialog_state.cursor_position, 5);
    }

    #[test]
    fn dialog_input_editing() {
        let mut app = setup_app();
        app.open_dialog(DialogKind::CreateFolder { parent: vec![] });
        app.dialog_input_char('a');
        app.dialog_input_char('b');
        app.dialog_input_char('c');
        assert_eq!(app.dialog_state.input, "abc");
        app.dialog_delete_char();
        assert_eq!(app.dialog_state.input, "ab");
        app.dialog_move_cursor_left();
        app.dialog_input_char('x');
        assert_eq!(app.dialog_state.input, "axb");
        app.dialog_cursor_home();
        assert_eq!(app.dialog_state.cursor_position, 0);
        app.dialog_cursor_end();
        assert_eq!(app.dialog_state.cursor_position, 3);
    }

    #[test]
    fn close_dialog_resets_state() {
        let mut app = setup_app();
        app.open_dialog(DialogKind::CreateFolder { parent: vec![] });
        app.dialog_input_char('z');
        app.close_dialog();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.dialog_state.input.is_empty());
    }

    #[test]
    fn sync_failure_sets_error_status() {
        let mut app = setup_app();
        let generation = app.next_sync_generation();
        assert_eq!(app.syncs_in_flight, 1);
        app.on_sync_done(generation, Err("status 500".into()));
        assert_eq!(app.syncs_in_flight, 0);
        let (msg, is_error, _) = app.status_message.as_ref().unwrap();
        assert!(is_error);
        assert!(msg.contains("Sync failed"));
    }

    #[test]
    fn sync_success_is_silent() {
        let mut app = setup_app();
        let generation = app.next_sync_generation();
        app.on_sync_done(generation, Ok(()));
        assert!(app.status_message.is_none());
    }

    #[test]
    fn clear_expired_status_removes_old() {
        let mut app = setup_app();
        app.status_message = Some((
            "old".to_string(),
            false,
            Instant::now() - std::time::Duration::from_secs(5),
        ));
        app.clear_expired_status();
        assert!(app.status_message.is_none());
    }

    #[test]
    fn clear_expired_status_keeps_recent() {
        let mut app = setup_app();
        app.set_status("fresh");
        app.clear_expired_status();
        assert!(app.status_message.is_some());
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = setup_app();
        assert!(!app.should_quit);
        app.quit();
        assert!(app.should_quit);
    }
}
