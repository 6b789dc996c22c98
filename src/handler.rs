use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::RemoteStore;
use crate::app::{App, AppMode, DialogKind, RowKind};
use crate::drive::store::StoreError;
use crate::drive::tree::FileEntry;
use crate::event::Event;

/// Routes key events into store mutations and background backend calls.
///
/// Every successful structural mutation queues exactly one persist of the
/// full flattened state; results come back through the event channel.
pub struct Dispatcher {
    api: Arc<RemoteStore>,
    tx: mpsc::UnboundedSender<Event>,
    confirm_delete: bool,
}

impl Dispatcher {
    pub fn new(
        api: Arc<RemoteStore>,
        tx: mpsc::UnboundedSender<Event>,
        confirm_delete: bool,
    ) -> Self {
        Self {
            api,
            tx,
            confirm_delete,
        }
    }

    /// Handle a key event.
    pub fn handle_key_event(&self, app: &mut App, key: KeyEvent) {
        match app.mode.clone() {
            AppMode::Normal => self.handle_normal_key(app, key),
            AppMode::Dialog(kind) => self.handle_dialog_key(app, key, kind),
        }
    }

    fn handle_normal_key(&self, app: &mut App, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => app.quit(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
            KeyCode::Home | KeyCode::Char('g') => app.select_first(),
            KeyCode::End | KeyCode::Char('G') => app.select_last(),

            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                match app.selected_row().map(|r| r.kind.clone()) {
                    Some(RowKind::Folder { .. }) => app.toggle_selected_folder(),
                    Some(RowKind::File { entry }) => self.queue_download(app, &entry),
                    None => {}
                }
            }
            KeyCode::Left | KeyCode::Char('h') => app.collapse_selected(),

            KeyCode::Char('n') => {
                let parent = app.current_folder_path();
                app.open_dialog(DialogKind::CreateFolder { parent });
            }
            KeyCode::Char('r') => self.open_rename_dialog(app),
            KeyCode::Char('d') => self.request_delete(app),
            KeyCode::Char('c') => self.copy_selected(app),
            KeyCode::Char('x') => self.cut_selected(app),
            KeyCode::Char('p') => self.paste(app),

            KeyCode::Esc => {
                if !app.store.clipboard().is_empty() {
                    app.store.clear_clipboard();
                    app.rebuild_rows();
                    app.set_status("Clipboard cleared");
                }
            }
            _ => {}
        }
    }

    fn handle_dialog_key(&self, app: &mut App, key: KeyEvent, kind: DialogKind) {
        match &kind {
            DialogKind::Error { .. } => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    app.close_dialog();
                }
            }
            DialogKind::ConfirmDeleteFile { .. } | DialogKind::ConfirmDeleteFolder { .. } => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => self.commit_dialog(app, kind),
                    KeyCode::Char('n') | KeyCode::Esc => app.close_dialog(),
                    _ => {}
                }
            }
            _ => match key.code {
                KeyCode::Esc => app.close_dialog(),
                KeyCode::Enter => self.commit_dialog(app, kind),
                KeyCode::Backspace => app.dialog_delete_char(),
                KeyCode::Left => app.dialog_move_cursor_left(),
                KeyCode::Right => app.dialog_move_cursor_right(),
                KeyCode::Home => app.dialog_cursor_home(),
                KeyCode::End => app.dialog_cursor_end(),
                // Separators would corrupt the path addressing.
                KeyCode::Char(c) if c != '/' => app.dialog_input_char(c),
                _ => {}
            },
        }
    }

    fn open_rename_dialog(&self, app: &mut App) {
        let Some(row) = app.selected_row() else {
            return;
        };
        match &row.kind {
            RowKind::Folder { .. } => {
                let path = row.path.clone();
                app.open_dialog(DialogKind::RenameFolder { path });
            }
            RowKind::File { entry } => {
                let kind = DialogKind::RenameFile {
                    parent: row.path.clone(),
                    file_id: entry.file_id.clone(),
                    original: entry.name.clone(),
                };
                app.open_dialog(kind);
            }
        }
    }

    /// Validation step of the delete flow: only a deletable target opens the
    /// confirmation dialog; a non-empty folder is rejected up front.
    fn request_delete(&self, app: &mut App) {
        let Some(row) = app.selected_row() else {
            return;
        };
        match &row.kind {
            RowKind::Folder { .. } => {
                let path = row.path.clone();
                let name = row.name.clone();
                if let Err(err) = app.store.can_delete_folder(&path) {
                    app.open_dialog(DialogKind::Error {
                        message: err.to_string(),
                    });
                    return;
                }
                let kind = DialogKind::ConfirmDeleteFolder { path, name };
                if self.confirm_delete {
                    app.open_dialog(kind);
                } else {
                    self.commit_dialog(app, kind);
                }
            }
            RowKind::File { entry } => {
                let kind = DialogKind::ConfirmDeleteFile {
                    parent: row.path.clone(),
                    file_id: entry.file_id.clone(),
                    name: entry.name.clone(),
                };
                if self.confirm_delete {
                    app.open_dialog(kind);
                } else {
                    self.commit_dialog(app, kind);
                }
            }
        }
    }

    fn copy_selected(&self, app: &mut App) {
        let Some(row) = app.selected_row() else {
            return;
        };
        match &row.kind {
            RowKind::File { entry } => {
                let name = entry.name.clone();
                let entry = entry.clone();
                app.store.copy_file(&entry);
                app.rebuild_rows();
                app.set_status(format!("Copied: {}", name));
            }
            RowKind::Folder { .. } => {
                app.set_status("Folders can be moved with x");
            }
        }
    }

    fn cut_selected(&self, app: &mut App) {
        let Some(row) = app.selected_row() else {
            return;
        };
        match row.kind.clone() {
            RowKind::File { entry } => {
                let name = entry.name.clone();
                let source = row.path.clone();
                app.store.cut_file(entry, source);
                app.rebuild_rows();
                app.set_status(format!("Cut: {}", name));
            }
            RowKind::Folder { .. } => {
                let path = row.path.clone();
                let name = row.name.clone();
                match app.store.cut_folder(path) {
                    Ok(()) => {
                        app.rebuild_rows();
                        app.set_status(format!("Cut folder: {}", name));
                    }
                    Err(err) => app.open_dialog(DialogKind::Error {
                        message: err.to_string(),
                    }),
                }
            }
        }
    }

    fn paste(&self, app: &mut App) {
        let target = app.current_folder_path();
        match app.store.paste_into(&target) {
            Ok(name) => {
                app.rebuild_rows();
                app.set_status(format!("Pasted: {}", name));
                self.queue_sync(app);
            }
            Err(err @ StoreError::NothingToPaste) => {
                app.set_status(err.to_string());
            }
            Err(err) => app.open_dialog(DialogKind::Error {
                message: err.to_string(),
            }),
        }
    }

    /// Commit step invoked once the dialog's input or confirmation is in.
    fn commit_dialog(&self, app: &mut App, kind: DialogKind) {
        let input = app.dialog_state.input.clone();
        match kind {
            DialogKind::CreateFolder { parent } => {
                match app.store.create_folder(&parent, &input) {
                    Ok(name) => {
                        if !parent.is_empty() && !app.store.is_expanded(&parent) {
                            app.store.toggle_expanded(&parent);
                        }
                        app.close_dialog();
                        app.rebuild_rows();
                        app.set_status(format!("Created folder: {}", name));
                        self.queue_sync(app);
                    }
                    Err(err) => app.open_dialog(DialogKind::Error {
                        message: err.to_string(),
                    }),
                }
            }
            DialogKind::RenameFolder { path } => {
                match app.store.rename_folder(&path, &input) {
                    Ok(true) => {
                        app.close_dialog();
                        app.rebuild_rows();
                        app.set_status(format!("Renamed to: {}", input.trim()));
                        self.queue_sync(app);
                    }
                    Ok(false) => app.close_dialog(),
                    Err(err) => app.open_dialog(DialogKind::Error {
                        message: err.to_string(),
                    }),
                }
            }
            DialogKind::RenameFile {
                parent, file_id, ..
            } => match app.store.rename_file(&parent, &file_id, &input) {
                Ok(true) => {
                    app.close_dialog();
                    app.rebuild_rows();
                    app.set_status("File renamed");
                    self.queue_sync(app);
                }
                Ok(false) => app.close_dialog(),
                Err(err) => app.open_dialog(DialogKind::Error {
                    message: err.to_string(),
                }),
            },
            DialogKind::ConfirmDeleteFile {
                parent,
                file_id,
                name,
            } => match app.store.delete_file(&parent, &file_id) {
                Ok(()) => {
                    app.close_dialog();
                    app.rebuild_rows();
                    app.set_status(format!("Deleted file: {}", name));
                    self.queue_sync(app);
                }
                Err(err) => app.open_dialog(DialogKind::Error {
                    message: err.to_string(),
                }),
            },
            DialogKind::ConfirmDeleteFolder { path, name } => {
                match app.store.delete_folder(&path) {
                    Ok(()) => {
                        app.close_dialog();
                        app.rebuild_rows();
                        app.set_status(format!("Deleted folder: {}", name));
                        self.queue_sync(app);
                    }
                    Err(err) => app.open_dialog(DialogKind::Error {
                        message: err.to_string(),
                    }),
                }
            }
            DialogKind::Error { .. } => app.close_dialog(),
        }
    }

    /// Push the full flattened state in the background. Fire-and-forget:
    /// failure is reported through the event channel but never rolls the
    /// in-memory mutation back.
    fn queue_sync(&self, app: &mut App) {
        let records = app.store.flatten();
        let last_message_id = app.last_message_id;
        let generation = app.next_sync_generation();
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        debug!(generation, records = records.len(), "queueing persist");
        tokio::spawn(async move {
            let result = api
                .persist(&records, last_message_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Event::SyncDone { generation, result });
        });
    }

    fn queue_download(&self, app: &mut App, entry: &FileEntry) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let name = entry.name.clone();
        let file_id = entry.file_id.clone();
        let file_type = entry.wire_type();
        app.set_status(format!("Requesting download: {}", name));
        tokio::spawn(async move {
            let result = api
                .request_download(&file_id, &file_type)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Event::DownloadDone { name, result });
        });
    }
}
