use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::drive::clipboard::{Clipboard, ClipboardItem};
use crate::drive::record::{self, FileRecord};
use crate::drive::tree::{self, FileEntry, FolderNode};

/// Error kinds surfaced by the store. Every public operation returns one of
/// these by value; nothing panics across the store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A path no longer resolves (stale reference within the session).
    #[error("Folder not found: /{0}")]
    PathNotFound(String),

    /// A sibling folder already uses the requested name.
    #[error("A folder named \"{0}\" already exists here")]
    NameCollision(String),

    /// Delete was requested on a folder that still has content.
    #[error("Cannot delete a non-empty folder")]
    FolderNotEmpty,

    /// Paste was requested with an empty clipboard.
    #[error("Nothing to paste")]
    NothingToPaste,

    /// A cut folder cannot be pasted into its own subtree.
    #[error("Cannot move a folder into itself")]
    MoveIntoSelf,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Default base name for newly created folders.
pub const NEW_FOLDER_NAME: &str = "new_folder";

/// The session's drive state: the folder tree plus the view/clipboard
/// bookkeeping that has to stay consistent with it.
///
/// The store is the sole mutator of the hierarchy. Each mutation either
/// completes fully in memory or refuses without touching anything; pushing
/// the flattened result to the backend is the caller's concern.
pub struct DriveStore {
    root: FolderNode,
    expanded: HashSet<String>,
    clipboard: Clipboard,
    keep_empty_folders: bool,
}

impl DriveStore {
    pub fn new(root: FolderNode, keep_empty_folders: bool) -> Self {
        Self {
            root,
            expanded: HashSet::new(),
            clipboard: Clipboard::new(),
            keep_empty_folders,
        }
    }

    /// Build the store from a backend snapshot.
    pub fn from_records(records: &[FileRecord], keep_empty_folders: bool) -> Self {
        Self::new(tree::build_tree(records), keep_empty_folders)
    }

    pub fn root(&self) -> &FolderNode {
        &self.root
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard.clear();
    }

    /// Flatten the current tree to wire records for a persist call.
    pub fn flatten(&self) -> Vec<FileRecord> {
        tree::flatten(&self.root, self.keep_empty_folders)
    }

    /// Resolve a folder path; `None` when any segment is missing.
    pub fn resolve(&self, path: &[String]) -> Option<&FolderNode> {
        tree::resolve(&self.root, path)
    }

    // ── Expanded-path view state ─────────────────────────────────────────

    pub fn is_expanded(&self, path: &[String]) -> bool {
        self.expanded.contains(&join_path(path))
    }

    pub fn toggle_expanded(&mut self, path: &[String]) {
        let key = join_path(path);
        if !self.expanded.remove(&key) {
            self.expanded.insert(key);
        }
    }

    pub fn collapse(&mut self, path: &[String]) {
        self.expanded.remove(&join_path(path));
    }

    #[cfg(test)]
    pub fn expanded_paths(&self) -> &HashSet<String> {
        &self.expanded
    }

    // ── Structural mutations ─────────────────────────────────────────────

    /// Create an empty folder under `parent`, deriving a collision-free name
    /// from `desired` (`name`, `name_1`, `name_2`, …). Returns the name used.
    pub fn create_folder(&mut self, parent: &[String], desired: &str) -> StoreResult<String> {
        let base = desired.trim();
        let base = if base.is_empty() { NEW_FOLDER_NAME } else { base };

        let node = tree::resolve_mut(&mut self.root, parent)
            .ok_or_else(|| StoreError::PathNotFound(join_path(parent)))?;

        let mut name = base.to_string();
        let mut counter = 1;
        while node.folders.contains_key(&name) {
            name = format!("{}_{}", base, counter);
            counter += 1;
        }

        node.folders.insert(name.clone(), FolderNode::default());
        debug!(folder = %name, parent = %join_path(parent), "created folder");
        Ok(name)
    }

    /// Rename the folder at `path`. Returns `false` (no mutation, no error)
    /// when the new name is empty or unchanged.
    pub fn rename_folder(&mut self, path: &[String], new_name: &str) -> StoreResult<bool> {
        let (old_name, parent_path) = path
            .split_last()
            .ok_or_else(|| StoreError::PathNotFound(String::new()))?;

        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == old_name {
            return Ok(false);
        }

        let parent = tree::resolve_mut(&mut self.root, parent_path)
            .ok_or_else(|| StoreError::PathNotFound(join_path(parent_path)))?;
        if !parent.folders.contains_key(old_name) {
            return Err(StoreError::PathNotFound(join_path(path)));
        }
        if parent.folders.contains_key(new_name) {
            return Err(StoreError::NameCollision(new_name.to_string()));
        }

        let subtree = parent
            .folders
            .remove(old_name)
            .expect("presence checked above");
        parent.folders.insert(new_name.to_string(), subtree);

        let mut new_path = parent_path.to_vec();
        new_path.push(new_name.to_string());
        self.rewrite_expanded(path, &new_path);
        self.rewrite_clipboard(path, &new_path);
        debug!(from = %join_path(path), to = %join_path(&new_path), "renamed folder");
        Ok(true)
    }

    /// Validation step for the delete-folder confirmation dialog: succeeds
    /// only when the folder exists and is empty. Does not mutate.
    pub fn can_delete_folder(&self, path: &[String]) -> StoreResult<()> {
        if path.is_empty() {
            return Err(StoreError::PathNotFound(String::new()));
        }
        let node = self
            .resolve(path)
            .ok_or_else(|| StoreError::PathNotFound(join_path(path)))?;
        if !node.is_empty() {
            return Err(StoreError::FolderNotEmpty);
        }
        Ok(())
    }

    /// Delete the empty folder at `path`, purging its expanded-path entries
    /// and any clipboard reference to it.
    pub fn delete_folder(&mut self, path: &[String]) -> StoreResult<()> {
        self.can_delete_folder(path)?;

        let (name, parent_path) = path.split_last().expect("checked non-empty");
        let parent = tree::resolve_mut(&mut self.root, parent_path)
            .ok_or_else(|| StoreError::PathNotFound(join_path(parent_path)))?;
        parent.folders.remove(name);

        let key = join_path(path);
        let prefix = format!("{}/", key);
        self.expanded.retain(|k| k != &key && !k.starts_with(&prefix));
        if self.clipboard_references(path) {
            self.clipboard.clear();
        }
        debug!(folder = %key, "deleted folder");
        Ok(())
    }

    /// Rename the file with `file_id` inside `parent`, keeping its original
    /// extension; the caller supplies only the base name. Returns `false`
    /// when the file is missing or the name does not change.
    pub fn rename_file(
        &mut self,
        parent: &[String],
        file_id: &str,
        new_base: &str,
    ) -> StoreResult<bool> {
        let new_base = new_base.trim();
        if new_base.is_empty() {
            return Ok(false);
        }

        let node = tree::resolve_mut(&mut self.root, parent)
            .ok_or_else(|| StoreError::PathNotFound(join_path(parent)))?;
        let Some(pos) = node.file_position(file_id) else {
            return Ok(false);
        };

        let ext = record::extension_of(&node.files[pos].name);
        let new_name = if ext.is_empty() {
            new_base.to_string()
        } else {
            format!("{}.{}", new_base, ext)
        };
        if new_name == node.files[pos].name {
            return Ok(false);
        }

        node.files[pos].name = new_name.clone();

        // A cut reference to this file carries its own name snapshot.
        let is_cut_subject = matches!(
            self.clipboard.item(),
            Some(ClipboardItem::CutFile { entry, .. }) if entry.file_id == file_id
        );
        if is_cut_subject {
            if let Some(ClipboardItem::CutFile { mut entry, source }) = self.clipboard.take() {
                entry.name = new_name;
                self.clipboard.set(ClipboardItem::CutFile { entry, source });
            }
        }
        Ok(true)
    }

    /// Remove the file with `file_id` from `parent`'s file list. Missing ids
    /// are tolerated silently; a cut clipboard reference to the deleted file
    /// is cleared.
    pub fn delete_file(&mut self, parent: &[String], file_id: &str) -> StoreResult<()> {
        let node = tree::resolve_mut(&mut self.root, parent)
            .ok_or_else(|| StoreError::PathNotFound(join_path(parent)))?;
        let Some(pos) = node.file_position(file_id) else {
            return Ok(());
        };
        node.files.remove(pos);

        let is_cut_subject = matches!(
            self.clipboard.item(),
            Some(ClipboardItem::CutFile { entry, .. }) if entry.file_id == file_id
        );
        if is_cut_subject {
            self.clipboard.clear();
        }
        debug!(file_id, "deleted file");
        Ok(())
    }

    /// Store a duplicate-intent snapshot of a file. Paste mints a fresh id,
    /// so no source reference is needed.
    pub fn copy_file(&mut self, entry: &FileEntry) {
        self.clipboard.set(ClipboardItem::CopyFile {
            name: entry.name.clone(),
            file_type: entry.file_type.clone(),
        });
    }

    /// Store a move-intent reference to a file and the folder it lives in.
    pub fn cut_file(&mut self, entry: FileEntry, source: Vec<String>) {
        self.clipboard.set(ClipboardItem::CutFile { entry, source });
    }

    /// Store a move-intent reference to a folder subtree.
    pub fn cut_folder(&mut self, source: Vec<String>) -> StoreResult<()> {
        if source.is_empty() || self.resolve(&source).is_none() {
            return Err(StoreError::PathNotFound(join_path(&source)));
        }
        self.clipboard.set(ClipboardItem::CutFolder { source });
        Ok(())
    }

    /// Paste the pending clipboard item into the folder at `target`.
    /// Returns the name of the pasted entry.
    pub fn paste_into(&mut self, target: &[String]) -> StoreResult<String> {
        let item = self
            .clipboard
            .item()
            .cloned()
            .ok_or(StoreError::NothingToPaste)?;
        if self.resolve(target).is_none() {
            return Err(StoreError::PathNotFound(join_path(target)));
        }

        match item {
            ClipboardItem::CopyFile { name, file_type } => {
                let node = tree::resolve_mut(&mut self.root, target)
                    .expect("target resolved above");
                node.files.push(FileEntry {
                    name: name.clone(),
                    file_id: record::mint_file_id(),
                    file_type,
                });
                // Copy semantics: the clipboard stays, paste is repeatable.
                Ok(name)
            }
            ClipboardItem::CutFile { entry, source } => {
                let source_node = tree::resolve_mut(&mut self.root, &source)
                    .ok_or_else(|| StoreError::PathNotFound(join_path(&source)))?;
                let pos = source_node
                    .file_position(&entry.file_id)
                    .ok_or_else(|| StoreError::PathNotFound(join_path(&source)))?;
                let moved = source_node.files.remove(pos);

                let node = tree::resolve_mut(&mut self.root, target)
                    .expect("target resolved above");
                let name = moved.name.clone();
                // File moves do not check for duplicate names.
                node.files.push(moved);
                self.clipboard.clear();
                debug!(from = %join_path(&source), to = %join_path(target), "moved file");
                Ok(name)
            }
            ClipboardItem::CutFolder { source } => {
                let (name, source_parent) = source
                    .split_last()
                    .ok_or_else(|| StoreError::PathNotFound(String::new()))?;
                if is_same_or_descendant(target, &source) {
                    return Err(StoreError::MoveIntoSelf);
                }
                let target_node = self
                    .resolve(target)
                    .ok_or_else(|| StoreError::PathNotFound(join_path(target)))?;
                if target_node.folders.contains_key(name) {
                    return Err(StoreError::NameCollision(name.clone()));
                }
                {
                    let parent = tree::resolve_mut(&mut self.root, source_parent)
                        .ok_or_else(|| StoreError::PathNotFound(join_path(source_parent)))?;
                    if !parent.folders.contains_key(name) {
                        return Err(StoreError::PathNotFound(join_path(&source)));
                    }
                }

                // All checks passed; the move itself cannot fail halfway.
                let subtree = tree::resolve_mut(&mut self.root, source_parent)
                    .expect("source parent resolved above")
                    .folders
                    .remove(name)
                    .expect("presence checked above");
                tree::resolve_mut(&mut self.root, target)
                    .expect("target checked outside the moved subtree")
                    .folders
                    .insert(name.clone(), subtree);

                let mut new_path = target.to_vec();
                new_path.push(name.clone());
                self.rewrite_expanded(&source, &new_path);
                self.clipboard.clear();
                debug!(from = %join_path(&source), to = %join_path(&new_path), "moved folder");
                Ok(name.clone())
            }
        }
    }

    // ── Consistency bookkeeping ──────────────────────────────────────────

    /// Rewrite expanded-path entries after a folder changed its path: the
    /// entry for the folder itself and every entry nested under it move to
    /// the new prefix; unrelated entries are untouched.
    fn rewrite_expanded(&mut self, old_path: &[String], new_path: &[String]) {
        let old_key = join_path(old_path);
        let new_key = join_path(new_path);
        let old_prefix = format!("{}/", old_key);

        let rewritten = self
            .expanded
            .drain()
            .map(|key| {
                if key == old_key {
                    new_key.clone()
                } else if let Some(rest) = key.strip_prefix(&old_prefix) {
                    format!("{}/{}", new_key, rest)
                } else {
                    key
                }
            })
            .collect();
        self.expanded = rewritten;
    }

    /// Keep a cut reference valid across a folder rename: a source path at
    /// or under the renamed folder gets the new prefix.
    fn rewrite_clipboard(&mut self, old_path: &[String], new_path: &[String]) {
        let rewrite = |source: &mut Vec<String>| {
            if source.len() >= old_path.len() && source[..old_path.len()] == *old_path {
                source.splice(..old_path.len(), new_path.iter().cloned());
            }
        };
        match self.clipboard.take() {
            Some(ClipboardItem::CutFile { entry, mut source }) => {
                rewrite(&mut source);
                self.clipboard.set(ClipboardItem::CutFile { entry, source });
            }
            Some(ClipboardItem::CutFolder { mut source }) => {
                rewrite(&mut source);
                self.clipboard.set(ClipboardItem::CutFolder { source });
            }
            Some(item @ ClipboardItem::CopyFile { .. }) => self.clipboard.set(item),
            None => {}
        }
    }

    /// Whether the clipboard references the folder at `path` or anything
    /// under it.
    fn clipboard_references(&self, path: &[String]) -> bool {
        match self.clipboard.item() {
            Some(ClipboardItem::CutFile { source, .. }) => is_same_or_descendant(source, path),
            Some(ClipboardItem::CutFolder { source }) => is_same_or_descendant(source, path),
            _ => false,
        }
    }
}

/// Join a folder path for display and for expanded-set keys.
pub fn join_path(path: &[String]) -> String {
    path.join("/")
}

/// Whether `candidate` equals `ancestor` or lies inside its subtree.
fn is_same_or_descendant(candidate: &[String], ancestor: &[String]) -> bool {
    candidate.len() >= ancestor.len() && candidate[..ancestor.len()] == *ancestor
}
