use serde::{Deserialize, Serialize};

/// The `file_type` value marking a record as an empty-folder placeholder
/// rather than a real file.
pub const FOLDER_TYPE: &str = "folder";

/// A single path-addressed entry in the backend's flat file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: String,
    #[serde(default)]
    pub file_type: String,
    pub file_path: String,
}

impl FileRecord {
    /// Whether this record is an empty-folder placeholder: the sentinel
    /// type plus a separator-terminated path.
    pub fn is_folder_placeholder(&self) -> bool {
        self.file_type == FOLDER_TYPE && self.file_path.ends_with('/')
    }

    /// Split the path into its non-empty segments, ignoring leading,
    /// trailing, and doubled separators.
    pub fn path_segments(&self) -> Vec<&str> {
        split_path(&self.file_path)
    }
}

/// Split a slash-delimited path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Extension of a file name: the text after the last `.`, lowercased.
/// Empty when the name has no dot (or only a leading dot).
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Base of a file name: everything before the last `.`.
pub fn base_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Mint a fresh opaque file id. Ids are backend-scoped strings; the `id_`
/// prefix matches the ones the original clients generated.
pub fn mint_file_id() -> String {
    format!("id_{}", uuid::Uuid::new_v4().simple())
}
