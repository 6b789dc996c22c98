use crate::drive::tree::FileEntry;

/// The single pending copy- or cut-intent awaiting a paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardItem {
    /// Duplicate semantics: paste mints a fresh id, so only the name and
    /// type of the source are kept. Repeatable.
    CopyFile { name: String, file_type: String },
    /// Move semantics for a file: the original entry plus the folder path
    /// it currently lives in.
    CutFile {
        entry: FileEntry,
        source: Vec<String>,
    },
    /// Move semantics for a whole folder subtree.
    CutFolder { source: Vec<String> },
}

/// Internal clipboard buffer holding at most one pending item.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    item: Option<ClipboardItem>,
}

impl Clipboard {
    /// Create a new empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending item.
    pub fn set(&mut self, item: ClipboardItem) {
        self.item = Some(item);
    }

    /// Clear the clipboard.
    pub fn clear(&mut self) {
        self.item = None;
    }

    /// Whether the clipboard has content.
    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    pub fn item(&self) -> Option<&ClipboardItem> {
        self.item.as_ref()
    }

    /// Take the pending item out, leaving the clipboard empty.
    pub fn take(&mut self) -> Option<ClipboardItem> {
        self.item.take()
    }

    /// Short human-readable summary for the status bar.
    pub fn label(&self) -> Option<String> {
        self.item.as_ref().map(|item| match item {
            ClipboardItem::CopyFile { name, .. } => format!("copied: {}", name),
            ClipboardItem::CutFile { entry, .. } => format!("cut: {}", entry.name),
            ClipboardItem::CutFolder { source } => {
                format!("cut folder: {}", source.last().map(String::as_str).unwrap_or("/"))
            }
        })
    }
}
