use std::collections::BTreeMap;

use crate::drive::record::{self, FileRecord, FOLDER_TYPE};

/// A file owned by a folder.
///
/// Identity is `file_id`, unique across the whole tree (the backend mints
/// ids; the client only ever generates fresh ones on copy-paste).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub file_id: String,
    pub file_type: String,
}

impl FileEntry {
    /// The wire `file_type` for this entry: the stored type, or the name's
    /// extension when no type was recorded.
    pub fn wire_type(&self) -> String {
        if self.file_type.is_empty() {
            record::extension_of(&self.name)
        } else {
            self.file_type.clone()
        }
    }
}

/// A folder in the drive tree: named child folders plus directly-owned files.
///
/// Child folders and the file list are separate fields, so a folder literally
/// named `files` cannot collide with the file list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderNode {
    pub folders: BTreeMap<String, FolderNode>,
    pub files: Vec<FileEntry>,
}

impl FolderNode {
    /// Whether this folder has no files and no subfolders.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }

    /// Find the file with the given id in this folder's direct file list.
    pub fn file_position(&self, file_id: &str) -> Option<usize> {
        self.files.iter().position(|f| f.file_id == file_id)
    }
}

/// Walk the folder-name chain from `root`. Returns `None` as soon as a
/// segment is missing — the path no longer exists (e.g. a stale reference
/// after a delete earlier in the session).
pub fn resolve<'a>(root: &'a FolderNode, path: &[String]) -> Option<&'a FolderNode> {
    let mut node = root;
    for segment in path {
        node = node.folders.get(segment)?;
    }
    Some(node)
}

/// Mutable variant of [`resolve`].
pub fn resolve_mut<'a>(root: &'a mut FolderNode, path: &[String]) -> Option<&'a mut FolderNode> {
    let mut node = root;
    for segment in path {
        node = node.folders.get_mut(segment)?;
    }
    Some(node)
}

/// Build the nested tree from the backend's flat record list.
///
/// For a path of N segments the first N-1 are folders (created on demand,
/// reused when present) and the last is a file name. Folder placeholders
/// (sentinel type, trailing separator) create their whole chain without
/// appending a file. Malformed paths contribute nothing rather than failing.
pub fn build_tree(records: &[FileRecord]) -> FolderNode {
    let mut root = FolderNode::default();

    for rec in records {
        let segments = rec.path_segments();
        if segments.is_empty() {
            continue;
        }

        if rec.is_folder_placeholder() {
            let mut node = &mut root;
            for part in &segments {
                node = node.folders.entry(part.to_string()).or_default();
            }
            continue;
        }

        let (leaf, folders) = segments.split_last().expect("segments checked non-empty");
        let mut node = &mut root;
        for part in folders {
            node = node.folders.entry(part.to_string()).or_default();
        }
        node.files.push(FileEntry {
            name: leaf.to_string(),
            file_id: rec.file_id.clone(),
            file_type: rec.file_type.clone(),
        });
    }

    root
}

/// Flatten the tree back to the wire format: a depth-first walk emitting
/// each folder's direct files before recursing into its children.
///
/// With `keep_empty_folders`, every empty folder produces one synthetic
/// placeholder record (fresh id, sentinel type, separator-terminated path)
/// so it survives the next load. Output order is not part of the protocol —
/// the backend keys the list by path.
pub fn flatten(root: &FolderNode, keep_empty_folders: bool) -> Vec<FileRecord> {
    let mut records = Vec::new();
    let mut path = Vec::new();
    flatten_into(root, keep_empty_folders, true, &mut path, &mut records);
    records
}

fn flatten_into(
    node: &FolderNode,
    keep_empty_folders: bool,
    is_root: bool,
    path: &mut Vec<String>,
    out: &mut Vec<FileRecord>,
) {
    if !is_root && keep_empty_folders && node.is_empty() {
        out.push(FileRecord {
            file_id: record::mint_file_id(),
            file_type: FOLDER_TYPE.to_string(),
            file_path: format!("/{}/", path.join("/")),
        });
        return;
    }

    for file in &node.files {
        let mut file_path = String::from("/");
        for part in path.iter() {
            file_path.push_str(part);
            file_path.push('/');
        }
        file_path.push_str(&file.name);
        out.push(FileRecord {
            file_id: file.file_id.clone(),
            file_type: file.wire_type(),
            file_path,
        });
    }

    for (name, child) in &node.folders {
        path.push(name.clone());
        flatten_into(child, keep_empty_folders, false, path, out);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn rec(id: &str, ty: &str, path: &str) -> FileRecord {
        FileRecord {
            file_id: id.into(),
            file_type: ty.into(),
            file_path: path.into(),
        }
    }

    fn sample_records() -> Vec<FileRecord> {
        vec![
            rec("abc999", "txt", "/readme.txt"),
            rec("frjijr4895", "txt", "/documents/mama docs/test.txt"),
            rec("kofrk45", "png", "/documents/papa/photo.png"),
            rec("xyz123", "doc", "/documents/rootfile.doc"),
        ]
    }

    #[test]
    fn build_nests_folders_and_files() {
        let root = build_tree(&sample_records());

        assert_eq!(root.files.len(), 1);
        assert_eq!(root.files[0].name, "readme.txt");

        let documents = root.folders.get("documents").expect("documents exists");
        assert_eq!(documents.files.len(), 1);
        assert_eq!(documents.files[0].file_id, "xyz123");
        assert!(documents.folders.contains_key("mama docs"));
        assert!(documents.folders.contains_key("papa"));

        let papa = documents.folders.get("papa").unwrap();
        assert_eq!(papa.files[0].name, "photo.png");
    }

    #[test]
    fn build_is_idempotent_on_shared_prefixes() {
        // Two files under the same folder chain must not reset each other.
        let records = vec![
            rec("a", "txt", "/x/y/one.txt"),
            rec("b", "txt", "/x/y/two.txt"),
            rec("c", "txt", "/x/three.txt"),
        ];
        let root = build_tree(&records);
        let x = root.folders.get("x").unwrap();
        let y = x.folders.get("y").unwrap();
        assert_eq!(y.files.len(), 2);
        assert_eq!(x.files.len(), 1);
    }

    #[test]
    fn build_preserves_insertion_order_within_folder() {
        let records = vec![
            rec("1", "txt", "/zeta.txt"),
            rec("2", "txt", "/alpha.txt"),
        ];
        let root = build_tree(&records);
        assert_eq!(root.files[0].name, "zeta.txt");
        assert_eq!(root.files[1].name, "alpha.txt");
    }

    #[test]
    fn build_ignores_degenerate_paths() {
        let records = vec![
            rec("1", "", ""),
            rec("2", "", "///"),
            rec("3", "txt", "/ok.txt"),
        ];
        let root = build_tree(&records);
        assert_eq!(root.files.len(), 1);
        assert!(root.folders.is_empty());
    }

    #[test]
    fn build_creates_empty_folder_from_placeholder() {
        let records = vec![rec("id_p", FOLDER_TYPE, "/archive/empty/")];
        let root = build_tree(&records);
        let archive = root.folders.get("archive").unwrap();
        let empty = archive.folders.get("empty").unwrap();
        assert!(empty.is_empty());
        // No file was appended anywhere along the chain.
        assert!(root.files.is_empty());
        assert!(archive.files.is_empty());
    }

    #[test]
    fn resolve_walks_and_misses() {
        let root = build_tree(&sample_records());
        let path = vec!["documents".to_string(), "papa".to_string()];
        assert!(resolve(&root, &path).is_some());
        assert!(resolve(&root, &[]).is_some());

        let missing = vec!["documents".to_string(), "gone".to_string()];
        assert!(resolve(&root, &missing).is_none());
    }

    #[test]
    fn flatten_emits_qualified_paths() {
        let root = build_tree(&sample_records());
        let out = flatten(&root, false);
        let paths: Vec<&str> = out.iter().map(|r| r.file_path.as_str()).collect();
        assert!(paths.contains(&"/readme.txt"));
        assert!(paths.contains(&"/documents/mama docs/test.txt"));
        assert!(paths.contains(&"/documents/papa/photo.png"));
        assert!(paths.contains(&"/documents/rootfile.doc"));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn round_trip_preserves_id_to_path_mapping() {
        let records = sample_records();
        let rebuilt = flatten(&build_tree(&records), false);

        let by_id = |recs: &[FileRecord]| -> HashMap<String, String> {
            recs.iter()
                .map(|r| (r.file_id.clone(), r.file_path.clone()))
                .collect()
        };
        assert_eq!(by_id(&records), by_id(&rebuilt));
    }

    #[test]
    fn empty_folder_survives_round_trip_with_sentinels() {
        let records = vec![
            rec("a", "txt", "/docs/a.txt"),
            rec("id_p", FOLDER_TYPE, "/stash/"),
        ];
        let root = build_tree(&records);
        let out = flatten(&root, true);

        let sentinel = out
            .iter()
            .find(|r| r.is_folder_placeholder())
            .expect("one sentinel emitted");
        assert_eq!(sentinel.file_path, "/stash/");
        assert!(sentinel.file_id.starts_with("id_"));

        let again = build_tree(&out);
        assert!(again.folders.get("stash").unwrap().is_empty());
        assert_eq!(again.folders.get("docs").unwrap().files.len(), 1);
    }

    #[test]
    fn sentinels_dropped_when_disabled() {
        let records = vec![rec("id_p", FOLDER_TYPE, "/stash/")];
        let root = build_tree(&records);
        assert!(flatten(&root, false).is_empty());
    }

    #[test]
    fn folder_with_content_never_emits_sentinel() {
        let records = vec![rec("a", "txt", "/stash/a.txt")];
        let root = build_tree(&records);
        let out = flatten(&root, true);
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_folder_placeholder());
    }

    #[test]
    fn flatten_derives_type_from_extension_when_unset() {
        let records = vec![rec("a", "", "/report.PDF")];
        let out = flatten(&build_tree(&records), false);
        assert_eq!(out[0].file_type, "pdf");
    }

    #[test]
    fn flatten_keeps_stored_category_type() {
        // The Telegram variant stores categories rather than extensions.
        let records = vec![rec("a", "photo", "/pics/sunset.jpg")];
        let out = flatten(&build_tree(&records), false);
        assert_eq!(out[0].file_type, "photo");
    }

    #[test]
    fn folder_named_files_is_just_a_folder() {
        let records = vec![rec("a", "txt", "/files/inner.txt")];
        let root = build_tree(&records);
        let files_folder = root.folders.get("files").unwrap();
        assert_eq!(files_folder.files[0].name, "inner.txt");
        assert!(root.files.is_empty());

        let out = flatten(&root, false);
        assert_eq!(out[0].file_path, "/files/inner.txt");
    }
}
