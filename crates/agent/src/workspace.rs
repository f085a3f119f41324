//! Workspace scan, the "initial directory structure" shown to the model.
//!
//! Directories become nested objects keyed by their name plus a trailing
//! `/`; the regular files of a directory are listed under its `files` key.
//! The slash keeps a directory called `files` from clobbering that list.
//! Symlinks are skipped.

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;

/// Scan `root` into a nested JSON object, skipping excluded directory names.
pub fn scan_directory(root: &Path, excludes: &[String]) -> io::Result<Value> {
    let mut tree = Map::new();
    scan(root, excludes, &mut tree)?;
    Ok(Value::Object(tree))
}

/// Scan `root` and render it as pretty JSON for the prompt.
pub fn render_directory(root: &Path, excludes: &[String]) -> io::Result<String> {
    let tree = scan_directory(root, excludes)?;
    serde_json::to_string_pretty(&tree).map_err(io::Error::other)
}

fn scan(dir: &Path, excludes: &[String], parent: &mut Map<String, Value>) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    let mut files = Vec::new();
    for entry in entries {
        let file_type = entry.file_type()?;
        let name = entry.file_name().to_string_lossy().into_owned();

        if file_type.is_dir() {
            if excludes.iter().any(|x| *x == name) {
                continue;
            }
            let mut child = Map::new();
            scan(&entry.path(), excludes, &mut child)?;
            parent.insert(format!("{name}/"), Value::Object(child));
        } else if file_type.is_file() {
            files.push(Value::String(name));
        }
    }

    if !files.is_empty() {
        parent.insert("files".into(), Value::Array(files));
    }
    Ok(())
}
