//! Record discovery and JSON loading.
//!
//! Inputs are files or directories. Directories are walked recursively and
//! every `*.json` file is read; a file holds either one record object or an
//! array of them. Records are grouped by the name of their file's parent
//! directory, which the normalizer can use as a date fallback.

use gs_common::{Error, RawRecord, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Group key for files whose parent directory has no usable name.
pub const ROOT_GROUP: &str = ".";

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Many(Vec<RawRecord>),
    One(RawRecord),
}

/// Load every record under `paths`, grouped by parent directory name.
///
/// A path that does not exist is an error. Files named explicitly are read
/// whatever their extension.
pub fn load_paths<P: AsRef<Path>>(paths: &[P]) -> Result<BTreeMap<String, Vec<RawRecord>>> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            collect_json_files(path, &mut files)?;
        } else if path.exists() {
            files.push(path.to_path_buf());
        } else {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: no such file or directory", path.display()),
            )));
        }
    }

    let mut groups: BTreeMap<String, Vec<RawRecord>> = BTreeMap::new();
    for file in &files {
        let records = load_file(file)?;
        debug!(path = %file.display(), records = records.len(), "loaded record file");
        groups.entry(group_key(file)).or_default().extend(records);
    }
    Ok(groups)
}

/// Read one record file.
pub fn load_file(path: &Path) -> Result<Vec<RawRecord>> {
    let content = fs::read_to_string(path)?;
    let parsed: RecordFile = serde_json::from_str(&content).map_err(|e| {
        Error::data(format!("{}: not a gift record file: {}", path.display(), e))
    })?;
    Ok(match parsed {
        RecordFile::Many(records) => records,
        RecordFile::One(record) => vec![record],
    })
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    // Directory order is unspecified.
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            out.push(path);
        }
    }
    Ok(())
}

fn group_key(file: &Path) -> String {
    file.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| ROOT_GROUP.to_string())
}
