use std::path::{Path, PathBuf};

use anyhow::Result;
use kwa_core::{FileId, TemplateSource};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One discovered file, either decoded or carrying the reason it could not be.
#[derive(Clone, Debug)]
pub enum Input {
    Source(TemplateSource),
    Unreadable { file: FileId, reason: String },
}

impl Input {
    pub fn file(&self) -> &FileId {
        match self {
            Input::Source(s) => &s.id,
            Input::Unreadable { file, .. } => file,
        }
    }
}

/// Files under `root` whose extension is listed, sorted by relative path. Symlinks
/// are followed. An entry that cannot be walked is logged and skipped; if it names a
/// template file it is kept so reading it produces an unreadable record.
pub fn discover(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("codebase root {} is not a directory", root.display());
    }
    let wanted = |path: &Path| {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    };
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(root = %root.display(), error = %err, "cannot walk entry");
                if let Some(path) = err.path() {
                    if !path.is_dir() && wanted(path) {
                        files.push(path.to_path_buf());
                    }
                }
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if wanted(path) {
            if entry.path_is_symlink() {
                debug!(path = %path.display(), "following symlinked template");
            }
            files.push(path.to_path_buf());
        } else {
            debug!(path = %path.display(), "skipping non-template file");
        }
    }
    files.sort_by_key(|p| file_id(root, p));
    Ok(files)
}

/// Path relative to `root` with `/` separators.
pub fn file_id(root: &Path, path: &Path) -> FileId {
    let rel = path.strip_prefix(root).unwrap_or(path);
    FileId::from_str(rel.to_string_lossy().replace('\\', "/"))
}

/// Read bytes and decode strictly as UTF-8. Never fails the run.
pub fn read_input(root: &Path, path: &Path) -> Input {
    let file = file_id(root, path);
    match std::fs::read(path) {
        Err(e) => Input::Unreadable {
            file,
            reason: format!("read failed: {e}"),
        },
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Input::Source(TemplateSource { id: file, text }),
            Err(e) => Input::Unreadable {
                file,
                reason: format!("invalid utf-8 at byte {}", e.utf8_error().valid_up_to()),
            },
        },
    }
}
