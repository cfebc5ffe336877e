//! Filesystem inspection helpers
//!
//! Transient drive/folder listings for the browsing endpoints. Nothing
//! here is persisted.

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use walkdir::WalkDir;

/// A top-level location offered to the folder browser
#[derive(Debug, Clone, Serialize)]
pub struct DriveInfo {
    pub name: String,
    pub path: String,
}

/// One entry in a folder listing
#[derive(Debug, Clone, Serialize)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    pub size: Option<u64>,
    pub modified: Option<i64>,
    pub children_count: Option<usize>,
}

/// Well-known browse roots
///
/// Windows enumerates drive letters; elsewhere the usual user directories
/// plus mounted volumes.
pub fn logical_drives() -> Vec<DriveInfo> {
    let mut drives = Vec::new();

    if cfg!(windows) {
        for letter in 'A'..='Z' {
            let path = format!("{letter}:\\");
            if Path::new(&path).exists() {
                drives.push(DriveInfo {
                    name: format!("Drive {letter}"),
                    path,
                });
            }
        }
        return drives;
    }

    drives.push(DriveInfo {
        name: "Root".to_string(),
        path: "/".to_string(),
    });
    if let Some(home) = dirs::home_dir() {
        drives.push(DriveInfo {
            name: "Home".to_string(),
            path: home.display().to_string(),
        });
    }

    let named = [
        ("Desktop", dirs::desktop_dir()),
        ("Documents", dirs::document_dir()),
        ("Pictures", dirs::picture_dir()),
        ("Downloads", dirs::download_dir()),
    ];
    for (name, dir) in named {
        if let Some(dir) = dir.filter(|d| d.exists()) {
            drives.push(DriveInfo {
                name: name.to_string(),
                path: dir.display().to_string(),
            });
        }
    }

    // Mounted volumes (macOS and Linux)
    for mount_root in ["/Volumes", "/media", "/mnt"] {
        let Ok(entries) = fs::read_dir(mount_root) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            drives.push(DriveInfo {
                name: format!("Volume: {name}"),
                path: entry.path().display().to_string(),
            });
        }
    }

    drives
}

/// Whether `path` has one of the supported image extensions
pub fn is_supported_image(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = format!(".{ext}");
    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

/// Count supported images under `dir`, optionally descending into
/// subdirectories
pub fn count_images(dir: &Path, recursive: bool, extensions: &[String]) -> usize {
    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_supported_image(entry.path(), extensions))
        .count()
}

/// List the direct children of `dir`, directories first
///
/// Entries that cannot be inspected are skipped rather than failing the
/// whole listing.
pub fn folder_contents(dir: &Path) -> std::io::Result<Vec<FolderEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let path = entry.path();
        let is_directory = metadata.is_dir();

        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64);
        let children_count =
            is_directory.then(|| fs::read_dir(&path).map(|it| it.count()).unwrap_or(0));

        entries.push(FolderEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: path.display().to_string(),
            is_directory,
            size: (!is_directory).then(|| metadata.len()),
            modified,
            children_count,
        });
    }

    entries.sort_by(|a, b| {
        (!a.is_directory, a.name.to_lowercase()).cmp(&(!b.is_directory, b.name.to_lowercase()))
    });
    Ok(entries)
}
