use std::path::{Path, PathBuf};

use critique_core::{CritiqueError, ReviewConfig};
use tracing::{debug, warn};

/// A file selected for review.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use critique_review::discovery::SourceFile;
///
/// let file = SourceFile {
///     path: PathBuf::from("/repo/src/Main.java"),
///     display_path: "src/Main.java".into(),
/// };
/// assert_eq!(file.display_path, "src/Main.java");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path used for filesystem access.
    pub path: PathBuf,
    /// Label shown to the user and the model; never used to open the file.
    pub display_path: String,
}

/// Locate reviewable files under `path`.
///
/// Directories are walked recursively; anything else is treated as a single
/// file.
///
/// # Errors
///
/// See [`locate_file`] and [`locate_dir`].
pub fn locate(path: &Path, config: &ReviewConfig) -> Result<Vec<SourceFile>, CritiqueError> {
    if path.is_dir() {
        locate_dir(path, config)
    } else {
        locate_file(path, config).map(|file| vec![file])
    }
}

/// Validate a single file for review.
///
/// The display path is the file's base name.
///
/// # Errors
///
/// Returns [`CritiqueError::NotFound`] if `path` does not exist,
/// [`CritiqueError::NotAFile`] if it is not a regular file, or
/// [`CritiqueError::UnsupportedExtension`] if its name does not end with an
/// accepted extension.
pub fn locate_file(path: &Path, config: &ReviewConfig) -> Result<SourceFile, CritiqueError> {
    if !path.exists() {
        return Err(CritiqueError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(CritiqueError::NotAFile(path.to_path_buf()));
    }

    let name = file_name(path);
    if !config.accepts(&name) {
        return Err(CritiqueError::UnsupportedExtension(path.to_path_buf()));
    }

    Ok(SourceFile {
        path: path.to_path_buf(),
        display_path: name,
    })
}

/// Walk `root` recursively and return every regular file with an accepted
/// extension.
///
/// Entries are visited in file-name order within each directory. Display
/// paths are relative to `root`. Unless `respect_ignore_files` is set, hidden
/// files and ignore rules are not applied.
///
/// # Errors
///
/// Returns [`CritiqueError::NotFound`] if `root` does not exist, or
/// [`CritiqueError::NotADirectory`] if it is not a directory. An empty result
/// is not an error here.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use critique_core::ReviewConfig;
/// use critique_review::discovery::locate_dir;
///
/// let files = locate_dir(Path::new("src"), &ReviewConfig::default()).unwrap();
/// for f in &files {
///     println!("{}", f.display_path);
/// }
/// ```
pub fn locate_dir(root: &Path, config: &ReviewConfig) -> Result<Vec<SourceFile>, CritiqueError> {
    if !root.exists() {
        return Err(CritiqueError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CritiqueError::NotADirectory(root.to_path_buf()));
    }

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(config.respect_ignore_files)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        if !config.accepts(&file_name(path)) {
            continue;
        }

        files.push(SourceFile {
            path: path.to_path_buf(),
            display_path: relative_display(path, root),
        });
    }

    debug!(root = %root.display(), count = files.len(), "discovery finished");
    Ok(files)
}

/// Path of `file` relative to `root`, for labeling only.
///
/// Falls back to the full path when `file` is not under `root`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use critique_review::discovery::relative_display;
///
/// let shown = relative_display(Path::new("/repo/src/A.java"), Path::new("/repo"));
/// assert_eq!(shown, Path::new("src").join("A.java").to_string_lossy());
/// ```
pub fn relative_display(file: &Path, root: &Path) -> String {
    match file.strip_prefix(root) {
        Ok(r) => r.to_string_lossy().into_owned(),
        Err(_) => file.to_string_lossy().into_owned(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
