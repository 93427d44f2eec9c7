use std::path::Path;

use critique_core::CritiqueError;
use tracing::warn;

/// Read `path` as UTF-8 text, keeping at most `max_chars` characters.
///
/// Oversized content is truncated rather than rejected, since a partial file
/// still gives the model useful context. Truncation is logged at warn level.
///
/// # Errors
///
/// Returns [`CritiqueError::FileUnreadable`] if the file cannot be read or is
/// not valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use critique_review::loader::load;
///
/// let code = load(Path::new("src/Main.java"), 100_000).unwrap();
/// ```
pub fn load(path: &Path, max_chars: usize) -> Result<String, CritiqueError> {
    let content = std::fs::read_to_string(path).map_err(|source| CritiqueError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(truncate_chars(content, max_chars, path))
}

fn truncate_chars(mut content: String, max_chars: usize, path: &Path) -> String {
    if let Some((cut, _)) = content.char_indices().nth(max_chars) {
        let total = content.chars().count();
        warn!(
            path = %path.display(),
            chars = total,
            limit = max_chars,
            "file is large, truncating"
        );
        content.truncate(cut);
    }
    content
}
