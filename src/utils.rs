//! Utility functions for string truncation and file system checks.

use std::error::Error;
use std::path::Path;

use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and a
/// byte-count indicator appended. Cuts on a character boundary, so
/// multi-byte content is safe to pass through.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep at most `max` characters of a string, without any marker.
///
/// Used where truncated text is fed back into prompts or responses rather
/// than logs.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match std::fs::File::create(&probe_path) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        let s = "ééééé";
        let result = truncate_for_log(s, 2);
        assert!(result.starts_with("éé"));
        assert!(result.contains("(+6 bytes)"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("ééééé", 2), "éé");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("deep/nested");
        ensure_writable_dir(&target).await.unwrap();
        assert!(target.is_dir());
    }
}
