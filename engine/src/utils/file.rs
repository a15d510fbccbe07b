//! File utility functions

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolve a user-supplied path to an absolute one
///
/// A leading `~` on its own, or followed by `/` or `\`, stands for the home
/// directory. Anything still relative is joined onto the current directory.
///
/// ```text
/// expand_path("~/.querypad")  // -> /home/user/.querypad
/// expand_path("cpu.sql")      // -> /current/dir/cpu.sql
/// expand_path("/etc/q.json")  // -> /etc/q.json
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    let resolved = match home_relative(path).zip(dirs::home_dir()) {
        Some(("", home)) => home,
        Some((rest, home)) => home.join(rest),
        None => PathBuf::from(path),
    };

    if resolved.is_absolute() {
        return resolved;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(resolved),
        Err(_) => resolved,
    }
}

/// Remainder after a leading `~`, `~/` or `~\`
fn home_relative(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('~')?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix('/').or_else(|| rest.strip_prefix('\\'))
}

/// Read a UTF-8 text file, expanding `~` and relative paths first
pub fn read_text(path: &Path) -> Result<String> {
    let expanded = expand_path(&path.to_string_lossy());
    tracing::debug!(path = %expanded.display(), "Reading file");
    fs::read_to_string(&expanded)
        .with_context(|| format!("Failed to read file: {}", expanded.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_expand_path_absolute_unix() {
        assert_eq!(expand_path("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_path_relative() {
        let result = expand_path("./queries/cpu.sql");
        assert!(result.is_absolute());
        assert!(result.ends_with("cpu.sql"));

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path(".."), cwd.join(".."));
    }

    #[test]
    fn test_expand_path_tilde() {
        let result = expand_path("~/.querypad");
        assert!(result.is_absolute());
        assert!(!result.to_string_lossy().contains('~'));
        assert!(result.ends_with(".querypad"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
        }
    }

    #[test]
    fn test_expand_path_tilde_backslash() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~\\queries"), home.join("queries"));
        }
        assert_eq!(home_relative("~user/x"), None);
        assert_eq!(home_relative("~"), Some(""));
    }

    #[test]
    fn test_expand_path_trims_whitespace() {
        assert_eq!(expand_path("  /path/to/dir  "), PathBuf::from("/path/to/dir"));
        assert!(expand_path("   ").is_absolute());
    }

    #[test]
    fn test_read_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"SELECT 1\n").unwrap();
        assert_eq!(read_text(file.path()).unwrap(), "SELECT 1\n");
    }

    #[test]
    fn test_read_text_missing_file() {
        let err = read_text(Path::new("/nonexistent/query.sql")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
