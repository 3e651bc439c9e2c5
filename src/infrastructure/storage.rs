use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Reduce a client-supplied file name to a safe flat name.
///
/// Path separators become spaces, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped and leading/trailing `.`/`_` are
/// stripped. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let flattened = filename.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

pub fn ensure_upload_root(upload_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(upload_dir)?;
    Ok(upload_dir.to_path_buf())
}

pub fn ensure_presets_dir(presets_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(presets_dir)?;
    Ok(presets_dir.to_path_buf())
}

pub fn ensure_session_dir(upload_dir: &Path, session_id: &str) -> std::io::Result<PathBuf> {
    let session_dir = upload_dir.join(session_id);
    ensure_dir(&session_dir)?;
    Ok(session_dir)
}

/// Create `dir` (and its parents) if it is missing
pub fn ensure_subdir(dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(dir)?;
    Ok(dir.to_path_buf())
}

/// Best-effort removal; failures are ignored.
pub fn remove_quietly<'a, I>(paths: I)
where
    I: IntoIterator<Item = &'a Path>,
{
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My cool movie.csv"), "My_cool_movie.csv");
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("temp_0_relatório.csv"), "temp_0_relatrio.csv");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn test_ensure_session_dir_creates_nested() {
        let root = tempfile::tempdir().unwrap();
        let dir = ensure_session_dir(root.path(), "abc").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, root.path().join("abc"));
    }

    #[test]
    fn test_remove_quietly_ignores_missing() {
        let root = tempfile::tempdir().unwrap();
        let present = root.path().join("a.csv");
        fs::write(&present, "x").unwrap();
        let absent = root.path().join("b.csv");

        remove_quietly([present.as_path(), absent.as_path()]);
        assert!(!present.exists());
    }
}
