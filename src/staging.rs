//! File materialization: writing a content mapping onto disk.
//!
//! A [`FileMap`] associates slash-separated relative paths with raw byte
//! content. [`write_files`] materializes such a mapping under a target
//! directory, creating intermediate directories as needed;
//! [`collect_files`] reads a directory tree back into a mapping.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Mapping from relative subpath to file content.
///
/// Keys use `/` as the separator and may name subdirectories. Iteration
/// order is lexicographic; if two keys resolve to the same on-disk path,
/// the later key in that order wins.
pub type FileMap = BTreeMap<String, Vec<u8>>;

/// Validate a mapping key and turn it into a relative path.
///
/// Absolute keys and keys containing `..` are rejected so entries cannot
/// escape the target directory.
fn relative_subpath(key: &str) -> Result<PathBuf> {
    let path = Path::new(key);
    if path.is_absolute() {
        bail!("invalid path '{}': absolute paths are not allowed", key);
    }
    for component in path.components() {
        match component {
            Component::ParentDir => {
                bail!("invalid path '{}': '..' components are not allowed", key)
            }
            Component::Normal(_) | Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                bail!("invalid path '{}': must be relative", key)
            }
        }
    }
    Ok(path.to_path_buf())
}

/// Write every entry of `content` under `target_dir`.
///
/// For each entry the parent directories are created first
/// (`fs::create_dir_all`), then the bytes are written, creating or
/// truncating the file, and the file mode is set to `0o644`.
///
/// An empty mapping succeeds without touching the filesystem. On the first
/// failure the error names the offending path and remaining entries are
/// not written; files already written stay in place.
pub fn write_files(target_dir: &Path, content: &FileMap) -> Result<()> {
    for (subpath, bytes) in content {
        let full_path = target_dir.join(relative_subpath(subpath)?);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("error making directory '{}'", parent.display()))?;
        }
        fs::write(&full_path, bytes)
            .with_context(|| format!("error writing '{}'", full_path.display()))?;
        fs::set_permissions(&full_path, fs::Permissions::from_mode(0o644))
            .with_context(|| format!("error setting mode on '{}'", full_path.display()))?;
    }
    Ok(())
}

/// Read a directory tree back into a [`FileMap`].
///
/// Walks `dir` recursively and returns the relative path and content of
/// every regular file. Symlinks are not followed; directories contribute
/// no entries. The inverse of [`write_files`] for trees it produced.
pub fn collect_files(dir: &Path) -> Result<FileMap> {
    let mut content = FileMap::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.with_context(|| format!("error walking '{}'", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .with_context(|| format!("path outside '{}'", dir.display()))?;
        let bytes = fs::read(entry.path())
            .with_context(|| format!("error reading '{}'", entry.path().display()))?;
        content.insert(rel.to_string_lossy().into_owned(), bytes);
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_target() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        (temp, target)
    }

    #[test]
    fn test_write_files_round_trip() {
        let (_temp, target) = temp_target();

        let mut content = FileMap::new();
        content.insert("etc/hosts".into(), b"127.0.0.1 localhost\n".to_vec());
        content.insert("boot/vmlinuz".into(), vec![0x7f, 0x45, 0x4c, 0x46, 0x00]);
        content.insert("top.txt".into(), b"top-level".to_vec());

        write_files(&target, &content).unwrap();

        assert_eq!(
            fs::read(target.join("etc/hosts")).unwrap(),
            b"127.0.0.1 localhost\n"
        );
        assert_eq!(
            fs::read(target.join("boot/vmlinuz")).unwrap(),
            vec![0x7f, 0x45, 0x4c, 0x46, 0x00]
        );
        assert_eq!(fs::read(target.join("top.txt")).unwrap(), b"top-level");
    }

    #[test]
    fn test_write_files_creates_nested_directories() {
        let (_temp, target) = temp_target();

        let mut content = FileMap::new();
        content.insert("var/lib/deeply/nested/file".into(), b"x".to_vec());

        write_files(&target, &content).unwrap();

        assert!(target.join("var/lib/deeply/nested").is_dir());
        assert!(target.join("var/lib/deeply/nested/file").is_file());
    }

    #[test]
    fn test_write_files_sets_file_mode() {
        let (_temp, target) = temp_target();

        let mut content = FileMap::new();
        content.insert("etc/config".into(), b"key=value\n".to_vec());

        write_files(&target, &content).unwrap();

        let mode = fs::metadata(target.join("etc/config"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_write_files_empty_map_is_noop() {
        let (_temp, target) = temp_target();

        write_files(&target, &FileMap::new()).unwrap();

        // Not even the target directory is created
        assert!(!target.exists());
    }

    #[test]
    fn test_write_files_overwrites_existing() {
        let (_temp, target) = temp_target();

        let mut content = FileMap::new();
        content.insert("file".into(), b"first".to_vec());
        write_files(&target, &content).unwrap();

        content.insert("file".into(), b"second".to_vec());
        write_files(&target, &content).unwrap();

        assert_eq!(fs::read(target.join("file")).unwrap(), b"second");
    }

    #[test]
    fn test_write_files_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");

        let mut content = FileMap::new();
        content.insert("../escape.txt".into(), b"outside".to_vec());

        let err = write_files(&target, &content).unwrap_err();
        assert!(err.to_string().contains("'..'"));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_write_files_rejects_absolute_key() {
        let (_temp, target) = temp_target();

        let mut content = FileMap::new();
        content.insert("/etc/passwd".into(), b"nope".to_vec());

        let err = write_files(&target, &content).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn test_write_files_parent_is_regular_file() {
        let (_temp, target) = temp_target();

        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("blocker"), b"i am a file").unwrap();

        let mut content = FileMap::new();
        content.insert("blocker/child".into(), b"x".to_vec());

        let err = write_files(&target, &content).unwrap_err();
        assert!(err.to_string().contains("blocker"));
    }

    #[test]
    fn test_collect_files_inverts_write_files() {
        let (_temp, target) = temp_target();

        let mut content = FileMap::new();
        content.insert("a/b/c.bin".into(), vec![1, 2, 3]);
        content.insert("a/d.txt".into(), b"text".to_vec());
        content.insert("e".into(), Vec::new());

        write_files(&target, &content).unwrap();

        assert_eq!(collect_files(&target).unwrap(), content);
    }

    #[test]
    fn test_collect_files_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(collect_files(temp.path()).unwrap().is_empty());
    }
}
