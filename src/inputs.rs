//! Input collection
//!
//! Turns command-line arguments into an ordered, de-duplicated list of image
//! paths. An argument may be a literal file, a directory (every supported
//! image directly inside it) or a glob pattern.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::glob;

use crate::error::{Error, Result};
use crate::render::SourceKind;

/// Whether a pattern contains glob characters
fn is_glob(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}

/// Supported image files directly inside `dir`, sorted by name
pub fn images_in_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && SourceKind::from_path(path).is_some())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Expand arguments into image paths, keeping first-seen order.
///
/// Globs and directories expand in sorted order at their position in the
/// argument list. Literal paths are kept as given even if they do not exist;
/// the renderer reports those per image.
pub fn collect_inputs<S: AsRef<str>>(args: &[S]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        if is_glob(arg) {
            let entries = glob(arg).map_err(|e| Error::InvalidGlob(format!("{}: {}", arg, e)))?;
            let mut matched: Vec<PathBuf> = entries
                .filter_map(|entry| match entry {
                    Ok(path) => Some(path),
                    Err(e) => {
                        log::warn!("Glob error for {}: {}", arg, e);
                        None
                    }
                })
                .filter(|path| path.is_file())
                .collect();
            if matched.is_empty() {
                return Err(Error::NoFilesMatched(arg.to_string()));
            }
            matched.sort();
            paths.extend(matched);
        } else {
            let path = PathBuf::from(arg);
            if path.is_dir() {
                let found = images_in_directory(&path)?;
                if found.is_empty() {
                    return Err(Error::NoFilesMatched(arg.to_string()));
                }
                log::info!("Found {} images in {}", found.len(), path.display());
                paths.extend(found);
            } else {
                paths.push(path);
            }
        }
    }

    Ok(dedup_preserving_order(paths))
}

/// Drop repeated paths, keeping the first occurrence
pub fn dedup_preserving_order(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();
        path
    }

    #[test]
    fn test_directory_expands_to_supported_images() {
        let dir = TempDir::new().unwrap();
        let b = touch(dir.path(), "b.svg");
        let a = touch(dir.path(), "a.svg");
        let c = touch(dir.path(), "c.png");
        touch(dir.path(), "notes.txt");
        std::fs::create_dir(dir.path().join("sub.svg")).unwrap();

        let arg = dir.path().to_string_lossy().into_owned();
        let inputs = collect_inputs(&[arg]).unwrap();
        assert_eq!(inputs, vec![a, b, c]);
    }

    #[test]
    fn test_glob_expansion_sorted() {
        let dir = TempDir::new().unwrap();
        let two = touch(dir.path(), "2.svg");
        let one = touch(dir.path(), "1.svg");
        touch(dir.path(), "other.png");

        let pattern = dir.path().join("*.svg").to_string_lossy().into_owned();
        let inputs = collect_inputs(&[pattern]).unwrap();
        assert_eq!(inputs, vec![one, two]);
    }

    #[test]
    fn test_glob_without_matches_is_error() {
        let dir = TempDir::new().unwrap();
        let pattern = dir.path().join("*.svg").to_string_lossy().into_owned();
        assert!(matches!(collect_inputs(&[pattern]), Err(Error::NoFilesMatched(_))));
    }

    #[test]
    fn test_literal_paths_kept_in_order_and_deduplicated() {
        let inputs = collect_inputs(&["z.svg", "a.svg", "z.svg", "missing.svg"]).unwrap();
        assert_eq!(
            inputs,
            vec![
                PathBuf::from("z.svg"),
                PathBuf::from("a.svg"),
                PathBuf::from("missing.svg"),
            ]
        );
    }

    #[test]
    fn test_empty_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let arg = dir.path().to_string_lossy().into_owned();
        assert!(matches!(collect_inputs(&[arg]), Err(Error::NoFilesMatched(_))));
    }
}
