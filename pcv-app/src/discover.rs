//! Config file discovery when `--cfg` is not given.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Extensions accepted as config files.
pub const CONFIG_EXTENSIONS: &[&str] = &["json", "jsonc", "json5"];

/// File stems preferred over any other config candidate.
pub const PREFERRED_STEMS: &[&str] = &["config", "cfg", "init", "ini"];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("No config file found under {}, pass one with --cfg", .0.display())]
    NotFound(PathBuf),
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name.starts_with("__"))
}

fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn has_preferred_stem(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| PREFERRED_STEMS.contains(&stem.to_ascii_lowercase().as_str()))
}

/// Search `root` recursively for a config file.
///
/// Hidden directories and directories starting with `__` are not entered.
/// A file with a preferred stem wins, the shallowest one first. Otherwise the
/// shallowest candidate with the smallest path is picked.
#[tracing::instrument(skip_all, fields(root = %root.display()))]
pub fn discover_config(root: &Path) -> Result<PathBuf, DiscoveryError> {
    let mut candidates: Vec<(usize, PathBuf)> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_config_file(entry.path()))
        .map(|entry| (entry.depth(), entry.into_path()))
        .collect();

    candidates.sort();
    debug!("Found {} config candidates", candidates.len());

    let preferred = candidates
        .iter()
        .find(|(_, path)| has_preferred_stem(path))
        .map(|(_, path)| path.clone());

    preferred
        .or_else(|| candidates.into_iter().next().map(|(_, path)| path))
        .ok_or_else(|| DiscoveryError::NotFound(root.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_prefers_common_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.json"));
        touch(&dir.path().join("cfg.json5"));
        touch(&dir.path().join("z.jsonc"));
        assert_eq!(discover_config(dir.path()).unwrap(), dir.path().join("cfg.json5"));
    }

    #[test]
    fn test_falls_back_to_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.json"));
        touch(&dir.path().join("a.jsonc"));
        touch(&dir.path().join("notes.txt"));
        assert_eq!(discover_config(dir.path()).unwrap(), dir.path().join("a.jsonc"));
    }

    #[test]
    fn test_shallow_config_beats_nested_one() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a").join("config.json"));
        touch(&dir.path().join("config.json"));
        assert_eq!(discover_config(dir.path()).unwrap(), dir.path().join("config.json"));
    }

    #[test]
    fn test_skips_hidden_and_dunder_dirs() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join(".git").join("config.json"));
        touch(&dir.path().join("__pycache__").join("config.json"));
        touch(&dir.path().join("scenes").join("init.json"));
        assert_eq!(
            discover_config(dir.path()).unwrap(),
            dir.path().join("scenes").join("init.json")
        );
    }

    #[test]
    fn test_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("points.csv"));
        assert!(matches!(
            discover_config(dir.path()),
            Err(DiscoveryError::NotFound(_))
        ));
    }
}
