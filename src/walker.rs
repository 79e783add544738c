use std::path::{Path, PathBuf};

use globset::GlobMatcher;

use crate::error::Result;

/// A docx2json output file whose name starts with an interview id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Interview id taken from the leading digits of the file name.
    pub id: i32,
    /// Path relative to the directory being loaded.
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
}

/// Parse the interview id from a file name such as `07 - Ana.json`.
///
/// Returns `None` when the name does not start with a digit or the
/// number is not a positive `i32`.
pub fn id_from_file_name(name: &str) -> Option<i32> {
    let end = name
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(name.len());
    name[..end].parse().ok().filter(|id: &i32| *id > 0)
}

/// Recursively find `.json` files named after an interview id.
///
/// Hidden files and directories are skipped. When `pattern` is given it
/// must match the path relative to `root`. Results are sorted by id, then
/// by path.
pub fn discover_sources(
    root: &Path,
    pattern: Option<&GlobMatcher>,
) -> Result<Vec<SourceFile>> {
    let canonical_root = root.canonicalize()?;
    let mut results = Vec::new();
    walk_dir(&canonical_root, &canonical_root, pattern, &mut results)?;
    results.sort_by(|a, b| {
        a.id.cmp(&b.id).then_with(|| a.relative_path.cmp(&b.relative_path))
    });
    Ok(results)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    pattern: Option<&GlobMatcher>,
    results: &mut Vec<SourceFile>,
) -> Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_dir(root, &path, pattern, results)?;
            continue;
        }

        let absolute_path = if file_type.is_symlink() {
            match path.canonicalize() {
                Ok(resolved) if resolved.is_file() => resolved,
                // Broken links and links to directories.
                _ => continue,
            }
        } else if file_type.is_file() {
            path.clone()
        } else {
            continue;
        };

        if !is_json(&path) {
            continue;
        }
        let Some(id) = id_from_file_name(&name) else {
            tracing::debug!(file = %name, "skipping file without leading id");
            continue;
        };

        let relative_path =
            path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        if pattern.is_some_and(|glob| !glob.is_match(&relative_path)) {
            continue;
        }

        results.push(SourceFile {
            id,
            relative_path,
            absolute_path,
        });
    }

    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
