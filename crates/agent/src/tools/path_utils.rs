//! Workspace path confinement for the file tools.

use std::path::{Component, Path, PathBuf};

/// A path that resolved outside the workspace, or could not resolve at all.
#[derive(Debug, Clone)]
pub struct PathResolveError {
    pub path: String,
}

impl std::fmt::Display for PathResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "path {:?} is outside the workspace", self.path)
    }
}

impl std::error::Error for PathResolveError {}

/// Resolve a tool-supplied path against the workspace root.
///
/// Relative inputs join the root; absolute inputs are taken as given. The
/// joined path is normalized lexically (`.` dropped, `..` popped) so that
/// paths to files that do not exist yet still resolve. Symlinks are then
/// resolved down to the deepest existing ancestor, since a link inside the
/// workspace may point outside it, and containment is checked on the
/// symlink-free form: the result must equal the root or have it as an
/// ancestor.
pub fn resolve_workspace_path(path: &str, workspace_root: &Path) -> Result<PathBuf, PathResolveError> {
    if path.is_empty() {
        return Err(PathResolveError {
            path: path.to_string(),
        });
    }

    let candidate = Path::new(path);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        workspace_root.join(candidate)
    };

    let normalized = normalize(&joined).ok_or_else(|| PathResolveError {
        path: path.to_string(),
    })?;

    let resolved = resolve_symlinks(&normalized).ok_or_else(|| PathResolveError {
        path: path.to_string(),
    })?;
    let root = workspace_root
        .canonicalize()
        .unwrap_or_else(|_| workspace_root.to_path_buf());

    if !is_within(&resolved, &root) {
        return Err(PathResolveError {
            path: path.to_string(),
        });
    }

    Ok(resolved)
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// not-yet-existing tail, so new-file targets still resolve while symlinks
/// anywhere on the existing part are followed. A dangling symlink yields
/// `None`; writing through one would create the link's target instead of
/// the named path.
fn resolve_symlinks(path: &Path) -> Option<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();

    while existing.symlink_metadata().is_err() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent.to_path_buf();
            }
            _ => break,
        }
    }

    let mut resolved = match existing.canonicalize() {
        Ok(canonical) => canonical,
        Err(_) => {
            let is_symlink = existing
                .symlink_metadata()
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false);
            if is_symlink {
                return None;
            }
            existing
        }
    };
    for part in tail.iter().rev() {
        resolved.push(part);
    }
    Some(resolved)
}

/// Lexical normalization: resolve `.` and `..` without touching the
/// filesystem. `..` that would climb past the filesystem root fails.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => return None,
                _ => return None,
            },
            other => parts.push(other),
        }
    }
    Some(parts.iter().collect())
}

/// Component-wise prefix check; string prefixes would accept siblings like
/// `/ws-other` for a root of `/ws`.
fn is_within(path: &Path, workspace: &Path) -> bool {
    let path_components: Vec<_> = path.components().collect();
    let workspace_components: Vec<_> = workspace.components().collect();

    if path_components.len() < workspace_components.len() {
        return false;
    }

    workspace_components
        .iter()
        .enumerate()
        .all(|(i, comp)| path_components.get(i) == Some(comp))
}
