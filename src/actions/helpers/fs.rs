//! File-system helpers shared by planning and actions.
//!
//! Paths in the garden are handled lexically: symlinks are read, never
//! followed, so ownership checks see exactly what a link says.
use anyhow::{Context as _, Result};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Return `true` if anything exists at `path`, including a broken symlink.
#[must_use]
pub fn lexists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Return `true` if `path` is a real directory (not a symlink to one).
#[must_use]
pub fn is_real_dir(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.is_dir())
}

/// Resolve `.` and `..` components without touching the filesystem.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Make `path` absolute against the current directory, lexically.
///
/// Unlike [`std::fs::canonicalize`] this does not resolve symlinks, so a
/// garden symlink passed on the command line keeps its own identity.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    let abs = normalize_lexically(&std::path::absolute(path)?);
    Ok(dunce::simplified(&abs).to_path_buf())
}

/// Read the symlink at `link` and return where it points, with relative
/// targets resolved against the link's directory.  Returns `None` if
/// `link` is not a symlink.
#[must_use]
pub fn link_destination(link: &Path) -> Option<PathBuf> {
    let target = std::fs::read_link(link).ok()?;
    let joined = if target.is_absolute() {
        target
    } else {
        link.parent().unwrap_or_else(|| Path::new("")).join(target)
    };
    Some(dunce::simplified(&normalize_lexically(&joined)).to_path_buf())
}

/// Return `true` if `link` is a symlink whose destination lies strictly
/// beneath `root`.
#[must_use]
pub fn points_under(link: &Path, root: &Path) -> bool {
    link_destination(link).is_some_and(|dest| dest != root && dest.starts_with(root))
}

/// Compute a relative path that leads from directory `from` to `to`.
///
/// Both paths are expected to be absolute and normalised.
#[must_use]
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in to.iter().skip(common) {
        out.push(component);
    }
    out
}

/// Create a symlink at `link` pointing to `target`.
///
/// # Errors
///
/// Returns an error if the link cannot be created.
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                target.display()
            )
        })?;
    }

    #[cfg(windows)]
    {
        let resolved = link.parent().map_or_else(|| target.to_path_buf(), |p| p.join(target));
        let result = if resolved.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                target.display()
            )
        })?;
    }

    Ok(())
}

/// Remove a symlink or file at `path`.
///
/// On Windows, directory symlinks must be removed with `remove_dir`; the
/// raw `FILE_ATTRIBUTE_DIRECTORY` flag tells them apart.
///
/// # Errors
///
/// Returns an error if the metadata cannot be read or the entry cannot be
/// removed.
pub fn remove_symlink(path: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("reading metadata: {}", path.display()))?;
    if is_dir_like(&meta) {
        std::fs::remove_dir(path)
            .with_context(|| format!("removing directory link: {}", path.display()))?;
    } else {
        std::fs::remove_file(path).with_context(|| format!("removing file: {}", path.display()))?;
    }
    Ok(())
}

fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

/// Move `from` to `to`, rewriting a relative symlink so it keeps pointing
/// at the same place from its new location.
///
/// Plain files (and absolute symlinks) are renamed; when the rename would
/// cross filesystems they are copied and the original removed.
///
/// # Errors
///
/// Returns an error if the source cannot be read, the destination cannot
/// be written, or the source cannot be removed afterwards.
pub fn move_adjust(from: &Path, to: &Path) -> Result<()> {
    if let Ok(target) = std::fs::read_link(from)
        && target.is_relative()
    {
        let dest = link_destination(from).unwrap_or(target);
        let to_dir = to.parent().unwrap_or_else(|| Path::new(""));
        create_symlink(&relative_path(to_dir, &dest), to)?;
        return remove_symlink(from);
    }

    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(e) => {
            Err(e).with_context(|| format!("moving {} to {}", from.display(), to.display()))
        }
    }
}

/// Cross-filesystem fallback for [`move_adjust`].
fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    if let Ok(target) = std::fs::read_link(from) {
        create_symlink(&target, to)?;
    } else {
        std::fs::copy(from, to)
            .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
    }
    std::fs::remove_file(from).with_context(|| format!("removing {}", from.display()))
}
