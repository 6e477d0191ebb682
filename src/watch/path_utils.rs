// src/watch/path_utils.rs

//! Path and event helpers for the watcher.

use std::path::Path;

use notify::event::{EventKind, ModifyKind};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to comparing canonical paths, which matters on platforms
/// where the same directory shows up under different prefixes
/// (`/private/var` on macOS).
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    let root_canon = root.canonicalize().ok()?;
    // A removed file cannot be canonicalized; its parent usually can.
    let path_canon = path.canonicalize().ok().or_else(|| {
        let parent = path.parent()?.canonicalize().ok()?;
        Some(parent.join(path.file_name()?))
    })?;
    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Create, data change, rename and remove count; access and metadata
/// events do not.
pub fn is_content_event(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RenameMode};
    use std::path::PathBuf;

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = PathBuf::from("/site");
        assert_eq!(
            relative_str(&root, Path::new("/site/src/styles/a.css")).as_deref(),
            Some("src/styles/a.css")
        );
    }

    #[test]
    fn only_content_events_count() {
        assert!(is_content_event(&EventKind::Create(CreateKind::File)));
        assert!(is_content_event(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(is_content_event(&EventKind::Modify(ModifyKind::Name(RenameMode::Any))));
        assert!(!is_content_event(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::Any
        ))));
        assert!(!is_content_event(&EventKind::Access(AccessKind::Any)));
    }
}
