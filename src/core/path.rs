//! Slash-delimited path resolution
//!
//! Paths are resolved component by component through directory table
//! lookups. A leading `/` starts at the root directory, anything else at the
//! caller's current directory. Non-directory objects are leaves: once a path
//! component matches a file, resolution stops there.

use crate::core::error::Result;
use crate::core::header::NodeType;
use crate::core::volume::{ObjectIndex, Volume};
use tracing::trace;

pub const SEPARATOR: char = '/';

/// Split a path into its non-empty components
///
/// ```
/// use clusterfs::core::path::split_path;
///
/// assert_eq!(split_path("/a//b/c/"), vec!["a", "b", "c"]);
/// assert!(split_path("/").is_empty());
/// ```
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(SEPARATOR)
        .filter(|component| !component.is_empty())
        .collect()
}

/// Result of a path resolution
///
/// When resolution fails, `object_index` is the directory resolution started
/// from (the root for absolute paths) and `found` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilepathClusterInfo {
    /// Resolved object
    pub object_index: ObjectIndex,
    /// Directory containing the resolved object
    pub owner_index: ObjectIndex,
    /// Position of the object in its owner's entry table
    pub relative_index: u32,
    /// Every path component matched
    pub found: bool,
}

impl FilepathClusterInfo {
    fn at(directory: ObjectIndex) -> Self {
        FilepathClusterInfo {
            object_index: directory,
            owner_index: directory,
            relative_index: 0,
            found: true,
        }
    }

    fn not_found(directory: ObjectIndex) -> Self {
        FilepathClusterInfo {
            found: false,
            ..Self::at(directory)
        }
    }

    pub fn is_found(&self) -> bool {
        self.found
    }
}

impl Volume {
    /// Resolve `path` starting from `current`, or from `root` when the path
    /// is absolute
    ///
    /// An empty path (or `/`) resolves to the starting directory itself.
    /// Any component that does not match fails the whole path: the result is
    /// the starting directory with `found` unset, never the deepest directory
    /// matched so far. Files and symlinks are leaves; components after one are
    /// ignored.
    pub fn resolve(
        &self,
        root: ObjectIndex,
        current: ObjectIndex,
        path: &str,
    ) -> Result<FilepathClusterInfo> {
        let start = if path.starts_with(SEPARATOR) {
            root
        } else {
            current
        };

        let mut info = FilepathClusterInfo::at(start);
        for component in split_path(path) {
            let Some((position, child)) = self.find_child(info.object_index, component) else {
                trace!("Component '{}' of '{}' not found", component, path);
                return Ok(FilepathClusterInfo::not_found(start));
            };

            info = FilepathClusterInfo {
                object_index: child,
                owner_index: info.object_index,
                relative_index: position,
                found: true,
            };

            if self.node_type(child)? != NodeType::Directory {
                break;
            }
        }

        Ok(info)
    }
}
