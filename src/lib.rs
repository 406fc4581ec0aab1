//! # clusterfs - cluster-based filesystem over a flat byte store
//!
//! `clusterfs` carves a single in-memory byte store into fixed-size clusters
//! and builds a hierarchical filesystem on top:
//!
//! - **Cluster chains** link variable-length objects through `next` pointers
//! - **Next-fit allocation** tracked by one status byte per cluster
//! - **Directories** are packed tables of child object indices
//! - **Images** persist the used prefix of the store as a single file
//!
//! The engine lives in [`core`](crate::core); [`ClusterFs`] is a path-based facade that
//! keeps a root and a working directory.
//!
//! ## Quick Start
//!
//! ```rust
//! use clusterfs::{ClusterFs, Result, StoreConfig};
//!
//! # fn main() -> Result<()> {
//! let mut fs = ClusterFs::create(&StoreConfig::with_clusters(256, 512))?;
//!
//! fs.mkdir("docs")?;
//! fs.touch("docs/readme", b"Hello, World!")?;
//! fs.append("docs/readme", b" Again.")?;
//!
//! assert_eq!(fs.read_file("/docs/readme")?, b"Hello, World! Again.");
//!
//! fs.cd("docs")?;
//! assert_eq!(fs.pwd(), "/docs");
//! assert_eq!(fs.list("")?.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod pack;
pub mod shell;

pub use crate::core::{
    config::{StoreConfig, DEFAULT_CLUSTER_SIZE, DEFAULT_DISK_SIZE},
    error::{ClusterError, Result},
    header::{NodeType, CLUSTER_HEADER_SIZE, DIRECTORY_ENTRY_SIZE, HEADER_SIZE, MAX_NAME_LEN},
    path::{split_path, FilepathClusterInfo},
    shared::SharedVolume,
    validation::NodeName,
    volume::{ObjectIndex, Volume, VolumeStats},
};

use crate::core::path::SEPARATOR;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Name given to the root directory of a new store
pub const ROOT_NAME: &str = "root";

/// Permissions of directories created through [`ClusterFs`]
pub const DIRECTORY_PERMISSIONS: u32 = 0o755;

/// Permissions of files created through [`ClusterFs`]
pub const FILE_PERMISSIONS: u32 = 0o644;

/// Metadata about one object, as shown by `ls` and `stat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Name stored in the node header
    pub name: String,

    /// Head cluster index
    pub index: ObjectIndex,

    pub node_type: NodeType,

    pub permissions: u32,

    /// Payload bytes (for directories, the size of the entry table)
    pub size: u64,

    /// Clusters in the object's chain
    pub clusters: usize,

    /// Number of children, directories only
    pub children: Option<u32>,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }
}

/// Path-based filesystem API
///
/// Wraps a [`Volume`] together with its root directory and a working
/// directory. The working directory is kept as the stack of directories
/// walked to reach it, so `cd ..` works even though objects store no parent
/// pointer.
///
/// # Examples
///
/// ```rust
/// use clusterfs::{ClusterFs, StoreConfig};
///
/// let mut fs = ClusterFs::create(&StoreConfig::with_clusters(64, 512))?;
/// fs.mkdir("a")?;
/// fs.touch("a/b", b"hi")?;
/// assert_eq!(fs.size_of("a/b")?, 2);
/// # Ok::<(), clusterfs::ClusterError>(())
/// ```
#[derive(Debug)]
pub struct ClusterFs {
    volume: Volume,
    root: ObjectIndex,
    /// Root first, working directory last
    cwd: Vec<(String, ObjectIndex)>,
}

impl ClusterFs {
    /// Format a new store and create its root directory
    pub fn create(config: &StoreConfig) -> Result<Self> {
        info!(
            "Creating store of {} bytes ({} byte clusters)",
            config.disk_size, config.cluster_size
        );
        let mut volume = Volume::new(config)?;
        volume.create_object(NodeType::Directory, DIRECTORY_PERMISSIONS, ROOT_NAME)?;
        Self::from_volume(volume)
    }

    /// Open an image written by [`ClusterFs::save`]
    pub fn open<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<Self> {
        info!("Opening store image {:?}", path.as_ref());
        Self::from_volume(Volume::open_image(path, config)?)
    }

    /// Wrap a volume whose root directory already exists
    pub fn from_volume(volume: Volume) -> Result<Self> {
        let root = volume.verify_root()?;
        Ok(ClusterFs {
            volume,
            root,
            cwd: vec![(String::new(), root)],
        })
    }

    /// Write the used part of the store to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        self.volume.save_image(path)
    }

    pub fn root(&self) -> ObjectIndex {
        self.root
    }

    /// Current working directory
    pub fn cwd(&self) -> ObjectIndex {
        self.cwd.last().map_or(self.root, |&(_, index)| index)
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn volume_mut(&mut self) -> &mut Volume {
        &mut self.volume
    }

    pub fn into_volume(self) -> Volume {
        self.volume
    }

    pub fn stats(&self) -> VolumeStats {
        self.volume.stats()
    }

    /// Resolve a path relative to the working directory
    pub fn resolve(&self, path: &str) -> Result<FilepathClusterInfo> {
        self.volume.resolve(self.root, self.cwd(), path)
    }

    /// Resolve a path, failing with `NotFound` when any component is missing
    pub fn lookup(&self, path: &str) -> Result<FilepathClusterInfo> {
        let info = self.resolve(path)?;
        if !info.is_found() {
            return Err(ClusterError::NotFound(path.to_string()));
        }
        Ok(info)
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.resolve(path)?.is_found())
    }

    /// Create a directory. Its parent must exist.
    pub fn mkdir(&mut self, path: &str) -> Result<ObjectIndex> {
        debug!("mkdir {}", path);
        self.create_node(path, NodeType::Directory, DIRECTORY_PERMISSIONS)
    }

    /// Create a file holding `content`. Its parent must exist.
    pub fn touch(&mut self, path: &str, content: &[u8]) -> Result<ObjectIndex> {
        debug!("touch {} ({} bytes)", path, content.len());
        let file = self.create_node(path, NodeType::File, FILE_PERMISSIONS)?;
        self.volume.write(file, content)?;
        Ok(file)
    }

    /// Append `data` to an existing file
    pub fn append(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let file = self.file_at(path)?;
        self.volume.write(file, data)
    }

    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let file = self.file_at(path)?;
        Ok(self.volume.read_all(file))
    }

    /// Payload size of a file in bytes
    pub fn size_of(&self, path: &str) -> Result<u64> {
        let file = self.file_at(path)?;
        Ok(self.volume.file_size(file))
    }

    /// Children of a directory in table order
    pub fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let dir = self.dir_at(path)?;
        self.volume
            .entries(dir)
            .into_iter()
            .map(|child| self.entry(child))
            .collect()
    }

    pub fn stat(&self, path: &str) -> Result<Entry> {
        let info = self.lookup(path)?;
        self.entry(info.object_index)
    }

    /// Metadata of the object at `index`
    pub fn entry(&self, index: ObjectIndex) -> Result<Entry> {
        let header = self.volume.node_header(index)?;
        let children = (header.node_type == NodeType::Directory)
            .then(|| self.volume.entry_count(index));

        Ok(Entry {
            name: header.name,
            index,
            node_type: header.node_type,
            permissions: header.permissions,
            size: self.volume.file_size(index),
            clusters: self.volume.chain_len(index),
            children,
        })
    }

    /// Change the working directory
    ///
    /// Understands `.` and `..` components; `..` at the root stays there.
    pub fn cd(&mut self, path: &str) -> Result<()> {
        let mut stack = if path.starts_with(SEPARATOR) {
            vec![(String::new(), self.root)]
        } else {
            self.cwd.clone()
        };

        for component in split_path(path) {
            match component {
                "." => {}
                ".." => {
                    if stack.len() > 1 {
                        stack.pop();
                    }
                }
                name => {
                    let current = stack.last().map_or(self.root, |&(_, index)| index);
                    let (_, child) = self
                        .volume
                        .find_child(current, name)
                        .ok_or_else(|| ClusterError::NotFound(path.to_string()))?;
                    if self.volume.node_type(child)? != NodeType::Directory {
                        return Err(ClusterError::NotADirectory(path.to_string()));
                    }
                    stack.push((name.to_string(), child));
                }
            }
        }

        self.cwd = stack;
        debug!("Working directory is now {}", self.pwd());
        Ok(())
    }

    /// Absolute path of the working directory
    pub fn pwd(&self) -> String {
        if self.cwd.len() <= 1 {
            return SEPARATOR.to_string();
        }
        self.cwd[1..]
            .iter()
            .map(|(name, _)| format!("{}{}", SEPARATOR, name))
            .collect()
    }

    /// Unlink an object from its directory and reclaim its clusters
    ///
    /// Non-empty directories are refused unless `recursive` is set, in which
    /// case the whole subtree is reclaimed. Returns the number of clusters
    /// freed.
    pub fn remove(&mut self, path: &str, recursive: bool) -> Result<usize> {
        let info = self.lookup(path)?;
        let object = info.object_index;

        if self.cwd.iter().any(|&(_, index)| index == object) {
            return Err(ClusterError::InUse(path.to_string()));
        }
        if self.volume.node_type(object)? == NodeType::Directory
            && self.volume.entry_count(object) > 0
            && !recursive
        {
            return Err(ClusterError::DirectoryNotEmpty(path.to_string()));
        }

        self.volume.remove_entry(info.owner_index, info.relative_index)?;
        let freed = self.free_tree(object)?;

        info!("Removed {} ({} clusters freed)", path, freed);
        Ok(freed)
    }

    fn free_tree(&mut self, object: ObjectIndex) -> Result<usize> {
        let mut pending = vec![object];
        let mut freed = 0;

        while let Some(index) = pending.pop() {
            if self.volume.node_type(index)? == NodeType::Directory {
                pending.extend(self.volume.entries(index));
            }
            freed += self.volume.free_object(index);
        }

        Ok(freed)
    }

    /// Create an empty object of any type under an existing directory
    pub fn create_node(
        &mut self,
        path: &str,
        node_type: NodeType,
        permissions: u32,
    ) -> Result<ObjectIndex> {
        let (parent_path, name) = split_parent(path)?;
        let parent = self.dir_at(parent_path)?;

        if self.volume.find_child(parent, name).is_some() {
            return Err(ClusterError::AlreadyExists(path.to_string()));
        }

        let object = self.volume.create_object(node_type, permissions, name)?;
        if let Err(e) = self.volume.append_entry(parent, object) {
            self.volume.free_object(object);
            return Err(e);
        }

        Ok(object)
    }

    fn file_at(&self, path: &str) -> Result<ObjectIndex> {
        let object = self.lookup(path)?.object_index;
        if self.volume.node_type(object)? != NodeType::File {
            return Err(ClusterError::NotAFile(path.to_string()));
        }
        Ok(object)
    }

    fn dir_at(&self, path: &str) -> Result<ObjectIndex> {
        let object = self.lookup(path)?.object_index;
        if self.volume.node_type(object)? != NodeType::Directory {
            return Err(ClusterError::NotADirectory(path.to_string()));
        }
        Ok(object)
    }
}

/// Split `path` into its parent path and final component
///
/// `"a/b/c"` gives `("a/b", "c")`, `"/c"` gives `("/", "c")` and `"c"` gives
/// `("", "c")`.
fn split_parent(path: &str) -> Result<(&str, &str)> {
    let trimmed = path.trim_end_matches(SEPARATOR);
    let (parent, name) = match trimmed.rfind(SEPARATOR) {
        Some(0) => ("/", &trimmed[1..]),
        Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
        None => ("", trimmed),
    };

    if name.is_empty() {
        return Err(ClusterError::InvalidName(path.to_string()));
    }
    Ok((parent, name))
}
