//! Host directory packer
//!
//! Mirrors a host directory tree into a fresh store: directories become
//! directory objects, regular files become file objects holding the file
//! contents, and symbolic links become symlink objects holding the link
//! target. Entries are visited sorted by name with parents before children,
//! so the same tree always packs to the same image.

use crate::core::config::StoreConfig;
use crate::core::error::{ClusterError, Result};
use crate::core::header::NodeType;
use crate::{ClusterFs, DIRECTORY_PERMISSIONS, FILE_PERMISSIONS};
use serde::Serialize;
use std::fs::Metadata;
use std::io;
use std::path::{Component, Path};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Summary of a pack run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackReport {
    pub directories: u32,
    pub files: u32,
    pub symlinks: u32,
    /// File payload bytes copied
    pub bytes: u64,
    /// Clusters in use after packing, root directory included
    pub clusters_used: u32,
    /// Size of the image the store saves to
    pub image_size: u64,
}

impl PackReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Pack `source` into a new in-memory store
pub fn pack_directory<P: AsRef<Path>>(
    source: P,
    config: &StoreConfig,
) -> Result<(ClusterFs, PackReport)> {
    let source = source.as_ref();
    if !source.is_dir() {
        return Err(ClusterError::NotADirectory(source.display().to_string()));
    }

    info!("Packing {:?}", source);
    let mut fs = ClusterFs::create(config)?;
    let mut report = PackReport::default();

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let path = store_path(relative);
        let metadata = entry.metadata().map_err(io::Error::from)?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let permissions = permissions_of(&metadata, DIRECTORY_PERMISSIONS);
            fs.create_node(&path, NodeType::Directory, permissions)?;
            report.directories += 1;
        } else if file_type.is_symlink() {
            let target = std::fs::read_link(entry.path())?;
            let object = fs.create_node(&path, NodeType::Symlink, 0o777)?;
            fs.volume_mut().write(object, target.to_string_lossy().as_bytes())?;
            report.symlinks += 1;
        } else if file_type.is_file() {
            let data = std::fs::read(entry.path())?;
            let permissions = permissions_of(&metadata, FILE_PERMISSIONS);
            let object = fs.create_node(&path, NodeType::File, permissions)?;
            fs.volume_mut().write(object, &data)?;
            report.files += 1;
            report.bytes += data.len() as u64;
        } else {
            warn!("Skipping {:?}: not a file, directory or symlink", entry.path());
            continue;
        }

        debug!("Packed {}", path);
    }

    report.clusters_used = fs.stats().used_clusters;
    report.image_size = fs.volume().image_len() as u64;

    info!(
        "Packed {} directories, {} files ({} bytes) into {} clusters",
        report.directories, report.files, report.bytes, report.clusters_used
    );
    Ok((fs, report))
}

/// Pack `source` and write the resulting image to `image`
pub fn pack_to_image<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    image: Q,
    config: &StoreConfig,
) -> Result<PackReport> {
    let (fs, report) = pack_directory(source, config)?;
    fs.save(image)?;
    Ok(report)
}

/// Absolute store path for a path relative to the packed directory
fn store_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(format!("/{}", name.to_string_lossy())),
            _ => None,
        })
        .collect()
}

#[cfg(unix)]
fn permissions_of(metadata: &Metadata, _default: u32) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permissions_of(_metadata: &Metadata, default: u32) -> u32 {
    default
}
