//! Image persistence
//!
//! An image is the used prefix of the byte store written out as a single
//! blob: the status region plus every cluster up to the highest one in use.
//! Loading copies the blob into a freshly zeroed store of the configured
//! geometry, so trailing free clusters come back as zeros.

use crate::core::config::StoreConfig;
use crate::core::error::{ClusterError, Result};
use crate::core::header::NodeType;
use crate::core::store::ByteStore;
use crate::core::volume::{ObjectIndex, Volume};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

impl Volume {
    /// Number of store bytes an image of this volume holds
    pub fn image_len(&self) -> usize {
        let clusters = match self.high_water_mark() {
            Some(highest) => highest + 1,
            None => self.geometry.first_usable,
        };
        self.geometry.cluster_offset(clusters)
    }

    /// Write the used prefix of the store to `path`
    ///
    /// Returns the number of bytes written.
    pub fn save_image<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let path = path.as_ref();
        let len = self.image_len();
        std::fs::write(path, self.store.slice(0, len))?;

        info!("Saved {} byte image to {:?}", len, path);
        Ok(len as u64)
    }

    /// Load an image written by [`Volume::save_image`]
    ///
    /// The root directory must be present at the first usable cluster.
    pub fn open_image<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        let geometry = config.geometry()?;
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        if size > geometry.disk_size {
            return Err(ClusterError::ImageTooLarge {
                image: size,
                capacity: geometry.disk_size,
            });
        }

        let mut store = ByteStore::new(geometry.disk_size as usize);
        if size > 0 {
            // SAFETY: the mapping is read-only and dropped before returning
            let mmap = unsafe { Mmap::map(&file)? };
            store.copy_in(0, &mmap);
            debug!("Mapped {} byte image from {:?}", mmap.len(), path);
        }

        let volume = Volume::from_store(store, geometry);
        volume.verify_root()?;

        info!("Opened image {:?} ({} clusters in use)", path, volume.used_clusters());
        Ok(volume)
    }

    /// Root directory of a store formatted by this crate
    pub fn root_index(&self) -> ObjectIndex {
        self.geometry.first_usable
    }

    /// Check that the root directory exists and return its index
    pub fn verify_root(&self) -> Result<ObjectIndex> {
        let root = self.root_index();
        let is_directory = self.is_allocated(root)
            && matches!(self.node_type(root), Ok(NodeType::Directory));

        if !is_directory {
            return Err(ClusterError::MissingRoot(root));
        }
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> StoreConfig {
        StoreConfig::with_clusters(64, 512)
    }

    #[test]
    fn test_save_and_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.img");

        let mut vol = Volume::new(&config()).unwrap();
        let root = vol.create_object(NodeType::Directory, 0, "root").unwrap();
        let file = vol.create_object(NodeType::File, 0o644, "hello").unwrap();
        vol.append_entry(root, file).unwrap();
        vol.write(file, b"hello world").unwrap();

        let written = vol.save_image(&path).unwrap();
        // Status cluster + root + file
        assert_eq!(written, 3 * 512);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);

        let loaded = Volume::open_image(&path, &config()).unwrap();
        assert_eq!(loaded.verify_root().unwrap(), root);
        assert_eq!(loaded.entries(root), vec![file]);
        assert_eq!(loaded.read_all(file), b"hello world");
        assert_eq!(loaded.store().as_bytes(), vol.store().as_bytes());
    }

    #[test]
    fn test_image_of_empty_volume_is_status_region() {
        let vol = Volume::new(&config()).unwrap();
        assert_eq!(vol.image_len(), 512);
    }

    #[test]
    fn test_open_missing_root() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.img");

        Volume::new(&config()).unwrap().save_image(&path).unwrap();

        assert!(matches!(
            Volume::open_image(&path, &config()),
            Err(ClusterError::MissingRoot(1))
        ));
    }

    #[test]
    fn test_open_root_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file-root.img");

        let mut vol = Volume::new(&config()).unwrap();
        vol.create_object(NodeType::File, 0, "root").unwrap();
        vol.save_image(&path).unwrap();

        assert!(matches!(
            Volume::open_image(&path, &config()),
            Err(ClusterError::MissingRoot(_))
        ));
    }

    #[test]
    fn test_image_too_large() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.img");
        std::fs::write(&path, vec![0u8; 64 * 512 + 1]).unwrap();

        assert!(matches!(
            Volume::open_image(&path, &config()),
            Err(ClusterError::ImageTooLarge { .. })
        ));
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            Volume::open_image("/nonexistent/store.img", &config()),
            Err(ClusterError::Io(_))
        ));
    }
}
