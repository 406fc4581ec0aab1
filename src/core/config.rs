//! Store geometry configuration
//!
//! A store is described by two numbers: its total size and the cluster size.
//! Everything else (cluster count, size of the allocation status region) is
//! derived into a [`Geometry`].
//!
//! ```toml
//! disk_size = 819200000
//! cluster_size = 512
//! ```

use crate::core::error::{ClusterError, Result};
use crate::core::header::{DIRECTORY_ENTRY_SIZE, HEADER_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default store size (800MB)
pub const DEFAULT_DISK_SIZE: u64 = 819_200_000;

/// Default cluster size in bytes
pub const DEFAULT_CLUSTER_SIZE: u32 = 512;

/// User-facing store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Total size of the backing byte store
    pub disk_size: u64,

    /// Size of a single cluster (allocation unit)
    pub cluster_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            disk_size: DEFAULT_DISK_SIZE,
            cluster_size: DEFAULT_CLUSTER_SIZE,
        }
    }
}

impl StoreConfig {
    /// Configuration with `clusters` clusters of `cluster_size` bytes each
    pub fn with_clusters(clusters: u32, cluster_size: u32) -> Self {
        StoreConfig {
            disk_size: clusters as u64 * cluster_size as u64,
            cluster_size,
        }
    }

    /// Parse a configuration from TOML text. Missing keys fall back to defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that the geometry can host at least one object
    pub fn validate(&self) -> Result<()> {
        let cluster_size = self.cluster_size as u64;

        if cluster_size % DIRECTORY_ENTRY_SIZE as u64 != 0 {
            return Err(ClusterError::InvalidConfig(format!(
                "cluster size {} is not a multiple of {}",
                self.cluster_size, DIRECTORY_ENTRY_SIZE
            )));
        }

        // A head cluster must fit its headers plus at least one directory entry
        if cluster_size < (HEADER_SIZE + DIRECTORY_ENTRY_SIZE) as u64 {
            return Err(ClusterError::InvalidConfig(format!(
                "cluster size {} is smaller than {} bytes",
                self.cluster_size,
                HEADER_SIZE + DIRECTORY_ENTRY_SIZE
            )));
        }

        if self.disk_size % cluster_size != 0 {
            return Err(ClusterError::InvalidConfig(format!(
                "disk size {} is not a multiple of the cluster size {}",
                self.disk_size, self.cluster_size
            )));
        }

        let cluster_count = self.disk_size / cluster_size;
        if cluster_count > u32::MAX as u64 {
            return Err(ClusterError::InvalidConfig(format!(
                "{} clusters do not fit a 32-bit cluster index",
                cluster_count
            )));
        }

        let first_usable = cluster_count / cluster_size + 1;
        if first_usable >= cluster_count {
            return Err(ClusterError::InvalidConfig(format!(
                "no usable clusters: {} clusters, {} reserved for allocation status",
                cluster_count, first_usable
            )));
        }

        Ok(())
    }

    /// Validate and derive the store geometry
    pub fn geometry(&self) -> Result<Geometry> {
        self.validate()?;
        let cluster_count = (self.disk_size / self.cluster_size as u64) as u32;
        Ok(Geometry {
            disk_size: self.disk_size,
            cluster_size: self.cluster_size,
            cluster_count,
            first_usable: cluster_count / self.cluster_size + 1,
        })
    }
}

/// Derived, validated store layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub disk_size: u64,
    pub cluster_size: u32,
    pub cluster_count: u32,
    /// First cluster past the allocation status region. Doubles as the root
    /// directory's index on a freshly formatted store.
    pub first_usable: u32,
}

impl Geometry {
    /// Absolute byte offset of a cluster
    #[inline]
    pub fn cluster_offset(&self, index: u32) -> usize {
        index as usize * self.cluster_size as usize
    }

    /// Number of clusters that can ever be handed out
    pub fn usable_clusters(&self) -> u32 {
        self.cluster_count - self.first_usable
    }
}
