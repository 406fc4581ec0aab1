//! The engine context
//!
//! A [`Volume`] owns the byte store, its geometry and the allocation cursor.
//! Every engine operation is a method on it; the object model, directory
//! table, stream I/O, path resolver and reclaimer live in their own modules as
//! further `impl Volume` blocks.

use crate::core::allocator::{self, ClusterAllocator, NextFitAllocator};
use crate::core::config::{Geometry, StoreConfig};
use crate::core::error::Result;
use crate::core::header::{ClusterHeader, ClusterState, NodeHeader};
use crate::core::store::ByteStore;
use serde::Serialize;
use tracing::debug;

/// Head cluster index of an object; also its identity
pub type ObjectIndex = u32;

/// Index of any cluster in the store
pub type ClusterIndex = u32;

#[derive(Debug, Clone)]
pub struct Volume {
    pub(crate) store: ByteStore,
    pub(crate) geometry: Geometry,
    pub(crate) allocator: NextFitAllocator,
}

/// Space usage snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeStats {
    pub disk_size: u64,
    pub cluster_size: u32,
    pub cluster_count: u32,
    pub reserved_clusters: u32,
    pub used_clusters: u32,
    pub free_clusters: u32,
}

impl Volume {
    /// Create a zeroed, formatted volume
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let geometry = config.geometry()?;
        let mut volume = Volume {
            store: ByteStore::new(geometry.disk_size as usize),
            geometry,
            allocator: NextFitAllocator::new(&geometry),
        };
        volume.format();
        Ok(volume)
    }

    /// Wrap an existing store, e.g. one loaded from an image
    pub(crate) fn from_store(store: ByteStore, geometry: Geometry) -> Self {
        Volume {
            store,
            geometry,
            allocator: NextFitAllocator::new(&geometry),
        }
    }

    /// Mark every cluster free and rewind the allocation cursor
    pub fn format(&mut self) {
        debug!(
            "Formatting {} clusters of {} bytes",
            self.geometry.cluster_count, self.geometry.cluster_size
        );
        allocator::format(&mut self.store, &self.geometry);
        self.allocator.reset();
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn cluster_size(&self) -> u32 {
        self.geometry.cluster_size
    }

    pub fn store(&self) -> &ByteStore {
        &self.store
    }

    /// Allocate one cluster (marks it used, does not initialise it)
    pub fn allocate_cluster(&mut self) -> Result<ClusterIndex> {
        self.allocator.allocate(&mut self.store)
    }

    /// Release one cluster
    pub fn free_cluster(&mut self, index: ClusterIndex) {
        self.allocator.free(&mut self.store, index);
    }

    pub fn is_allocated(&self, index: ClusterIndex) -> bool {
        index < self.geometry.cluster_count
            && allocator::cluster_state(&self.store, index) == ClusterState::Used
    }

    pub fn cluster_header(&self, index: ClusterIndex) -> ClusterHeader {
        ClusterHeader::read_from(&self.store, self.geometry.cluster_offset(index))
    }

    pub fn write_cluster_header(&mut self, index: ClusterIndex, header: &ClusterHeader) {
        let offset = self.geometry.cluster_offset(index);
        header.write_to(&mut self.store, offset);
    }

    pub fn node_header(&self, index: ObjectIndex) -> Result<NodeHeader> {
        NodeHeader::read_from(&self.store, self.geometry.cluster_offset(index))
    }

    pub fn write_node_header(&mut self, index: ObjectIndex, header: &NodeHeader) {
        let offset = self.geometry.cluster_offset(index);
        header.write_to(&mut self.store, offset);
    }

    /// Iterate over every cluster of the chain starting at `head`
    pub fn chain(&self, head: ClusterIndex) -> ChainIter<'_> {
        ChainIter {
            volume: self,
            current: Some(head),
        }
    }

    pub fn used_clusters(&self) -> u32 {
        allocator::used_clusters(&self.store, &self.geometry)
    }

    pub fn free_clusters(&self) -> u32 {
        self.geometry.usable_clusters() - self.used_clusters()
    }

    /// Highest cluster index in use
    pub fn high_water_mark(&self) -> Option<ClusterIndex> {
        allocator::high_water_mark(&self.store, &self.geometry)
    }

    pub fn stats(&self) -> VolumeStats {
        let used = self.used_clusters();
        VolumeStats {
            disk_size: self.geometry.disk_size,
            cluster_size: self.geometry.cluster_size,
            cluster_count: self.geometry.cluster_count,
            reserved_clusters: self.geometry.first_usable,
            used_clusters: used,
            free_clusters: self.geometry.usable_clusters() - used,
        }
    }
}

/// Forward walk over a cluster chain
pub struct ChainIter<'a> {
    volume: &'a Volume,
    current: Option<ClusterIndex>,
}

impl Iterator for ChainIter<'_> {
    type Item = ClusterIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let header = self.volume.cluster_header(index);
        self.current = (!header.is_tail()).then_some(header.next);
        Some(index)
    }
}
