//! Next-fit cluster allocator with a single wraparound
//!
//! Scanning resumes at the last allocated cluster, which keeps chains that
//! grow one cluster at a time mostly contiguous. When the end of the store is
//! reached the scan restarts once from the first usable cluster to pick up
//! clusters freed behind the cursor.

use crate::core::allocator::{cluster_state, set_cluster_state, ClusterAllocator};
use crate::core::config::Geometry;
use crate::core::error::{ClusterError, Result};
use crate::core::header::ClusterState;
use crate::core::store::ByteStore;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone)]
pub struct NextFitAllocator {
    /// Next cluster to probe
    cursor: u32,
    first_usable: u32,
    cluster_count: u32,
}

impl NextFitAllocator {
    pub fn new(geometry: &Geometry) -> Self {
        NextFitAllocator {
            cursor: geometry.first_usable,
            first_usable: geometry.first_usable,
            cluster_count: geometry.cluster_count,
        }
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }
}

impl ClusterAllocator for NextFitAllocator {
    /// Restart scanning at the first usable cluster
    fn reset(&mut self) {
        self.cursor = self.first_usable;
    }

    /// Find a free cluster, mark it used and return its index
    ///
    /// Fails with `OutOfSpace` without touching the store when every usable
    /// cluster is in use.
    fn allocate(&mut self, store: &mut ByteStore) -> Result<u32> {
        loop {
            let start = self.cursor;
            let found = (start..self.cluster_count)
                .find(|&index| cluster_state(store, index) == ClusterState::Free);

            if let Some(index) = found {
                self.cursor = index;
                set_cluster_state(store, index, ClusterState::Used);
                trace!("Allocated cluster {}", index);
                return Ok(index);
            }

            if start == self.first_usable {
                warn!("No free clusters left ({} usable)", self.cluster_count - self.first_usable);
                return Err(ClusterError::OutOfSpace);
            }

            debug!("Allocator reached cluster {}, wrapping around", self.cluster_count);
            self.cursor = self.first_usable;
        }
    }

    /// Mark a cluster free. Payload bytes are left as they are.
    fn free(&mut self, store: &mut ByteStore, index: u32) {
        if cluster_state(store, index) == ClusterState::Free {
            warn!("Double-free detected for cluster {}", index);
        }
        set_cluster_state(store, index, ClusterState::Free);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocator::used_clusters;
    use crate::core::config::StoreConfig;

    fn setup(clusters: u32) -> (ByteStore, Geometry, NextFitAllocator) {
        let geometry = StoreConfig::with_clusters(clusters, 512).geometry().unwrap();
        let store = ByteStore::new(geometry.disk_size as usize);
        let allocator = NextFitAllocator::new(&geometry);
        (store, geometry, allocator)
    }

    #[test]
    fn test_sequential_allocation() {
        let (mut store, _, mut alloc) = setup(16);

        assert_eq!(alloc.allocate(&mut store).unwrap(), 1);
        assert_eq!(alloc.allocate(&mut store).unwrap(), 2);
        assert_eq!(alloc.allocate(&mut store).unwrap(), 3);
        assert_eq!(alloc.cursor(), 3);
    }

    #[test]
    fn test_never_returns_zero() {
        let (mut store, _, mut alloc) = setup(16);

        while let Ok(index) = alloc.allocate(&mut store) {
            assert_ne!(index, 0);
        }
    }

    #[test]
    fn test_exhaustion() {
        let (mut store, geometry, mut alloc) = setup(16);

        for _ in 0..geometry.usable_clusters() {
            alloc.allocate(&mut store).unwrap();
        }

        let before = store.as_bytes().to_vec();
        assert!(matches!(
            alloc.allocate(&mut store),
            Err(ClusterError::OutOfSpace)
        ));
        assert_eq!(store.as_bytes(), &before[..]);
        assert_eq!(used_clusters(&store, &geometry), 15);
    }

    #[test]
    fn test_freed_cluster_reused_after_wraparound() {
        let (mut store, geometry, mut alloc) = setup(16);

        for _ in 0..geometry.usable_clusters() {
            alloc.allocate(&mut store).unwrap();
        }

        alloc.free(&mut store, 4);
        assert_eq!(alloc.allocate(&mut store).unwrap(), 4);
        assert!(alloc.allocate(&mut store).is_err());
    }

    #[test]
    fn test_next_fit_prefers_cursor() {
        let (mut store, _, mut alloc) = setup(16);

        for _ in 0..5 {
            alloc.allocate(&mut store).unwrap();
        }

        // Cluster 2 is free again but the scan resumes at the cursor
        alloc.free(&mut store, 2);
        assert_eq!(alloc.allocate(&mut store).unwrap(), 6);
    }

    #[test]
    fn test_reset_rescans_from_start() {
        let (mut store, _, mut alloc) = setup(16);

        for _ in 0..5 {
            alloc.allocate(&mut store).unwrap();
        }
        alloc.free(&mut store, 2);
        alloc.reset();

        assert_eq!(alloc.allocate(&mut store).unwrap(), 2);
    }

    #[test]
    fn test_double_free_is_tolerated() {
        let (mut store, geometry, mut alloc) = setup(16);

        let index = alloc.allocate(&mut store).unwrap();
        alloc.free(&mut store, index);
        alloc.free(&mut store, index);

        assert_eq!(used_clusters(&store, &geometry), 0);
    }
}
