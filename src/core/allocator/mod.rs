//! Cluster allocation
//!
//! Allocation state is kept on the store itself: the first `first_usable`
//! clusters form a status region holding one byte per cluster
//! (`0` = free, `1` = used) at store offset `index`. Cluster 0 always lies in
//! that region, so index `0` is never handed out and can safely mean "none".

pub mod next_fit;

pub use next_fit::NextFitAllocator;

use crate::core::config::Geometry;
use crate::core::error::Result;
use crate::core::header::ClusterState;
use crate::core::store::ByteStore;

/// Cluster allocation strategy over the on-store status bytes
pub trait ClusterAllocator {
    /// Claim a free cluster and mark it used
    fn allocate(&mut self, store: &mut ByteStore) -> Result<u32>;

    /// Mark a cluster free
    fn free(&mut self, store: &mut ByteStore, index: u32);

    /// Forget any scan position, e.g. after the store was reformatted
    fn reset(&mut self);
}

/// Mark every cluster free
pub fn format(store: &mut ByteStore, geometry: &Geometry) {
    store.fill_zero(0, geometry.cluster_count as usize);
}

pub fn cluster_state(store: &ByteStore, index: u32) -> ClusterState {
    if store.read_u8(index as usize) == ClusterState::Free as u8 {
        ClusterState::Free
    } else {
        ClusterState::Used
    }
}

pub fn set_cluster_state(store: &mut ByteStore, index: u32, state: ClusterState) {
    store.write_u8(index as usize, state as u8);
}

/// Number of used clusters past the status region
pub fn used_clusters(store: &ByteStore, geometry: &Geometry) -> u32 {
    store
        .slice(
            geometry.first_usable as usize,
            geometry.usable_clusters() as usize,
        )
        .iter()
        .filter(|&&state| state != ClusterState::Free as u8)
        .count() as u32
}

/// Highest used cluster index, if any cluster is in use
pub fn high_water_mark(store: &ByteStore, geometry: &Geometry) -> Option<u32> {
    store
        .slice(
            geometry.first_usable as usize,
            geometry.usable_clusters() as usize,
        )
        .iter()
        .rposition(|&state| state != ClusterState::Free as u8)
        .map(|offset| geometry.first_usable + offset as u32)
}
