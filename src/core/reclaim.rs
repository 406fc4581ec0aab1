//! Cluster reclamation
//!
//! Freeing an object only releases its clusters. Unlinking it from its owner
//! directory, and freeing the subtree of a directory, is up to the caller.

use crate::core::volume::{ObjectIndex, Volume};
use tracing::debug;

impl Volume {
    /// Return every cluster of an object's chain to the free pool
    ///
    /// Returns the number of clusters released. Cluster contents are left in
    /// place; only the allocation status changes.
    pub fn free_object(&mut self, head: ObjectIndex) -> usize {
        let chain: Vec<_> = self.chain(head).collect();
        for &cluster in &chain {
            self.free_cluster(cluster);
        }

        debug!("Freed object {} ({} clusters)", head, chain.len());
        chain.len()
    }
}
