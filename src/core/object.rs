//! Object model
//!
//! An object is a head cluster (cluster header + node header) plus the chain
//! hanging off it. The head cluster index is the object's identity for its
//! whole lifetime.

use crate::core::error::Result;
use crate::core::header::{ClusterHeader, NodeHeader, NodeType};
use crate::core::validation::NodeName;
use crate::core::volume::{ClusterIndex, ObjectIndex, Volume};
use tracing::debug;

impl Volume {
    /// Allocate and initialise a new, empty object
    ///
    /// The name is validated before anything is allocated, so a rejected name
    /// or a full store leaves the volume untouched.
    pub fn create_object(
        &mut self,
        node_type: NodeType,
        permissions: u32,
        name: &str,
    ) -> Result<ObjectIndex> {
        let name = NodeName::new(name)?;
        let index = self.allocate_cluster()?;

        self.write_cluster_header(index, &ClusterHeader::head());
        self.write_node_header(
            index,
            &NodeHeader::new(node_type, permissions, name.into_string()),
        );

        debug!("Created {} object at cluster {}", node_type.as_str(), index);
        Ok(index)
    }

    /// Append a fresh cluster after `index` and return it
    ///
    /// `index` is expected to be the tail of its chain. On allocation failure
    /// the existing cluster is not modified.
    pub fn extend_cluster(&mut self, index: ClusterIndex) -> Result<ClusterIndex> {
        let mut header = self.cluster_header(index);
        let next = self.allocate_cluster()?;

        header.next = next;
        self.write_cluster_header(index, &header);
        self.write_cluster_header(next, &ClusterHeader::continuation());

        debug!("Extended cluster {} with cluster {}", index, next);
        Ok(next)
    }

    /// Last cluster of the chain containing `index`
    pub fn chain_tail(&self, index: ClusterIndex) -> ClusterIndex {
        self.chain(index).last().unwrap_or(index)
    }

    /// Number of clusters in the chain starting at `head`
    pub fn chain_len(&self, head: ClusterIndex) -> usize {
        self.chain(head).count()
    }

    pub fn node_type(&self, index: ObjectIndex) -> Result<NodeType> {
        Ok(self.node_header(index)?.node_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StoreConfig;
    use crate::core::error::ClusterError;
    use crate::core::header::{CLUSTER_HEADER_SIZE, HEADER_SIZE};

    fn volume(clusters: u32) -> Volume {
        Volume::new(&StoreConfig::with_clusters(clusters, 512)).unwrap()
    }

    #[test]
    fn test_create_object_round_trip() {
        let mut vol = volume(64);

        let dir = vol.create_object(NodeType::Directory, 0o755, "docs").unwrap();
        let file = vol.create_object(NodeType::File, 0o644, "notes.txt").unwrap();
        let link = vol.create_object(NodeType::Symlink, 7, "latest").unwrap();

        assert_eq!(
            vol.node_header(dir).unwrap(),
            NodeHeader::new(NodeType::Directory, 0o755, "docs")
        );
        assert_eq!(
            vol.node_header(file).unwrap(),
            NodeHeader::new(NodeType::File, 0o644, "notes.txt")
        );
        assert_eq!(vol.node_type(link).unwrap(), NodeType::Symlink);

        let header = vol.cluster_header(file);
        assert_eq!(header.length, HEADER_SIZE);
        assert_eq!(header.next, 0);
    }

    #[test]
    fn test_invalid_name_allocates_nothing() {
        let mut vol = volume(64);

        assert!(matches!(
            vol.create_object(NodeType::File, 0, "a/b"),
            Err(ClusterError::InvalidName(_))
        ));
        assert_eq!(vol.used_clusters(), 0);
    }

    #[test]
    fn test_create_object_out_of_space() {
        let mut vol = volume(4);

        for i in 0..3 {
            vol.create_object(NodeType::File, 0, &format!("f{}", i)).unwrap();
        }

        assert!(matches!(
            vol.create_object(NodeType::File, 0, "one-too-many"),
            Err(ClusterError::OutOfSpace)
        ));
    }

    #[test]
    fn test_extend_cluster() {
        let mut vol = volume(64);
        let head = vol.create_object(NodeType::File, 0, "data").unwrap();

        let second = vol.extend_cluster(head).unwrap();
        let third = vol.extend_cluster(second).unwrap();

        assert_eq!(vol.cluster_header(head).next, second);
        assert_eq!(vol.cluster_header(second).next, third);
        assert_eq!(
            vol.cluster_header(third),
            ClusterHeader {
                length: CLUSTER_HEADER_SIZE,
                next: 0
            }
        );
        assert_eq!(vol.chain_tail(head), third);
        assert_eq!(vol.chain_tail(third), third);
        assert_eq!(vol.chain_len(head), 3);
    }

    #[test]
    fn test_extend_failure_leaves_cluster_untouched() {
        let mut vol = volume(3);
        let head = vol.create_object(NodeType::File, 0, "data").unwrap();
        vol.extend_cluster(head).unwrap();
        let tail = vol.chain_tail(head);

        let before = vol.cluster_header(tail);
        assert!(matches!(
            vol.extend_cluster(tail),
            Err(ClusterError::OutOfSpace)
        ));
        assert_eq!(vol.cluster_header(tail), before);
    }
}
