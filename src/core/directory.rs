//! Directory table
//!
//! A directory's payload is a packed array of 4-byte child object indices
//! spread over its cluster chain. The head cluster's entries start after
//! [`HEADER_SIZE`] bytes, continuation clusters' entries after
//! [`CLUSTER_HEADER_SIZE`], so an entry's position has to be computed by
//! walking the chain.
//!
//! Removal only compacts the cluster holding the removed entry, and append
//! fills the first cluster with room, so clusters in the middle of a chain may
//! be partially filled.

use crate::core::error::{ClusterError, Result};
use crate::core::header::{
    reserved_header_size, NodeHeader, CLUSTER_HEADER_SIZE, DIRECTORY_ENTRY_SIZE, HEADER_SIZE,
};
use crate::core::volume::{ClusterIndex, ObjectIndex, Volume};
use tracing::debug;

/// Physical position of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryLocation {
    /// Cluster holding the entry
    pub cluster: ClusterIndex,
    /// Header bytes reserved at the start of that cluster
    pub header_size: u32,
    /// Entry position within that cluster
    pub slot: u32,
}

impl EntryLocation {
    /// Byte offset of the entry relative to its cluster start
    pub fn offset(&self) -> u32 {
        self.header_size + self.slot * DIRECTORY_ENTRY_SIZE
    }
}

impl Volume {
    /// Find the cluster holding entry `index` of directory `dir`
    pub fn locate_entry_cluster(&self, dir: ObjectIndex, index: u32) -> Option<EntryLocation> {
        let mut cluster = dir;
        let mut header_size = HEADER_SIZE;
        let mut slot = index;
        let mut header = self.cluster_header(cluster);

        while header_size as u64 + slot as u64 * DIRECTORY_ENTRY_SIZE as u64 >= header.length as u64 {
            if header.is_tail() {
                return None;
            }
            slot -= header.length.saturating_sub(header_size) / DIRECTORY_ENTRY_SIZE;
            cluster = header.next;
            header_size = CLUSTER_HEADER_SIZE;
            header = self.cluster_header(cluster);
        }

        Some(EntryLocation {
            cluster,
            header_size,
            slot,
        })
    }

    /// Number of entries in a directory
    pub fn entry_count(&self, dir: ObjectIndex) -> u32 {
        self.chain(dir)
            .enumerate()
            .map(|(position, cluster)| {
                self.cluster_header(cluster)
                    .length
                    .saturating_sub(reserved_header_size(position))
                    / DIRECTORY_ENTRY_SIZE
            })
            .sum()
    }

    /// Child object stored at entry `index`
    pub fn get_entry(&self, dir: ObjectIndex, index: u32) -> Result<ObjectIndex> {
        let location = self
            .locate_entry_cluster(dir, index)
            .ok_or(ClusterError::EntryOutOfRange {
                directory: dir,
                index,
            })?;
        let offset = self.geometry.cluster_offset(location.cluster) + location.offset() as usize;
        Ok(self.store.read_u32(offset))
    }

    /// All children in table order
    pub fn entries(&self, dir: ObjectIndex) -> Vec<ObjectIndex> {
        let mut children = Vec::new();
        for (position, cluster) in self.chain(dir).enumerate() {
            let base = self.geometry.cluster_offset(cluster);
            let length = self.cluster_header(cluster).length;
            let mut offset = reserved_header_size(position);
            while offset + DIRECTORY_ENTRY_SIZE <= length {
                children.push(self.store.read_u32(base + offset as usize));
                offset += DIRECTORY_ENTRY_SIZE;
            }
        }
        children
    }

    /// Append a child to the first cluster of the directory with room,
    /// extending the chain when every cluster is full
    pub fn append_entry(&mut self, dir: ObjectIndex, object: ObjectIndex) -> Result<()> {
        let cluster_size = self.geometry.cluster_size;
        let mut cluster = dir;

        loop {
            let mut header = self.cluster_header(cluster);
            if header.length >= cluster_size {
                cluster = if header.is_tail() {
                    self.extend_cluster(cluster)?
                } else {
                    header.next
                };
                continue;
            }

            let offset = self.geometry.cluster_offset(cluster) + header.length as usize;
            self.store.write_u32(offset, object);
            header.length += DIRECTORY_ENTRY_SIZE;
            self.write_cluster_header(cluster, &header);

            debug!(
                "Added object {} to directory {} (cluster {})",
                object, dir, cluster
            );
            return Ok(());
        }
    }

    /// Remove entry `index`, shifting the following entries of the same
    /// cluster down one slot
    pub fn remove_entry(&mut self, dir: ObjectIndex, index: u32) -> Result<()> {
        let location = self
            .locate_entry_cluster(dir, index)
            .ok_or(ClusterError::EntryOutOfRange {
                directory: dir,
                index,
            })?;

        let mut header = self.cluster_header(location.cluster);
        let base = self.geometry.cluster_offset(location.cluster);
        let entry = base + location.offset() as usize;
        let following = base + header.length as usize - (entry + DIRECTORY_ENTRY_SIZE as usize);
        self.store
            .copy_within(entry + DIRECTORY_ENTRY_SIZE as usize, entry, following);

        header.length -= DIRECTORY_ENTRY_SIZE;
        self.write_cluster_header(location.cluster, &header);

        debug!("Removed entry {} from directory {}", index, dir);
        Ok(())
    }

    /// Position and index of the first child named `name`
    pub fn find_child(&self, dir: ObjectIndex, name: &str) -> Option<(u32, ObjectIndex)> {
        self.entries(dir)
            .into_iter()
            .enumerate()
            .find(|&(_, child)| {
                NodeHeader::name_matches(&self.store, self.geometry.cluster_offset(child), name)
            })
            .map(|(position, child)| (position as u32, child))
    }
}
