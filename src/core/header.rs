//! On-disk cluster and node headers
//!
//! Every cluster starts with an 8-byte [`ClusterHeader`]. The head cluster of
//! an object additionally carries a [`NodeHeader`] right after it:
//!
//! ```text
//! ┌──────────┬──────────┬──────┬─────────────┬──────────┬──────────────────┐
//! │ length   │ next     │ type │ permissions │ name_len │ name + NUL       │
//! │ u32 LE   │ u32 LE   │ u8   │ u32 LE      │ u16 LE   │ name_len bytes   │
//! │ [0..4)   │ [4..8)   │ [8]  │ [9..13)     │ [13..15) │ [15..15+len)     │
//! └──────────┴──────────┴──────┴─────────────┴──────────┴──────────────────┘
//! ```
//!
//! The head cluster reserves [`HEADER_SIZE`] bytes for headers regardless of
//! the actual name length; continuation clusters reserve only
//! [`CLUSTER_HEADER_SIZE`].

use crate::core::error::{ClusterError, Result};
use crate::core::store::ByteStore;
use serde::Serialize;

/// Bytes reserved at the start of every cluster
pub const CLUSTER_HEADER_SIZE: u32 = 8;

/// Bytes reserved at the start of a head cluster (cluster + node header + name)
pub const HEADER_SIZE: u32 = 280;

/// Size of one directory entry (a child object index)
pub const DIRECTORY_ENTRY_SIZE: u32 = 4;

const NODE_TYPE_OFFSET: usize = 8;
const PERMISSIONS_OFFSET: usize = 9;
const NAME_LENGTH_OFFSET: usize = 13;
const NAME_OFFSET: usize = 15;

/// Longest name that fits the reserved head region, excluding the NUL
pub const MAX_NAME_LEN: usize = HEADER_SIZE as usize - NAME_OFFSET - 1;

/// Header bytes reserved at the start of the cluster at `position` in a
/// chain (0 = head cluster)
pub fn reserved_header_size(position: usize) -> u32 {
    if position == 0 {
        HEADER_SIZE
    } else {
        CLUSTER_HEADER_SIZE
    }
}

/// Kind of object stored in a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum NodeType {
    File = 0,
    Directory = 1,
    /// Stored but never interpreted
    Symlink = 2,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(NodeType::File),
            1 => Ok(NodeType::Directory),
            2 => Ok(NodeType::Symlink),
            _ => Err(ClusterError::InvalidNodeType(value)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "file",
            NodeType::Directory => "directory",
            NodeType::Symlink => "symlink",
        }
    }
}

/// Allocation state of a cluster, one status byte per cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClusterState {
    Free = 0,
    Used = 1,
}

/// Header present at the start of every cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterHeader {
    /// Bytes of this cluster in use, headers included
    pub length: u32,
    /// Next cluster of the chain, `0` at the end
    pub next: u32,
}

impl ClusterHeader {
    /// Header of a freshly created head cluster
    pub fn head() -> Self {
        ClusterHeader {
            length: HEADER_SIZE,
            next: 0,
        }
    }

    /// Header of a freshly appended continuation cluster
    pub fn continuation() -> Self {
        ClusterHeader {
            length: CLUSTER_HEADER_SIZE,
            next: 0,
        }
    }

    pub fn is_tail(&self) -> bool {
        self.next == 0
    }

    pub fn read_from(store: &ByteStore, offset: usize) -> Self {
        ClusterHeader {
            length: store.read_u32(offset),
            next: store.read_u32(offset + 4),
        }
    }

    pub fn write_to(&self, store: &mut ByteStore, offset: usize) {
        store.write_u32(offset, self.length);
        store.write_u32(offset + 4, self.next);
    }
}

/// Header present only in the head cluster of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHeader {
    pub node_type: NodeType,
    pub permissions: u32,
    /// Name without the on-disk NUL terminator
    pub name: String,
}

impl NodeHeader {
    pub fn new(node_type: NodeType, permissions: u32, name: impl Into<String>) -> Self {
        NodeHeader {
            node_type,
            permissions,
            name: name.into(),
        }
    }

    /// Encoded name length, terminator included. A caller-supplied trailing
    /// NUL is not doubled.
    pub fn name_length(&self) -> u16 {
        (self.name_bytes().len() + 1) as u16
    }

    fn name_bytes(&self) -> &[u8] {
        let bytes = self.name.as_bytes();
        bytes.strip_suffix(&[0]).unwrap_or(bytes)
    }

    /// Encode the node header relative to the cluster start (offset 8 onward)
    pub fn write_to(&self, store: &mut ByteStore, cluster_offset: usize) {
        let name = self.name_bytes();
        store.write_u8(cluster_offset + NODE_TYPE_OFFSET, self.node_type as u8);
        store.write_u32(cluster_offset + PERMISSIONS_OFFSET, self.permissions);
        store.write_u16(cluster_offset + NAME_LENGTH_OFFSET, self.name_length());
        store.copy_in(cluster_offset + NAME_OFFSET, name);
        store.write_u8(cluster_offset + NAME_OFFSET + name.len(), 0);
    }

    pub fn read_from(store: &ByteStore, cluster_offset: usize) -> Result<Self> {
        let node_type = NodeType::from_u8(store.read_u8(cluster_offset + NODE_TYPE_OFFSET))?;
        let permissions = store.read_u32(cluster_offset + PERMISSIONS_OFFSET);
        let name_length = store.read_u16(cluster_offset + NAME_LENGTH_OFFSET) as usize;
        let raw = store.slice(cluster_offset + NAME_OFFSET, name_length);
        let raw = raw.strip_suffix(&[0]).unwrap_or(raw);

        Ok(NodeHeader {
            node_type,
            permissions,
            name: String::from_utf8_lossy(raw).into_owned(),
        })
    }

    /// Raw on-disk name bytes compare without allocating a `String`
    pub fn name_matches(store: &ByteStore, cluster_offset: usize, name: &str) -> bool {
        let name_length = store.read_u16(cluster_offset + NAME_LENGTH_OFFSET) as usize;
        let raw = store.slice(cluster_offset + NAME_OFFSET, name_length);
        raw.strip_suffix(&[0]).unwrap_or(raw) == name.as_bytes()
    }
}
