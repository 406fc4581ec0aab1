//! Storage engine
//!
//! The engine operates on a single flat [`store::ByteStore`] carved into
//! fixed-size clusters. [`volume::Volume`] ties the store, its geometry and
//! the allocator together; every other module adds operations to it.

pub mod allocator;
pub mod config;
pub mod directory;
pub mod error;
pub mod header;
pub mod image;
pub mod object;
pub mod path;
pub mod reclaim;
pub mod shared;
pub mod store;
pub mod stream;
pub mod validation;
pub mod volume;

pub use config::{Geometry, StoreConfig};
pub use error::{ClusterError, Result};
pub use header::{ClusterHeader, NodeHeader, NodeType};
pub use path::FilepathClusterInfo;
pub use shared::SharedVolume;
pub use volume::{ClusterIndex, ObjectIndex, Volume, VolumeStats};
