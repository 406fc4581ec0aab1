//! Sequential byte I/O over an object's cluster chain
//!
//! Writes always append at the end of the object, growing the chain one
//! cluster at a time. Reads start at the beginning and may come back short
//! when the chain holds fewer bytes than requested.

use crate::core::error::Result;
use crate::core::header::reserved_header_size;
use crate::core::volume::{ObjectIndex, Volume};
use tracing::debug;

impl Volume {
    /// Append `data` to the end of an object
    ///
    /// If the store fills up part way, the bytes written so far stay in the
    /// object and `OutOfSpace` is returned.
    pub fn write(&mut self, object: ObjectIndex, data: &[u8]) -> Result<()> {
        let cluster_size = self.geometry.cluster_size;
        let mut cluster = self.chain_tail(object);
        let mut header = self.cluster_header(cluster);
        let mut remaining = data;

        while !remaining.is_empty() {
            if header.length >= cluster_size {
                self.write_cluster_header(cluster, &header);
                cluster = self.extend_cluster(cluster)?;
                header = self.cluster_header(cluster);
            }

            let room = (cluster_size - header.length) as usize;
            let count = room.min(remaining.len());
            let offset = self.geometry.cluster_offset(cluster) + header.length as usize;
            self.store.copy_in(offset, &remaining[..count]);

            header.length += count as u32;
            remaining = &remaining[count..];
        }

        self.write_cluster_header(cluster, &header);
        debug!("Wrote {} bytes to object {}", data.len(), object);
        Ok(())
    }

    /// Read up to `length` bytes from the start of an object
    ///
    /// The returned buffer is shorter than `length` when the chain runs out;
    /// its length is the number of bytes actually read.
    pub fn read(&self, object: ObjectIndex, length: usize) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(length.min(self.file_size(object) as usize));

        for (position, cluster) in self.chain(object).enumerate() {
            if buffer.len() >= length {
                break;
            }

            let header = self.cluster_header(cluster);
            let start = reserved_header_size(position);
            let available = header.length.saturating_sub(start) as usize;
            let count = available.min(length - buffer.len());
            let offset = self.geometry.cluster_offset(cluster) + start as usize;
            buffer.extend_from_slice(self.store.slice(offset, count));
        }

        buffer
    }

    /// Read the whole payload of an object
    pub fn read_all(&self, object: ObjectIndex) -> Vec<u8> {
        self.read(object, self.file_size(object) as usize)
    }

    /// Payload bytes held by an object's chain
    pub fn file_size(&self, object: ObjectIndex) -> u64 {
        self.chain(object)
            .enumerate()
            .map(|(position, cluster)| {
                self.cluster_header(cluster)
                    .length
                    .saturating_sub(reserved_header_size(position)) as u64
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StoreConfig;
    use crate::core::error::ClusterError;
    use crate::core::header::{NodeType, CLUSTER_HEADER_SIZE, HEADER_SIZE};

    const HEAD_PAYLOAD: usize = 512 - HEADER_SIZE as usize;
    const CONT_PAYLOAD: usize = 512 - CLUSTER_HEADER_SIZE as usize;

    fn setup(clusters: u32) -> (Volume, ObjectIndex) {
        let mut vol = Volume::new(&StoreConfig::with_clusters(clusters, 512)).unwrap();
        let file = vol.create_object(NodeType::File, 0o644, "file").unwrap();
        (vol, file)
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_empty_object() {
        let (vol, file) = setup(16);
        assert_eq!(vol.file_size(file), 0);
        assert!(vol.read(file, 0).is_empty());
        assert!(vol.read_all(file).is_empty());
    }

    #[test]
    fn test_small_write_read() {
        let (mut vol, file) = setup(16);
        vol.write(file, b"hi").unwrap();

        assert_eq!(vol.file_size(file), 2);
        assert_eq!(vol.read(file, 2), b"hi");
        assert_eq!(vol.chain_len(file), 1);
    }

    #[test]
    fn test_over_long_read_is_short() {
        let (mut vol, file) = setup(16);
        vol.write(file, b"hi").unwrap();

        assert_eq!(vol.read(file, usize::MAX), b"hi");
        assert_eq!(vol.read(file, 1 << 40), b"hi");
    }

    #[test]
    fn test_writes_append() {
        let (mut vol, file) = setup(16);
        vol.write(file, b"hello, ").unwrap();
        vol.write(file, b"world").unwrap();

        assert_eq!(vol.read_all(file), b"hello, world");
    }

    #[test]
    fn test_exact_head_fill_does_not_extend() {
        let (mut vol, file) = setup(16);
        vol.write(file, &pattern(HEAD_PAYLOAD)).unwrap();

        assert_eq!(vol.chain_len(file), 1);
        assert_eq!(vol.cluster_header(file).length, 512);

        vol.write(file, b"x").unwrap();
        assert_eq!(vol.chain_len(file), 2);
        assert_eq!(vol.file_size(file), HEAD_PAYLOAD as u64 + 1);
    }

    #[test]
    fn test_multi_cluster_round_trip() {
        let (mut vol, file) = setup(64);
        let data = pattern(HEAD_PAYLOAD + 3 * CONT_PAYLOAD + 17);
        vol.write(file, &data).unwrap();

        assert_eq!(vol.chain_len(file), 5);
        assert_eq!(vol.file_size(file), data.len() as u64);
        assert_eq!(vol.read_all(file), data);

        // Every cluster but the last is full
        let chain: Vec<_> = vol.chain(file).collect();
        for &cluster in &chain[..chain.len() - 1] {
            assert_eq!(vol.cluster_header(cluster).length, 512);
        }
        assert_eq!(
            vol.cluster_header(chain[4]).length,
            CLUSTER_HEADER_SIZE + 17
        );
    }

    #[test]
    fn test_short_read() {
        let (mut vol, file) = setup(16);
        vol.write(file, b"short").unwrap();

        let data = vol.read(file, 100);
        assert_eq!(data, b"short");
    }

    #[test]
    fn test_partial_read() {
        let (mut vol, file) = setup(64);
        let data = pattern(1500);
        vol.write(file, &data).unwrap();

        assert_eq!(vol.read(file, 300), &data[..300]);
    }

    #[test]
    fn test_write_out_of_space_keeps_written_bytes() {
        let (mut vol, file) = setup(3);
        let data = pattern(HEAD_PAYLOAD + CONT_PAYLOAD + 10);

        assert!(matches!(
            vol.write(file, &data),
            Err(ClusterError::OutOfSpace)
        ));
        assert_eq!(vol.file_size(file), (HEAD_PAYLOAD + CONT_PAYLOAD) as u64);
        assert_eq!(vol.read_all(file), &data[..HEAD_PAYLOAD + CONT_PAYLOAD]);
    }
}
