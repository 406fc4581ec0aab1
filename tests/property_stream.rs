//! Property-based tests for stream I/O
//!
//! Whatever way a payload is split into writes, reading it back yields the
//! concatenation, and the chain holds exactly as many clusters as needed.

use clusterfs::{NodeType, StoreConfig, Volume, CLUSTER_HEADER_SIZE, HEADER_SIZE};
use proptest::prelude::*;

const CLUSTER_SIZE: u32 = 512;
const HEAD_PAYLOAD: usize = (CLUSTER_SIZE - HEADER_SIZE) as usize;
const CONT_PAYLOAD: usize = (CLUSTER_SIZE - CLUSTER_HEADER_SIZE) as usize;

fn clusters_for(len: usize) -> usize {
    if len <= HEAD_PAYLOAD {
        1
    } else {
        1 + (len - HEAD_PAYLOAD + CONT_PAYLOAD - 1) / CONT_PAYLOAD
    }
}

fn volume() -> Volume {
    Volume::new(&StoreConfig::with_clusters(128, CLUSTER_SIZE)).unwrap()
}

proptest! {
    #[test]
    fn prop_write_then_read_returns_concatenation(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..700), 0..8)
    ) {
        let mut vol = volume();
        let file = vol.create_object(NodeType::File, 0, "data").unwrap();

        let mut expected = Vec::new();
        for chunk in &chunks {
            vol.write(file, chunk).unwrap();
            expected.extend_from_slice(chunk);
        }

        prop_assert_eq!(vol.file_size(file), expected.len() as u64);
        prop_assert_eq!(vol.read_all(file), expected.clone());
        prop_assert_eq!(vol.chain_len(file), clusters_for(expected.len()));
    }

    #[test]
    fn prop_read_returns_prefix(
        data in prop::collection::vec(any::<u8>(), 0..3000),
        request in 0usize..4000
    ) {
        let mut vol = volume();
        let file = vol.create_object(NodeType::File, 0, "data").unwrap();
        vol.write(file, &data).unwrap();

        let read = vol.read(file, request);
        let expected = request.min(data.len());
        prop_assert_eq!(read.len(), expected);
        prop_assert_eq!(&read[..], &data[..expected]);
    }

    #[test]
    fn prop_interleaved_objects_stay_separate(
        a in prop::collection::vec(any::<u8>(), 1..1500),
        b in prop::collection::vec(any::<u8>(), 1..1500)
    ) {
        let mut vol = volume();
        let first = vol.create_object(NodeType::File, 0, "a").unwrap();
        let second = vol.create_object(NodeType::File, 0, "b").unwrap();

        // Alternate small writes so the two chains interleave in the store
        for (ca, cb) in a.chunks(100).zip(b.chunks(100)) {
            vol.write(first, ca).unwrap();
            vol.write(second, cb).unwrap();
        }
        let written = a.len().min(b.len()).div_ceil(100);
        for ca in a.chunks(100).skip(written) {
            vol.write(first, ca).unwrap();
        }
        for cb in b.chunks(100).skip(written) {
            vol.write(second, cb).unwrap();
        }

        prop_assert_eq!(vol.read_all(first), a);
        prop_assert_eq!(vol.read_all(second), b);
    }
}
