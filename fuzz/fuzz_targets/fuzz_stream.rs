#![no_main]
use clusterfs::{NodeType, StoreConfig, Volume};
use libfuzzer_sys::{arbitrary::Unstructured, fuzz_target};

// Appends must read back as their concatenation, even when the store fills up
fuzz_target!(|input: &[u8]| {
    let mut u = Unstructured::new(input);
    let chunks: Vec<Vec<u8>> = match u.arbitrary() {
        Ok(chunks) => chunks,
        Err(_) => return,
    };

    let mut vol = Volume::new(&StoreConfig::with_clusters(32, 512)).unwrap();
    let file = vol.create_object(NodeType::File, 0, "fuzz").unwrap();
    let mut expected = Vec::new();

    for chunk in chunks.iter().take(16) {
        let before = vol.file_size(file) as usize;
        match vol.write(file, chunk) {
            Ok(()) => expected.extend_from_slice(chunk),
            Err(_) => {
                let kept = vol.file_size(file) as usize - before;
                expected.extend_from_slice(&chunk[..kept]);
                break;
            }
        }
    }

    assert_eq!(vol.read_all(file), expected);
});
