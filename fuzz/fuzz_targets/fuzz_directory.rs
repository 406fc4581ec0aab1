#![no_main]
use clusterfs::{NodeType, StoreConfig, Volume};
use libfuzzer_sys::{
    arbitrary::{Arbitrary, Unstructured},
    fuzz_target,
};

#[derive(Debug, Arbitrary)]
enum DirOp {
    Append(u32),
    Remove(u16),
    Get(u16),
}

// Directory table operations never panic and the count stays consistent
fuzz_target!(|input: &[u8]| {
    let mut u = Unstructured::new(input);
    let ops: Vec<DirOp> = match u.arbitrary() {
        Ok(ops) => ops,
        Err(_) => return,
    };

    let mut vol = Volume::new(&StoreConfig::with_clusters(64, 512)).unwrap();
    let dir = vol.create_object(NodeType::Directory, 0, "dir").unwrap();
    let mut count = 0u32;

    for op in ops.iter().take(512) {
        match *op {
            DirOp::Append(child) => {
                if vol.append_entry(dir, child).is_ok() {
                    count += 1;
                }
            }
            DirOp::Remove(index) => {
                let ok = vol.remove_entry(dir, index as u32).is_ok();
                assert_eq!(ok, (index as u32) < count);
                if ok {
                    count -= 1;
                }
            }
            DirOp::Get(index) => {
                assert_eq!(vol.get_entry(dir, index as u32).is_ok(), (index as u32) < count);
            }
        }
        assert_eq!(vol.entry_count(dir), count);
    }
});
