#![no_main]
use clusterfs::shell::Shell;
use clusterfs::{ClusterFs, StoreConfig};
use libfuzzer_sys::fuzz_target;

// Arbitrary command lines never bring the shell down
fuzz_target!(|input: &[u8]| {
    let fs = ClusterFs::create(&StoreConfig::with_clusters(64, 512)).unwrap();
    let mut shell = Shell::new(fs);
    let mut out = Vec::new();

    for line in String::from_utf8_lossy(input).lines().take(64) {
        // Keep the fuzzer from writing host files
        if line.trim_start().starts_with("save") {
            continue;
        }
        if shell.execute_line(line, &mut out).is_err() {
            return;
        }
        out.clear();
    }
});
