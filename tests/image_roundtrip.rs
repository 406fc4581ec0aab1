//! Image persistence and packing end to end

use clusterfs::pack::pack_to_image;
use clusterfs::shell::Shell;
use clusterfs::{ClusterError, ClusterFs, StoreConfig};
use tempfile::TempDir;

fn config() -> StoreConfig {
    StoreConfig::with_clusters(1024, 512)
}

#[test]
fn test_image_preserves_tree_and_free_space() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("store.img");

    let mut fs = ClusterFs::create(&config()).unwrap();
    fs.mkdir("a").unwrap();
    fs.mkdir("a/b").unwrap();
    fs.touch("a/b/file", &vec![42u8; 5000]).unwrap();
    fs.touch("gone", b"temporary").unwrap();
    fs.remove("gone", false).unwrap();
    let stats = fs.stats();
    fs.save(&image).unwrap();

    let mut reopened = ClusterFs::open(&image, &config()).unwrap();
    assert_eq!(reopened.stats(), stats);
    assert_eq!(reopened.read_file("/a/b/file").unwrap(), vec![42u8; 5000]);
    assert!(!reopened.exists("gone").unwrap());

    // The reopened store keeps working, including reuse of freed clusters
    reopened.touch("a/new", b"after reopen").unwrap();
    assert_eq!(reopened.read_file("a/new").unwrap(), b"after reopen");
}

#[test]
fn test_image_only_holds_used_prefix() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("small.img");

    let fs = ClusterFs::create(&config()).unwrap();
    let written = fs.save(&image).unwrap();

    // Two status clusters, cluster 0 and the root directory
    assert_eq!(written, 4 * 512);
    assert_eq!(std::fs::metadata(&image).unwrap().len(), written);
}

#[test]
fn test_open_with_smaller_geometry_fails() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("big.img");

    let mut fs = ClusterFs::create(&config()).unwrap();
    fs.touch("payload", &vec![1u8; 100_000]).unwrap();
    fs.save(&image).unwrap();

    assert!(matches!(
        ClusterFs::open(&image, &StoreConfig::with_clusters(64, 512)),
        Err(ClusterError::ImageTooLarge { .. })
    ));
}

#[test]
fn test_packed_image_in_shell() {
    let source = TempDir::new().unwrap();
    std::fs::create_dir(source.path().join("notes")).unwrap();
    std::fs::write(source.path().join("notes/todo"), b"ship it").unwrap();

    let out = TempDir::new().unwrap();
    let image = out.path().join("packed.img");
    let report = pack_to_image(source.path(), &image, &config()).unwrap();
    assert_eq!(report.directories, 1);
    assert_eq!(report.files, 1);

    let mut shell = Shell::new(ClusterFs::open(&image, &config()).unwrap());
    let mut output = Vec::new();
    shell
        .run(&b"cd notes\nls\nless todo\nsizeof todo\n"[..], &mut output)
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("todo\n"));
    assert!(text.contains("ship it\n"));
    assert!(text.contains("7 bytes\n"));
}
