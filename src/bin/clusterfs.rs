//! clusterfs interactive shell
//!
//! Formats an in-memory store (or loads a saved image) and reads commands
//! from standard input.

use anyhow::{Context, Result};
use clap::Parser;
use clusterfs::shell::Shell;
use clusterfs::{ClusterFs, StoreConfig};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clusterfs")]
#[command(about = "Interactive shell over a cluster-based in-memory filesystem")]
struct Args {
    /// Store configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load a previously saved image instead of formatting a new store
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Override the store size in bytes
    #[arg(long)]
    disk_size: Option<u64>,

    /// Override the cluster size in bytes
    #[arg(long)]
    cluster_size: Option<u32>,

    /// Save the store to this image when the shell exits
    #[arg(short, long)]
    save: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::from_file(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => StoreConfig::default(),
    };

    if let Some(disk_size) = args.disk_size {
        config.disk_size = disk_size;
    }
    if let Some(cluster_size) = args.cluster_size {
        config.cluster_size = cluster_size;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    // Log lines go to stderr and stay quiet unless asked for
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let fs = match &args.image {
        Some(image) => ClusterFs::open(image, &config)
            .with_context(|| format!("Failed to open image {:?}", image))?,
        None => ClusterFs::create(&config)?,
    };

    let stats = fs.stats();
    println!("Disk size: {}", stats.disk_size);
    println!("Cluster size: {}", stats.cluster_size);
    println!(
        "Usable disk space: {}",
        stats.free_clusters as u64 * stats.cluster_size as u64
    );

    let mut shell = Shell::new(fs);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    shell.run(stdin.lock(), &mut stdout)?;

    if let Some(path) = &args.save {
        let bytes = shell.fs().save(path)?;
        info!("Saved {} bytes to {:?}", bytes, path);
    }

    Ok(())
}
