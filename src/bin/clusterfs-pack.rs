//! clusterfs packer
//!
//! Packs a host directory tree into a store image and prints a JSON report.

use anyhow::{Context, Result};
use clap::Parser;
use clusterfs::pack::pack_to_image;
use clusterfs::StoreConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clusterfs-pack")]
#[command(about = "Pack a host directory into a clusterfs image")]
struct Args {
    /// Directory to pack
    source: PathBuf,

    /// Image file to write
    #[arg(short, long)]
    output: PathBuf,

    /// Store configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the store size in bytes
    #[arg(long)]
    disk_size: Option<u64>,

    /// Override the cluster size in bytes
    #[arg(long)]
    cluster_size: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

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

    info!("Packing {:?} into {:?}", args.source, args.output);
    let report = pack_to_image(&args.source, &args.output, &config)
        .with_context(|| format!("Failed to pack {:?}", args.source))?;

    println!("{}", report.to_json()?);
    Ok(())
}
