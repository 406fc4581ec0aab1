use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Out of space: no free clusters available")]
    OutOfSpace,

    #[error("Entry {index} is out of range for directory {directory}")]
    EntryOutOfRange { directory: u32, index: u32 },

    #[error("Invalid node type: {0}")]
    InvalidNodeType(u8),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is not a directory")]
    NotADirectory(String),

    #[error("{0} is not a file")]
    NotAFile(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("{0} is in use")]
    InUse(String),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Image of {image} bytes does not fit a store of {capacity} bytes")]
    ImageTooLarge { image: u64, capacity: u64 },

    #[error("Root directory missing at cluster {0}")]
    MissingRoot(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
