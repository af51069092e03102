use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("superblock signature mismatch")]
    InvalidSignature,
    #[error("superblock block count does not match the device")]
    GeometryMismatch,
    #[error("device too small to hold a volume")]
    VolumeTooSmall,
    #[error("block id out of range for the device")]
    InvalidBlockId,
    #[error("device read failed")]
    ReadError,
    #[error("device write failed")]
    WriteError,
    #[error("invalid file name")]
    InvalidFileName,
    #[error("file not found")]
    NotFound,
    #[error("a file with this name already exists")]
    AlreadyExists,
    #[error("root directory is full")]
    RootDirFull,
    #[error("open file table is full")]
    OpenTableFull,
    #[error("descriptor out of range or not open")]
    BadDescriptor,
    #[error("file has open descriptors")]
    FileBusy,
    #[error("offset is beyond the end of the file")]
    OffsetOutOfBounds,
    #[error("block not present in cache")]
    CacheMiss,
}

pub type Result<T> = core::result::Result<T, FsError>;
