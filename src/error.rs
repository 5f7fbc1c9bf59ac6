use std::io;

use thiserror::Error;

/// Everything that can go wrong talking to an ECS150FS image.
///
/// Every fallible operation in the crate returns `Result<_, FsError>`
/// instead of the C original's bare `-1`; the variant carries the cause a
/// caller would otherwise have to infer from context.
#[derive(Debug, Error)]
pub enum FsError {
    /// The backing block device reported an I/O failure.
    #[error("block device I/O error: {0}")]
    Io(#[from] io::Error),

    /// Block 0's signature did not read back as `ECS150FS`.
    #[error("bad superblock signature")]
    BadSignature,

    /// The superblock's offset fields are inconsistent with each other
    /// (`root_blk_index`, `data_blk_start_index`, `total_blk_count`).
    #[error("superblock layout fields are inconsistent")]
    InvalidLayout,

    /// The block device's block count does not match the superblock's
    /// recorded `total_blk_count`.
    #[error("block count mismatch: device has {device}, superblock expects {superblock}")]
    BlockCountMismatch { device: usize, superblock: usize },

    /// A filename failed validation: must be NUL-terminated within 16 bytes
    /// and non-empty.
    #[error("invalid filename")]
    InvalidName,

    /// `create` was called with a name that already exists.
    #[error("file already exists")]
    DuplicateName,

    /// `open`/`delete` was called with a name that does not exist.
    #[error("file not found")]
    NameNotFound,

    /// The root directory has no free entry left.
    #[error("root directory is full")]
    DirectoryFull,

    /// The FAT has no free block left.
    #[error("FAT has no free blocks")]
    FatFull,

    /// The open-file table has no free descriptor left.
    #[error("open-file table is full")]
    TableFull,

    /// A descriptor was out of `[0, FS_OPEN_MAX_COUNT)` or not bound to a
    /// file.
    #[error("invalid file descriptor")]
    InvalidDescriptor,

    /// `lseek` was asked to move past the end of the file.
    #[error("seek offset out of range")]
    OffsetOutOfRange,

    /// `delete` or `umount` would orphan a live descriptor.
    #[error("file still has an open descriptor")]
    FileStillOpen,
}

pub type FsResult<T> = Result<T, FsError>;
