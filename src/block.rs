//! The block device adapter: the fixed-size, block-indexed contract
//! everything else in the crate is written against.
//!
//! The backing store itself is an external collaborator: this module only
//! adapts a byte-addressed, positional store (`io_at::{ReadAt, WriteAt}`)
//! into the fixed-size, block-indexed contract every other module is
//! written against.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use io_at::{ReadAt, WriteAt};

/// Fixed block size for every ECS150FS image.
pub const BLOCK_SIZE: usize = 4096;

/// The contract every higher-level module addresses storage through.
///
/// The minimal surface every higher-level module needs: block count,
/// full-block read, full-block write.
pub trait BlockDevice {
    /// Total number of `BLOCK_SIZE` blocks in the image.
    fn block_count(&self) -> usize;

    /// Read block `index` in full into `buf`.
    fn read_block(&mut self, index: usize, buf: &mut [u8; BLOCK_SIZE]) -> io::Result<()>;

    /// Write `buf` to block `index` in full.
    fn write_block(&mut self, index: usize, buf: &[u8; BLOCK_SIZE]) -> io::Result<()>;
}

/// A `BlockDevice` over anything that implements positional read/write,
/// i.e. `io_at::{ReadAt, WriteAt}`. `FileBlockDevice` below is the common
/// instantiation; tests use an in-memory store instead.
pub struct GenericBlockDevice<S> {
    store: S,
    block_count: usize,
}

impl<S: ReadAt + WriteAt> GenericBlockDevice<S> {
    /// Wrap `store`, which is already known to hold `block_count` blocks.
    pub fn new(store: S, block_count: usize) -> Self {
        GenericBlockDevice { store, block_count }
    }

    fn offset_of(index: usize) -> u64 {
        (index as u64) * (BLOCK_SIZE as u64)
    }
}

impl<S: ReadAt + WriteAt> BlockDevice for GenericBlockDevice<S> {
    fn block_count(&self) -> usize {
        self.block_count
    }

    fn read_block(&mut self, index: usize, buf: &mut [u8; BLOCK_SIZE]) -> io::Result<()> {
        // io_at's `read_at` is pread-like and does not promise to fill the
        // whole buffer in one call; loop until it does or hits EOF/error.
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .store
                .read_at(&mut buf[filled..], Self::offset_of(index) + filled as u64)?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "short read from block device",
                ));
            }
            filled += n;
        }
        Ok(())
    }

    fn write_block(&mut self, index: usize, buf: &[u8; BLOCK_SIZE]) -> io::Result<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self
                .store
                .write_at(&buf[written..], Self::offset_of(index) + written as u64)?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "short write to block device",
                ));
            }
            written += n;
        }
        Ok(())
    }
}

/// A `BlockDevice` backed by a real file on disk, the concrete collaborator
/// behind `mount(path)`.
pub type FileBlockDevice = GenericBlockDevice<File>;

impl FileBlockDevice {
    /// Open `path` as a block device. Block count is derived from the
    /// file's current length, which must be a whole number of `BLOCK_SIZE`
    /// blocks.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        if len % (BLOCK_SIZE as u64) != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "disk image length is not a multiple of the block size",
            ));
        }
        let block_count = (len / BLOCK_SIZE as u64) as usize;
        Ok(GenericBlockDevice::new(file, block_count))
    }
}
