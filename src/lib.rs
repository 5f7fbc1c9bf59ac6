/**
 * ECS150FS: a userspace, FAT-style filesystem over a single disk image.
 *
 * Layout of a mounted image, in 4096-byte blocks:
 *
 * .                      | offs               | size (blocks)
 * superblock              | 0                  | 1
 * FAT                     | 1                  | fat_blk_count
 * root directory          | 1 + fat_blk_count  | 1
 * data region              | root_blk_index + 1 | data_blk_count
 *
 * The FAT is an array of 16-bit entries, one per data block. Using FAT
 * entries as "next pointers", data blocks are formed into chains; a file's
 * root-directory entry records only the chain's first block and the file's
 * byte length, with the chain's length always consistent with that size.
 *
 * The root directory is a single block of 128 fixed-size entries. There is
 * no subdirectory support and no on-disk free-space bitmap beyond the FAT
 * itself.
 *
 * Mounting, and every operation on a mounted image, goes through an explicit
 * `Fs<D>` handle rather than process-wide state; formatting a fresh image is
 * out of scope for this crate.
 */
pub mod block;
pub mod dir;
pub mod error;
pub mod fat;
pub mod fs;
pub mod io_engine;
pub mod open_file;
pub mod superblock;

pub use block::{BlockDevice, FileBlockDevice, BLOCK_SIZE};
pub use error::{FsError, FsResult};
pub use fs::Fs;
