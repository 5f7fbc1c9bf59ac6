//! The ECS150FS superblock: block 0 of every mounted image.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use index_fixed::index_fixed;

use crate::block::BLOCK_SIZE;
use crate::error::{FsError, FsResult};

const SIGNATURE: &[u8; 8] = b"ECS150FS";

/// In-memory copy of block 0. Holds the parsed fields directly (not the raw
/// bytes) since the superblock is tiny and every field is used on every
/// mount; `serialize` re-renders it into a full block on unmount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub total_blk_count: u16,
    pub root_blk_index: u16,
    pub data_blk_start_index: u16,
    pub data_blk_count: u16,
    pub fat_blk_count: u8,
}

impl Superblock {
    /// Parse a freshly-read block 0, validating the signature and the
    /// offset invariants tying the superblock's fields together.
    pub fn parse(block: &[u8; BLOCK_SIZE]) -> FsResult<Self> {
        let signature: &[u8; 8] = index_fixed!(block; 0, ..8);
        if signature != SIGNATURE {
            return Err(FsError::BadSignature);
        }

        let mut rdr = Cursor::new(&block[8..]);
        let total_blk_count = rdr.read_u16::<LittleEndian>()?;
        let root_blk_index = rdr.read_u16::<LittleEndian>()?;
        let data_blk_start_index = rdr.read_u16::<LittleEndian>()?;
        let data_blk_count = rdr.read_u16::<LittleEndian>()?;
        let fat_blk_count = rdr.read_u8()?;

        let sb = Superblock {
            total_blk_count,
            root_blk_index,
            data_blk_start_index,
            data_blk_count,
            fat_blk_count,
        };

        if sb.root_blk_index != 1 + sb.fat_blk_count as u16 {
            return Err(FsError::InvalidLayout);
        }
        if sb.data_blk_start_index != sb.root_blk_index + 1 {
            return Err(FsError::InvalidLayout);
        }
        if sb.total_blk_count != sb.data_blk_start_index + sb.data_blk_count {
            return Err(FsError::InvalidLayout);
        }

        Ok(sb)
    }

    /// Render this superblock back into a full, zero-padded block.
    pub fn serialize(&self) -> [u8; BLOCK_SIZE] {
        let mut block = [0u8; BLOCK_SIZE];
        block[0..8].copy_from_slice(SIGNATURE);
        {
            let mut w = &mut block[8..];
            w.write_u16::<LittleEndian>(self.total_blk_count).unwrap();
            w.write_u16::<LittleEndian>(self.root_blk_index).unwrap();
            w.write_u16::<LittleEndian>(self.data_blk_start_index).unwrap();
            w.write_u16::<LittleEndian>(self.data_blk_count).unwrap();
            w.write_u8(self.fat_blk_count).unwrap();
        }
        // remaining 4079 bytes stay zero
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden(total: u16, root: u16, data_start: u16, data_count: u16, fat_blk: u8) -> [u8; BLOCK_SIZE] {
        let sb = Superblock {
            total_blk_count: total,
            root_blk_index: root,
            data_blk_start_index: data_start,
            data_blk_count: data_count,
            fat_blk_count: fat_blk,
        };
        sb.serialize()
    }

    #[test]
    fn round_trips_through_golden_bytes() {
        let block = golden(1026, 2, 3, 1023, 1);
        let sb = Superblock::parse(&block).unwrap();
        assert_eq!(sb.total_blk_count, 1026);
        assert_eq!(sb.root_blk_index, 2);
        assert_eq!(sb.data_blk_start_index, 3);
        assert_eq!(sb.data_blk_count, 1023);
        assert_eq!(sb.fat_blk_count, 1);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut block = golden(1026, 2, 3, 1023, 1);
        block[0] = b'X';
        assert!(matches!(Superblock::parse(&block), Err(FsError::BadSignature)));
    }

    #[test]
    fn rejects_inconsistent_offsets() {
        let mut block = golden(1026, 2, 3, 1023, 1);
        // corrupt root_blk_index so root_blk_index != 1 + fat_blk_count
        block[10] = 9;
        assert!(matches!(Superblock::parse(&block), Err(FsError::InvalidLayout)));
    }

    #[test]
    fn padding_is_zeroed() {
        let block = golden(1026, 2, 3, 1023, 1);
        assert!(block[13..].iter().all(|&b| b == 0));
    }
}
