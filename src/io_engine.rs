//! Byte-granular read/write over a FAT chain.

use crate::block::{BlockDevice, BLOCK_SIZE};
use crate::dir::RootDir;
use crate::error::FsResult;
use crate::fat::Fat;
use crate::open_file::OpenFileTable;

/// Read up to `buf.len()` bytes from `fd`'s current offset, advancing it by
/// the number of bytes actually delivered. Never reads past EOF; returns 0
/// (and writes nothing) when the offset is already at EOF.
pub fn read(
    table: &mut OpenFileTable,
    dir: &RootDir,
    fat: &Fat,
    device: &mut impl BlockDevice,
    data_blk_start_index: usize,
    fd: usize,
    buf: &mut [u8],
) -> FsResult<usize> {
    let dir_index = table.dir_index(fd)?;
    let offset = table.offset(fd)? as usize;
    let entry = dir.entry(dir_index);
    let size = entry.size() as usize;

    let remaining = size.saturating_sub(offset);
    let want = buf.len().min(remaining);
    if want == 0 {
        return Ok(0);
    }

    let start_blk_index = entry.start_blk_index() as usize;
    let first_block = fat.walk(start_blk_index, offset / BLOCK_SIZE);
    let head_gap = offset % BLOCK_SIZE;

    let mut copied = 0usize;
    let mut raw = [0u8; BLOCK_SIZE];
    for (i, block_index) in fat.iter_chain(first_block).enumerate() {
        if copied >= want {
            break;
        }
        device.read_block(data_blk_start_index + block_index, &mut raw)?;
        let block_start = if i == 0 { head_gap } else { 0 };
        let block_end = BLOCK_SIZE.min(block_start + (want - copied));
        let n = block_end - block_start;
        buf[copied..copied + n].copy_from_slice(&raw[block_start..block_end]);
        copied += n;
    }

    table.set_offset_unchecked(fd, (offset + copied) as u32)?;
    Ok(copied)
}

/// Write up to `buf.len()` bytes at `fd`'s current offset, extending the
/// file's chain as needed. A write that would exceed the FAT's remaining
/// capacity is capped to whatever capacity is available (a short write,
/// never an error) and still leaves the chain well-formed.
pub fn write(
    table: &mut OpenFileTable,
    dir: &mut RootDir,
    fat: &mut Fat,
    device: &mut impl BlockDevice,
    data_blk_start_index: usize,
    fd: usize,
    buf: &[u8],
) -> FsResult<usize> {
    let dir_index = table.dir_index(fd)?;
    let offset = table.offset(fd)? as usize;
    let old_size = dir.entry(dir_index).size() as usize;
    let start_blk_index = dir.entry(dir_index).start_blk_index() as usize;

    let desired_end = offset + buf.len();
    let mut capacity = blocks_to_bytes(fat.chain_len(start_blk_index));

    if desired_end > capacity {
        let mut tail = fat
            .iter_chain(start_blk_index)
            .last()
            .unwrap_or(start_blk_index);
        while capacity < desired_end {
            match fat.extend(tail) {
                Some(new_tail) => {
                    tail = new_tail;
                    capacity += BLOCK_SIZE;
                }
                None => break, // FAT full: capacity is whatever we managed to reach
            }
        }
    }

    let bytes_to_write = buf.len().min(capacity.saturating_sub(offset));
    if bytes_to_write == 0 {
        return Ok(0);
    }

    let first_block = fat.walk(start_blk_index, offset / BLOCK_SIZE);
    let head_gap = offset % BLOCK_SIZE;

    let mut written = 0usize;
    let mut raw = [0u8; BLOCK_SIZE];
    for (i, block_index) in fat.iter_chain(first_block).enumerate() {
        if written >= bytes_to_write {
            break;
        }
        let block_start = if i == 0 { head_gap } else { 0 };
        let block_end = BLOCK_SIZE.min(block_start + (bytes_to_write - written));
        let n = block_end - block_start;

        let abs_block = data_blk_start_index + block_index;
        if block_start != 0 || block_end != BLOCK_SIZE {
            // partial block: read-modify-write
            device.read_block(abs_block, &mut raw)?;
        }
        raw[block_start..block_end].copy_from_slice(&buf[written..written + n]);
        device.write_block(abs_block, &raw)?;

        written += n;
    }

    let new_size = old_size.max(offset + written);
    dir.entry_mut(dir_index).set_size(new_size as u32);
    table.set_offset_unchecked(fd, (offset + written) as u32)?;
    Ok(written)
}

fn blocks_to_bytes(blocks: usize) -> usize {
    blocks * BLOCK_SIZE
}
