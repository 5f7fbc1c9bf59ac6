//! The public contract surface: an explicit engine handle created by
//! `mount` and consumed by every other operation, rather than any
//! process-wide global state.

use log::{debug, info, warn};

use crate::block::{BlockDevice, BLOCK_SIZE};
use crate::dir::{valid_filename, RootDir, FS_FILE_MAX_COUNT};
use crate::error::{FsError, FsResult};
use crate::fat::Fat;
use crate::io_engine;
use crate::open_file::OpenFileTable;
use crate::superblock::Superblock;

/// A mounted ECS150FS image. Owns the in-memory superblock, FAT, root
/// directory and open-file table for exactly one mounted disk; dropping it
/// without calling `umount` discards any unflushed metadata changes (spec
/// §5).
pub struct Fs<D> {
    device: D,
    superblock: Superblock,
    fat: Fat,
    root: RootDir,
    open_files: OpenFileTable,
}

impl<D: BlockDevice> Fs<D> {
    /// Mount `device` as an ECS150FS image: validate the superblock,
    /// load the FAT and root directory, and start with an empty open-file
    /// table.
    pub fn mount(mut device: D) -> FsResult<Self> {
        let mut block0 = [0u8; BLOCK_SIZE];
        device.read_block(0, &mut block0)?;
        let superblock = Superblock::parse(&block0)?;

        if device.block_count() != superblock.total_blk_count as usize {
            return Err(FsError::BlockCountMismatch {
                device: device.block_count(),
                superblock: superblock.total_blk_count as usize,
            });
        }

        let mut fat_blocks = Vec::with_capacity(superblock.fat_blk_count as usize);
        for i in 0..superblock.fat_blk_count as usize {
            let mut block = [0u8; BLOCK_SIZE];
            device.read_block(1 + i, &mut block)?;
            fat_blocks.push(block);
        }
        let fat = Fat::from_blocks(&fat_blocks, superblock.data_blk_count as usize);

        let mut root_block = [0u8; BLOCK_SIZE];
        device.read_block(superblock.root_blk_index as usize, &mut root_block)?;
        let root = RootDir::from_block(&root_block);

        info!(
            "mounted ECS150FS: {} total blocks, {} data blocks, {} FAT blocks",
            superblock.total_blk_count, superblock.data_blk_count, superblock.fat_blk_count
        );

        Ok(Fs {
            device,
            superblock,
            fat,
            root,
            open_files: OpenFileTable::new(),
        })
    }

    /// Flush the superblock, FAT and root directory back to disk and
    /// consume this handle. Fails (without discarding in-memory state's
    /// ownership, which is still released) if any descriptor is live.
    pub fn umount(mut self) -> FsResult<()> {
        if self.open_files.live_count() != 0 {
            warn!("umount refused: open descriptors remain");
            return Err(FsError::FileStillOpen);
        }
        self.flush()?;
        info!("unmounted ECS150FS");
        Ok(())
    }

    fn flush(&mut self) -> FsResult<()> {
        self.device.write_block(0, &self.superblock.serialize())?;
        self.device
            .write_block(self.superblock.root_blk_index as usize, &self.root.to_block())?;
        for (i, block) in self
            .fat
            .to_blocks(self.superblock.fat_blk_count as usize)
            .into_iter()
            .enumerate()
        {
            self.device.write_block(1 + i, &block)?;
        }
        Ok(())
    }

    /// The `FS Info:` report, as an owned string rather than a direct print,
    /// so callers decide where it goes.
    pub fn info(&self) -> String {
        let data_blk_count = self.superblock.data_blk_count as usize;
        let fat_free = self.fat.free_count();
        let rdir_free = FS_FILE_MAX_COUNT - self.root.present_count();
        format!(
            "FS Info:\n\
             total_blk_count={}\n\
             fat_blk_count={}\n\
             rdir_blk={}\n\
             data_blk={}\n\
             data_blk_count={}\n\
             fat_free_ratio={}/{}\n\
             rdir_free_ratio={}/{}\n",
            self.superblock.total_blk_count,
            self.superblock.fat_blk_count,
            self.superblock.root_blk_index,
            self.superblock.data_blk_start_index,
            data_blk_count,
            fat_free,
            data_blk_count,
            rdir_free,
            FS_FILE_MAX_COUNT,
        )
    }

    /// The `FS Ls:` report, as an owned string.
    pub fn ls(&self) -> String {
        let mut out = String::from("FS Ls:\n");
        for (_, entry) in self.root.enumerate() {
            out.push_str(&format!(
                "file: {}, size: {}, data_blk: {}\n",
                String::from_utf8_lossy(entry.name_bytes()),
                entry.size(),
                entry.start_blk_index(),
            ));
        }
        out
    }

    pub fn create(&mut self, name: &str) -> FsResult<()> {
        let name_bytes = name_with_nul(name);
        self.root.create(&name_bytes, &mut self.fat)?;
        debug!("created {}", name);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> FsResult<()> {
        let name_bytes = name_with_nul(name);
        if !valid_filename(&name_bytes) {
            return Err(FsError::InvalidName);
        }
        let dir_index = self.root.lookup(&name_bytes).ok_or(FsError::NameNotFound)?;
        if self.open_files.has_open_reference(dir_index) {
            return Err(FsError::FileStillOpen);
        }
        self.root.delete(&name_bytes, &mut self.fat)?;
        debug!("deleted {}", name);
        Ok(())
    }

    pub fn open(&mut self, name: &str) -> FsResult<usize> {
        let name_bytes = name_with_nul(name);
        if !valid_filename(&name_bytes) {
            return Err(FsError::InvalidName);
        }
        let dir_index = self.root.lookup(&name_bytes).ok_or(FsError::NameNotFound)?;
        let fd = self.open_files.open(dir_index)?;
        debug!("opened {} as fd {}", name, fd);
        Ok(fd)
    }

    pub fn close(&mut self, fd: usize) -> FsResult<()> {
        self.open_files.close(fd)
    }

    pub fn stat(&self, fd: usize) -> FsResult<u32> {
        let dir_index = self.open_files.dir_index(fd)?;
        Ok(self.root.entry(dir_index).size())
    }

    pub fn lseek(&mut self, fd: usize, offset: u32) -> FsResult<()> {
        let dir_index = self.open_files.dir_index(fd)?;
        let size = self.root.entry(dir_index).size();
        self.open_files.lseek(fd, offset, size)
    }

    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> FsResult<usize> {
        io_engine::read(
            &mut self.open_files,
            &self.root,
            &self.fat,
            &mut self.device,
            self.superblock.data_blk_start_index as usize,
            fd,
            buf,
        )
    }

    pub fn write(&mut self, fd: usize, buf: &[u8]) -> FsResult<usize> {
        io_engine::write(
            &mut self.open_files,
            &mut self.root,
            &mut self.fat,
            &mut self.device,
            self.superblock.data_blk_start_index as usize,
            fd,
            buf,
        )
    }
}

/// Append a NUL terminator, matching the on-disk convention that an entry's
/// name is the bytes before the first NUL.
fn name_with_nul(name: &str) -> Vec<u8> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    bytes
}
