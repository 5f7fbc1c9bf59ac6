//! End-to-end scenarios against the public `Fs<D>` surface, built on
//! hand-assembled in-memory disk images since formatting a fresh image is
//! out of scope for the library itself.

use std::cell::RefCell;
use std::rc::Rc;

use ecs150fs::dir::RootDir;
use ecs150fs::fat::{Fat, FAT_EOC};
use ecs150fs::superblock::Superblock;
use ecs150fs::{BlockDevice, FsError, BLOCK_SIZE};

/// Shares its backing blocks through an `Rc<RefCell<_>>` so a test can mount
/// a second handle over the same storage after the first is unmounted,
/// without the library needing any reopen/reconnect concept of its own.
#[derive(Clone)]
struct MemBlockDevice {
    blocks: Rc<RefCell<Vec<[u8; BLOCK_SIZE]>>>,
}

impl BlockDevice for MemBlockDevice {
    fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    fn read_block(&mut self, index: usize, buf: &mut [u8; BLOCK_SIZE]) -> std::io::Result<()> {
        buf.copy_from_slice(&self.blocks.borrow()[index]);
        Ok(())
    }

    fn write_block(&mut self, index: usize, buf: &[u8; BLOCK_SIZE]) -> std::io::Result<()> {
        self.blocks.borrow_mut()[index] = *buf;
        Ok(())
    }
}

/// Build a freshly-formatted image with `data_blk_count` data blocks, one
/// FAT block range sized to fit them, and an empty root directory.
fn format_image(data_blk_count: usize) -> MemBlockDevice {
    let fat_blk_count = ((data_blk_count * 2) + BLOCK_SIZE - 1) / BLOCK_SIZE;
    let root_blk_index = 1 + fat_blk_count;
    let data_blk_start_index = root_blk_index + 1;
    let total_blk_count = data_blk_start_index + data_blk_count;

    let superblock = Superblock {
        total_blk_count: total_blk_count as u16,
        root_blk_index: root_blk_index as u16,
        data_blk_start_index: data_blk_start_index as u16,
        data_blk_count: data_blk_count as u16,
        fat_blk_count: fat_blk_count as u8,
    };

    let mut blocks = vec![[0u8; BLOCK_SIZE]; total_blk_count];
    blocks[0] = superblock.serialize();

    let mut fat = Fat::from_blocks(&vec![[0u8; BLOCK_SIZE]; fat_blk_count], data_blk_count);
    fat.set(0, FAT_EOC);
    for (i, block) in fat.to_blocks(fat_blk_count).into_iter().enumerate() {
        blocks[1 + i] = block;
    }

    let root = RootDir::from_block(&[0u8; BLOCK_SIZE]);
    blocks[root_blk_index] = root.to_block();

    MemBlockDevice {
        blocks: Rc::new(RefCell::new(blocks)),
    }
}

#[test]
fn scenario_1_create_then_info() {
    let _ = env_logger::try_init();
    let device = format_image(1024);
    let mut fs = ecs150fs::Fs::mount(device).unwrap();
    fs.create("a.txt").unwrap();
    let info = fs.info();
    assert!(info.contains("rdir_free_ratio=127/128"));
    assert!(info.contains("fat_free_ratio=1022/1024"));
}

#[test]
fn scenario_2_write_close_reopen_read() {
    let device = format_image(1024);
    let mut fs = ecs150fs::Fs::mount(device).unwrap();
    fs.create("a.txt").unwrap();

    let fd = fs.open("a.txt").unwrap();
    assert_eq!(fs.write(fd, b"hello").unwrap(), 5);
    fs.close(fd).unwrap();

    let fd = fs.open("a.txt").unwrap();
    assert_eq!(fs.stat(fd).unwrap(), 5);
    fs.lseek(fd, 0).unwrap();
    let mut buf = [0u8; 10];
    let n = fs.read(fd, &mut buf).unwrap();
    assert_eq!(n, 5);
    assert_eq!(&buf[..5], b"hello");
}

#[test]
fn scenario_3_delete_while_open_then_after_close() {
    let device = format_image(1024);
    let mut fs = ecs150fs::Fs::mount(device).unwrap();
    fs.create("a.txt").unwrap();
    let fd = fs.open("a.txt").unwrap();

    assert!(matches!(fs.delete("a.txt"), Err(FsError::FileStillOpen)));

    fs.close(fd).unwrap();
    fs.delete("a.txt").unwrap();
    assert_eq!(fs.ls(), "FS Ls:\n");
}

#[test]
fn scenario_4_directory_full_at_129th_create() {
    let device = format_image(1024);
    let mut fs = ecs150fs::Fs::mount(device).unwrap();
    for i in 0..128 {
        fs.create(&format!("f{}", i)).unwrap();
    }
    assert!(matches!(fs.create("one_too_many"), Err(FsError::DirectoryFull)));
}

#[test]
fn scenario_5_full_capacity_write_then_short_write() {
    let device = format_image(1024);
    let mut fs = ecs150fs::Fs::mount(device).unwrap();
    fs.create("big.bin").unwrap();
    let fd = fs.open("big.bin").unwrap();

    let payload = vec![0xABu8; 1023 * BLOCK_SIZE];
    let n = fs.write(fd, &payload).unwrap();
    assert_eq!(n, 1023 * BLOCK_SIZE);

    let short = fs.write(fd, &[0x11]).unwrap();
    assert_eq!(short, 0);
}

#[test]
fn scenario_6_round_trip_through_umount_mount() {
    let device = format_image(1024);
    let reopened = device.clone();

    let mut fs = ecs150fs::Fs::mount(device).unwrap();
    fs.create("big.bin").unwrap();
    let fd = fs.open("big.bin").unwrap();
    let payload = vec![0xABu8; 1023 * BLOCK_SIZE];
    fs.write(fd, &payload).unwrap();
    fs.close(fd).unwrap();
    fs.umount().unwrap();

    let mut fs2 = ecs150fs::Fs::mount(reopened).unwrap();
    let fd = fs2.open("big.bin").unwrap();
    let mut buf = vec![0u8; payload.len()];
    let n = fs2.read(fd, &mut buf).unwrap();
    assert_eq!(n, payload.len());
    assert_eq!(buf, payload);
}

#[test]
fn read_past_eof_returns_zero() {
    let device = format_image(8);
    let mut fs = ecs150fs::Fs::mount(device).unwrap();
    fs.create("a.txt").unwrap();
    let fd = fs.open("a.txt").unwrap();
    fs.write(fd, b"hi").unwrap();
    fs.lseek(fd, 2).unwrap();
    let mut buf = [0xAAu8; 4];
    let n = fs.read(fd, &mut buf).unwrap();
    assert_eq!(n, 0);
    assert_eq!(buf, [0xAA; 4]);
}

#[test]
fn mount_rejects_block_count_mismatch() {
    let device = format_image(8);
    device.blocks.borrow_mut().pop();
    assert!(matches!(
        ecs150fs::Fs::mount(device),
        Err(FsError::BlockCountMismatch { .. })
    ));
}

#[test]
fn create_rejects_invalid_names() {
    let device = format_image(8);
    let mut fs = ecs150fs::Fs::mount(device).unwrap();
    assert!(matches!(fs.create(""), Err(FsError::InvalidName)));
    assert!(matches!(
        fs.create("sixteen_char_nam"),
        Err(FsError::InvalidName)
    ));
}

#[test]
fn open_unknown_file_fails() {
    let device = format_image(8);
    let mut fs = ecs150fs::Fs::mount(device).unwrap();
    assert!(matches!(fs.open("missing.txt"), Err(FsError::NameNotFound)));
}
