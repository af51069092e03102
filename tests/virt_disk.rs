#![allow(unused)]

mod common;

const DISK_BLOCKS: usize = 80;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use quark::{BLOCK_SIZE, BlockDevice, Error, FileSystem};

/// A disk backed by a regular file, the way a volume image would be.
pub struct VirtDisk {
    inner: Mutex<File>,
    num_blocks: usize,
}

impl VirtDisk {
    pub fn create(path: &PathBuf, num_blocks: usize) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.set_len((num_blocks * BLOCK_SIZE) as u64)?;
        Ok(VirtDisk {
            inner: Mutex::new(file),
            num_blocks,
        })
    }
}

impl BlockDevice for VirtDisk {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: u32, buf: &mut [u8; BLOCK_SIZE]) -> quark::Result<()> {
        if block_id as usize >= self.num_blocks {
            return Err(Error::InvalidBlockId);
        }
        let mut inner = self.inner.lock().unwrap();
        inner
            .seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))
            .map_err(|_| Error::ReadError)?;
        inner.read_exact(buf).map_err(|_| Error::ReadError)
    }

    fn write_block(&self, block_id: u32, buf: &[u8; BLOCK_SIZE]) -> quark::Result<()> {
        if block_id as usize >= self.num_blocks {
            return Err(Error::InvalidBlockId);
        }
        let mut inner = self.inner.lock().unwrap();
        inner
            .seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))
            .map_err(|_| Error::WriteError)?;
        inner.write_all(buf).map_err(|_| Error::WriteError)
    }

    fn flush(&self) -> quark::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.flush().map_err(|_| Error::WriteError)
    }
}

fn image_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("quark_{}_{}.img", name, std::process::id()));
    path
}

#[test]
fn disk_format_write_remount() {
    let path = image_path("roundtrip");
    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 241) as u8).collect();

    // First session: format the image and leave a file behind.
    {
        let disk = Arc::new(VirtDisk::create(&path, DISK_BLOCKS).unwrap());
        let mut fs = FileSystem::format(disk).unwrap();
        log!("formatted image\n{}", fs.info());
        fs.create("persist.bin").unwrap();
        let fd = fs.open("persist.bin").unwrap();
        assert_eq!(fs.write(fd, &data).unwrap(), data.len());
        fs.close(fd).unwrap();
        fs.unmount().unwrap();
    }

    // Second session: a fresh device over the same image sees the file.
    {
        let disk = Arc::new(VirtDisk::create(&path, DISK_BLOCKS).unwrap());
        let mut fs = FileSystem::mount(disk).unwrap();
        let files = fs.list();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "persist.bin");
        assert_eq!(files[0].size, data.len() as u32);

        let fd = fs.open("persist.bin").unwrap();
        let mut buf = vec![0u8; data.len()];
        assert_eq!(fs.read(fd, &mut buf).unwrap(), data.len());
        assert_eq!(buf, data);
        fs.close(fd).unwrap();
        fs.unmount().unwrap();
    }

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn disk_delete_persists() {
    let path = image_path("delete");

    {
        let disk = Arc::new(VirtDisk::create(&path, DISK_BLOCKS).unwrap());
        let mut fs = FileSystem::format(disk).unwrap();
        fs.create("a.txt").unwrap();
        fs.create("b.txt").unwrap();
        let fd = fs.open("a.txt").unwrap();
        fs.write(fd, &[9u8; 5000]).unwrap();
        fs.close(fd).unwrap();
        fs.delete("a.txt").unwrap();
        fs.unmount().unwrap();
    }

    {
        let disk = Arc::new(VirtDisk::create(&path, DISK_BLOCKS).unwrap());
        let fs = FileSystem::mount(disk).unwrap();
        let files = fs.list();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "b.txt");
        // The deleted file's blocks were returned to the free pool.
        let info = fs.info();
        assert_eq!(info.free_fat_entries, info.data_block_count as usize - 1);
    }

    std::fs::remove_file(&path).unwrap();
}
