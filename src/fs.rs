//! The mount session: owns the in-memory mirrors and exposes the operation
//! surface. Every mutating operation persists the affected metadata blocks
//! before returning, so the mirrors and the device never drift apart between
//! calls.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use log::debug;

use crate::block_dev::BlockDevice;
use crate::config::*;
use crate::directory::{RootDir, RootEntry, validate_name};
use crate::error::{FsError, Result};
use crate::fat::Fat;
use crate::file::{fread, fwrite};
use crate::open_table::OpenTable;
use crate::superblock::Superblock;

pub struct FileSystem<D: BlockDevice> {
    device: Arc<D>,
    superblock: Superblock,
    fat: Fat,
    root: RootDir,
    open_table: OpenTable,
}

impl<D: BlockDevice> fmt::Debug for FileSystem<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("superblock", &self.superblock)
            .field("open_files", &self.open_table.open_files())
            .finish_non_exhaustive()
    }
}

/// Volume geometry and occupancy, as reported by [`FileSystem::info`].
#[derive(Debug, Clone, Copy)]
pub struct FsInfo {
    pub total_blocks: u16,
    pub fat_block_count: u8,
    pub root_dir_block: u16,
    pub data_start: u16,
    pub data_block_count: u16,
    pub free_fat_entries: usize,
    pub free_root_entries: usize,
}

impl fmt::Display for FsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total_blocks={}", self.total_blocks)?;
        writeln!(f, "fat_blocks={}", self.fat_block_count)?;
        writeln!(f, "root_dir_block={}", self.root_dir_block)?;
        writeln!(f, "data_start={}", self.data_start)?;
        writeln!(f, "data_blocks={}", self.data_block_count)?;
        writeln!(
            f,
            "fat_free={}/{}",
            self.free_fat_entries, self.data_block_count
        )?;
        write!(f, "root_free={}/{}", self.free_root_entries, MAX_FILE_COUNT)
    }
}

/// One row of [`FileSystem::list`].
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    pub size: u32,
    pub first_block: Option<u16>,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Writes a fresh volume onto the device and returns the mounted session:
    /// superblock, an all-free FAT (entry 0 reserved), and an empty root
    /// directory.
    pub fn format(device: Arc<D>) -> Result<Self> {
        let superblock = Superblock::new(device.num_blocks())?;

        let mut buf = [0u8; BLOCK_SIZE];
        superblock.encode(&mut buf);
        device.write_block(SUPERBLOCK_ID, &buf)?;

        let fat = Fat::empty(&superblock);
        fat.persist(device.as_ref())?;
        let root = RootDir::empty();
        root.persist(device.as_ref(), &superblock)?;
        device.flush()?;

        debug!(
            "formatted volume: {} blocks total, {} data blocks",
            superblock.total_blocks, superblock.data_block_count
        );
        Ok(FileSystem {
            device,
            superblock,
            fat,
            root,
            open_table: OpenTable::new(),
        })
    }

    /// Loads the metadata mirrors from an existing volume. Fails if block 0
    /// does not carry the signature or its block count disagrees with the
    /// device.
    pub fn mount(device: Arc<D>) -> Result<Self> {
        let mut buf = [0u8; BLOCK_SIZE];
        device.read_block(SUPERBLOCK_ID, &mut buf)?;
        let superblock = Superblock::decode(&buf)?;
        if superblock.total_blocks as usize != device.num_blocks() {
            return Err(FsError::GeometryMismatch);
        }

        let fat = Fat::load(device.as_ref(), &superblock)?;
        let root = RootDir::load(device.as_ref(), &superblock)?;

        debug!(
            "mounted volume: {} blocks total, {} data blocks free",
            superblock.total_blocks,
            fat.free_count()
        );
        Ok(FileSystem {
            device,
            superblock,
            fat,
            root,
            open_table: OpenTable::new(),
        })
    }

    /// Ends the session. Refused while descriptors are open; the session is
    /// handed back along with the error so the caller can close them.
    pub fn unmount(self) -> core::result::Result<(), (Self, FsError)> {
        if self.open_table.open_files() > 0 {
            return Err((self, FsError::FileBusy));
        }
        if let Err(e) = self.device.flush() {
            return Err((self, e));
        }
        debug!("unmounted volume");
        Ok(())
    }

    pub fn info(&self) -> FsInfo {
        FsInfo {
            total_blocks: self.superblock.total_blocks,
            fat_block_count: self.superblock.fat_block_count,
            root_dir_block: self.superblock.root_dir_block,
            data_start: self.superblock.data_start,
            data_block_count: self.superblock.data_block_count,
            free_fat_entries: self.fat.free_count(),
            free_root_entries: self.root.free_count(),
        }
    }

    pub fn list(&self) -> Vec<FileInfo> {
        self.root
            .entries()
            .iter()
            .filter(|entry| entry.is_used())
            .map(|entry| FileInfo {
                name: String::from_utf8_lossy(entry.name()).into_owned(),
                size: entry.size,
                first_block: entry.first_block,
            })
            .collect()
    }

    /// Creates an empty file. One scan over the directory both finds the
    /// first unused slot and rejects a duplicate name.
    pub fn create(&mut self, name: &str) -> Result<()> {
        let bytes = validate_name(name)?;
        let index = self.root.scan_for_create(bytes)?;

        let entry = self.root.entry_mut(index);
        *entry = RootEntry::EMPTY;
        entry.filename[..bytes.len()].copy_from_slice(bytes);
        self.root.persist(self.device.as_ref(), &self.superblock)?;

        debug!("created {:?} in slot {}", name, index);
        Ok(())
    }

    /// Removes a file, zeroing each data block it owned on the device and
    /// freeing its FAT entries. Refused while the file has open descriptors.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let bytes = validate_name(name)?;
        let index = self.root.find(bytes).ok_or(FsError::NotFound)?;
        if self.open_table.references(index) {
            return Err(FsError::FileBusy);
        }

        let mut freed = 0usize;
        if let Some(head) = self.root.entry(index).first_block {
            let zero = alloc::boxed::Box::new([0u8; BLOCK_SIZE]);
            for block in self.fat.chain(head) {
                self.device
                    .write_block(self.superblock.data_start as u32 + block as u32, &zero)?;
                self.fat.release(block);
                freed += 1;
            }
        }

        *self.root.entry_mut(index) = RootEntry::EMPTY;
        self.root.persist(self.device.as_ref(), &self.superblock)?;
        self.fat.persist(self.device.as_ref())?;

        debug!("deleted {:?}, freed {} blocks", name, freed);
        Ok(())
    }

    /// Opens a file and returns its descriptor, with the offset at 0.
    pub fn open(&mut self, name: &str) -> Result<usize> {
        let bytes = validate_name(name)?;
        if self.open_table.open_files() == MAX_OPEN_COUNT {
            return Err(FsError::OpenTableFull);
        }
        let index = self.root.find(bytes).ok_or(FsError::NotFound)?;
        let fd = self.open_table.allocate(index)?;
        debug!("opened {:?} as fd {}", name, fd);
        Ok(fd)
    }

    pub fn close(&mut self, fd: usize) -> Result<()> {
        self.open_table.release(fd)?;
        debug!("closed fd {}", fd);
        Ok(())
    }

    /// Current size of the file bound to `fd`.
    pub fn stat(&self, fd: usize) -> Result<u32> {
        let open = self.open_table.get(fd)?;
        Ok(self.root.entry(open.root_index).size)
    }

    /// Moves the descriptor's offset. Offsets beyond the current size are
    /// rejected.
    pub fn seek(&mut self, fd: usize, offset: u32) -> Result<()> {
        let size = self.stat(fd)?;
        if offset > size {
            return Err(FsError::OffsetOutOfBounds);
        }
        self.open_table.get_mut(fd)?.offset = offset;
        Ok(())
    }

    /// Reads up to `buf.len()` bytes at the descriptor's offset, never past
    /// the end of the file. Returns the bytes read and advances the offset
    /// by that amount.
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize> {
        let open = *self.open_table.get(fd)?;
        let entry = self.root.entry(open.root_index);
        let read = fread(
            self.device.as_ref(),
            &self.superblock,
            &self.fat,
            entry,
            open.offset,
            buf,
        )?;
        self.open_table.get_mut(fd)?.offset = open.offset + read as u32;
        Ok(read)
    }

    /// Writes `buf` at the descriptor's offset, growing the file as needed.
    /// Running out of data blocks yields a short count, not an error. The
    /// root directory and the full FAT are persisted before returning, and
    /// the offset advances through the seek path so it re-validates against
    /// the new size.
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize> {
        let open = *self.open_table.get(fd)?;
        let entry = self.root.entry_mut(open.root_index);
        let written = fwrite(
            self.device.as_ref(),
            &self.superblock,
            &mut self.fat,
            entry,
            open.offset,
            buf,
        )?;

        self.root.persist(self.device.as_ref(), &self.superblock)?;
        self.fat.persist(self.device.as_ref())?;
        self.seek(fd, open.offset + written as u32)?;
        Ok(written)
    }

    pub fn flush(&self) -> Result<()> {
        self.device.flush()
    }

    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    /// Read-only view of the FAT mirror, useful for inspecting chains.
    pub fn fat(&self) -> &Fat {
        &self.fat
    }

    pub fn device(&self) -> Arc<D> {
        Arc::clone(&self.device)
    }
}
