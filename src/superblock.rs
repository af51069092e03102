//! On-disk superblock: volume geometry, written once at format time and
//! validated on every mount.

use crate::config::*;
use crate::error::{FsError, Result};

/// Decoded form of block 0. Immutable after mount.
///
/// On-disk layout (little-endian):
/// - bytes 0..8: signature
/// - bytes 8..10: total block count
/// - bytes 10..12: root directory block index
/// - bytes 12..14: data region start index
/// - bytes 14..16: data block count
/// - byte 16: FAT block count
/// - remainder: padding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub total_blocks: u16,
    pub root_dir_block: u16,
    pub data_start: u16,
    pub data_block_count: u16,
    pub fat_block_count: u8,
}

impl Superblock {
    /// Computes the geometry for a fresh volume of `total_blocks` blocks.
    ///
    /// The FAT grows with the data region, and the data region shrinks as
    /// the FAT grows, so the FAT size is found by searching upward for the
    /// smallest count whose entries cover the remaining blocks.
    pub fn new(total_blocks: usize) -> Result<Self> {
        if total_blocks > u16::MAX as usize {
            return Err(FsError::GeometryMismatch);
        }
        // superblock + at least one FAT block + root dir + one data block
        if total_blocks < 4 {
            return Err(FsError::VolumeTooSmall);
        }

        let mut fat_block_count = 1usize;
        loop {
            let data_block_count = total_blocks - 2 - fat_block_count;
            if data_block_count == 0 {
                return Err(FsError::VolumeTooSmall);
            }
            if data_block_count <= fat_block_count * FAT_ENTRIES_PER_BLOCK {
                return Ok(Superblock {
                    total_blocks: total_blocks as u16,
                    root_dir_block: (1 + fat_block_count) as u16,
                    data_start: (2 + fat_block_count) as u16,
                    data_block_count: data_block_count as u16,
                    fat_block_count: fat_block_count as u8,
                });
            }
            fat_block_count += 1;
        }
    }

    pub fn decode(buf: &[u8; BLOCK_SIZE]) -> Result<Self> {
        if buf[0..8] != SIGNATURE {
            return Err(FsError::InvalidSignature);
        }

        let total_blocks = u16::from_le_bytes([buf[8], buf[9]]);
        let root_dir_block = u16::from_le_bytes([buf[10], buf[11]]);
        let data_start = u16::from_le_bytes([buf[12], buf[13]]);
        let data_block_count = u16::from_le_bytes([buf[14], buf[15]]);
        let fat_block_count = buf[16];

        Ok(Superblock {
            total_blocks,
            root_dir_block,
            data_start,
            data_block_count,
            fat_block_count,
        })
    }

    pub fn encode(&self, buf: &mut [u8; BLOCK_SIZE]) {
        buf.fill(0);
        buf[0..8].copy_from_slice(&SIGNATURE);
        buf[8..10].copy_from_slice(&self.total_blocks.to_le_bytes());
        buf[10..12].copy_from_slice(&self.root_dir_block.to_le_bytes());
        buf[12..14].copy_from_slice(&self.data_start.to_le_bytes());
        buf[14..16].copy_from_slice(&self.data_block_count.to_le_bytes());
        buf[16] = self.fat_block_count;
    }
}
