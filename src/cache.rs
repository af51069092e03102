//! The cache layer is implemented as a block device that wraps a 'real'
//! block device, decoupling the caching strategy from the device itself.
//!
//! The wrapper is write-through: writes hit the underlying device before the
//! cache is updated, so metadata persisted by the filesystem is on the device
//! by the time the operation returns.

use crate::block_dev::BlockDevice;
use crate::config::BLOCK_SIZE;
use crate::error::{FsError, Result};

pub trait Cache: Send + Sync {
    /// Stores a block in the cache, evicting per the cache's own policy.
    fn write_cache(&self, block_id: u32, buf: &[u8; BLOCK_SIZE]) -> Result<()>;

    /// Fetches a block from the cache, or `FsError::CacheMiss`.
    fn read_cache(&self, block_id: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()>;
}

pub struct Cached<D: BlockDevice, C: Cache> {
    device: D,
    cache: C,
}

impl<D, C> Cached<D, C>
where
    D: BlockDevice,
    C: Cache,
{
    pub fn new(device: D, cache: C) -> Self {
        Cached { device, cache }
    }
}

impl<D, C> BlockDevice for Cached<D, C>
where
    D: BlockDevice,
    C: Cache,
{
    fn block_size(&self) -> usize {
        self.device.block_size()
    }

    fn num_blocks(&self) -> usize {
        self.device.num_blocks()
    }

    fn read_block(&self, block_id: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        match self.cache.read_cache(block_id, buf) {
            Ok(()) => Ok(()),
            Err(FsError::CacheMiss) => {
                self.device.read_block(block_id, buf)?;
                self.cache.write_cache(block_id, buf)?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn write_block(&self, block_id: u32, buf: &[u8; BLOCK_SIZE]) -> Result<()> {
        self.device.write_block(block_id, buf)?;
        self.cache.write_cache(block_id, buf)
    }

    fn flush(&self) -> Result<()> {
        self.device.flush()
    }
}
