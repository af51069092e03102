use crate::config::BLOCK_SIZE;
use crate::error::Result;

pub trait BlockDevice: Send + Sync {
    /// Returns the number of blocks in the block device.
    fn num_blocks(&self) -> usize;

    /// Reads the block at `block_id` into `buf`.
    fn read_block(&self, block_id: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()>;

    /// Writes `buf` to the block at `block_id`.
    fn write_block(&self, block_id: u32, buf: &[u8; BLOCK_SIZE]) -> Result<()>;

    /// Flushes any buffered data to stable storage.
    fn flush(&self) -> Result<()>;

    /// Returns the size of each block in bytes.
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }
}
