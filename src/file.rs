//! Byte-range read and write engines: translate a file offset plus a buffer
//! into per-block device operations, splicing partial blocks through a
//! bounce buffer scoped to the call.

use alloc::boxed::Box;

use log::trace;

use crate::block_dev::BlockDevice;
use crate::config::BLOCK_SIZE;
use crate::directory::RootEntry;
use crate::error::Result;
use crate::fat::Fat;
use crate::superblock::Superblock;

/// Writes `buf` at `offset` into the file described by `entry`.
///
/// Allocates the head block lazily for an empty file, extends the chain as
/// the write crosses block boundaries, and stops early with a short count
/// when the data region runs out of free blocks. The stored size afterwards
/// is `max(old_size, offset + written)`. Callers persist the root directory
/// and the FAT once the call returns.
pub(crate) fn fwrite<D: BlockDevice>(
    device: &D,
    superblock: &Superblock,
    fat: &mut Fat,
    entry: &mut RootEntry,
    offset: u32,
    buf: &[u8],
) -> Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }

    let mut block = match entry.first_block {
        Some(head) => head,
        None => match fat.allocate() {
            Some(head) => {
                entry.first_block = Some(head);
                head
            }
            // No space for even a first block: nothing was written.
            None => return Ok(0),
        },
    };

    // Resolve the block containing `offset`. Appending at an exact block
    // boundary walks one step past the terminator, so the chain is extended
    // here rather than re-headed.
    let mut remaining_offset = offset as usize;
    while remaining_offset >= BLOCK_SIZE {
        block = match fat.next(block) {
            Some(next) => next,
            None => match fat.allocate() {
                Some(next) => {
                    fat.set_entry(block, next);
                    next
                }
                None => return Ok(0),
            },
        };
        remaining_offset -= BLOCK_SIZE;
    }

    let mut cur_byte = remaining_offset;
    let mut written = 0usize;
    let mut bounce = Box::new([0u8; BLOCK_SIZE]);

    loop {
        let device_block = superblock.data_start as u32 + block as u32;
        let span = BLOCK_SIZE - cur_byte;
        let remaining = buf.len() - written;

        if remaining < span {
            // Splice into the middle of the block: bytes on both sides of
            // the written range must survive.
            device.read_block(device_block, bounce.as_mut())?;
            bounce[cur_byte..cur_byte + remaining].copy_from_slice(&buf[written..]);
            device.write_block(device_block, bounce.as_ref())?;
            written += remaining;
        } else {
            if cur_byte == 0 {
                // Whole block is replaced: no prior read needed.
                bounce.copy_from_slice(&buf[written..written + BLOCK_SIZE]);
            } else {
                device.read_block(device_block, bounce.as_mut())?;
                bounce[cur_byte..].copy_from_slice(&buf[written..written + span]);
            }
            device.write_block(device_block, bounce.as_ref())?;
            written += span;
        }

        if written == buf.len() {
            break;
        }

        block = match fat.next(block) {
            Some(next) => next,
            None => match fat.allocate() {
                Some(next) => {
                    fat.set_entry(block, next);
                    next
                }
                // Data region exhausted: report the short write.
                None => break,
            },
        };
        cur_byte = 0;
    }

    let end = offset as u64 + written as u64;
    if end > entry.size as u64 {
        entry.size = end as u32;
    }
    trace!(
        "wrote {written}/{} bytes at offset {offset}, size now {}",
        buf.len(),
        entry.size
    );
    Ok(written)
}

/// Reads from `offset` into `buf`, capped at the end of the file. Follows
/// the chain one block at a time, copying each needed slice out of a bounce
/// buffer, and stops at the terminator.
pub(crate) fn fread<D: BlockDevice>(
    device: &D,
    superblock: &Superblock,
    fat: &Fat,
    entry: &RootEntry,
    offset: u32,
    buf: &mut [u8],
) -> Result<usize> {
    let capacity = (entry.size.saturating_sub(offset) as usize).min(buf.len());
    if capacity == 0 {
        return Ok(0);
    }
    let head = match entry.first_block {
        Some(head) => head,
        None => return Ok(0),
    };
    let mut block = match fat.seek(head, offset) {
        Some(block) => block,
        None => return Ok(0),
    };

    let mut cur_byte = offset as usize % BLOCK_SIZE;
    let mut read = 0usize;
    let mut bounce = Box::new([0u8; BLOCK_SIZE]);

    loop {
        let device_block = superblock.data_start as u32 + block as u32;
        let to_copy = (BLOCK_SIZE - cur_byte).min(capacity - read);
        device.read_block(device_block, bounce.as_mut())?;
        buf[read..read + to_copy].copy_from_slice(&bounce[cur_byte..cur_byte + to_copy]);
        read += to_copy;

        if read == capacity {
            break;
        }
        block = match fat.next(block) {
            Some(next) => next,
            None => break,
        };
        cur_byte = 0;
    }

    trace!("read {read}/{} bytes at offset {offset}", buf.len());
    Ok(read)
}
