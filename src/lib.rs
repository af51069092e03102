//! Quark is a tiny single-volume, flat-namespace file system with FAT-style
//! linked block allocation, implemented entirely in user space on top of a
//! raw block-addressed device.
//! No support for directories, permissions, timestamps, or other advanced
//! features.
//!
//! Quark File System's linear layout:
//! - Superblock
//! - FAT
//! - Root Directory
//! - Data Blocks
//!
//! Quark's layers (from bottom to top):
//! 1. Block Device: Abstraction for low level devices.       | User implemented (hardware-specific)
//! 2. Cache: Optional write-through layer for performance.   | User implemented (strategy)
//! 3. FAT: Linked allocation over the data region.           | Fs implemented
//! 4. Root Directory: Flat fixed-capacity file table.        | Fs implemented
//! 5. File: Byte-range read/write over block chains.         | Fs implemented
//! 6. FileSystem: The mount session users operate on.        | Fs implemented (one per volume)

extern crate alloc;

mod block_dev;
mod cache;
mod config;
mod directory;
mod error;
mod fat;
mod file;
mod fs;
mod open_table;
mod superblock;

pub use block_dev::BlockDevice;
pub use cache::{Cache, Cached};
pub use config::*;
pub use error::FsError as Error;
pub use error::{FsError, Result};
pub use fat::Fat;
pub use fs::{FileInfo, FileSystem, FsInfo};
pub use superblock::Superblock;
