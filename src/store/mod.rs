// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod file;
pub mod memory;
pub mod local;

pub use traits::StorageArea;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use local::{LocalStore, DEFAULT_STORAGE_KEY};
