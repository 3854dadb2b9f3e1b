// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod file;
pub mod cross_tab;

pub use traits::StorageWatcher;
pub use file::FileStorageWatcher;
pub use cross_tab::CrossTabListener;
