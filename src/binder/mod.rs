// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod binder;
pub mod terminal;

pub use binder::FavoritesBinder;
pub use terminal::{run_clicks, spawn_stdin_clicks, TerminalView};
