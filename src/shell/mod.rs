// SPDX-License-Identifier: GPL-3.0-only
pub mod lifecycle;

pub use lifecycle::{Shell, ShellState, WindowId, WindowSpec};
