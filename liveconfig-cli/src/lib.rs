//! # liveconfig-cli
//!
//! Control surfaces over a [`LiveManager`](liveconfig_core::LiveManager):
//!
//! - [`shell`]: line-oriented command interpreter a host program can run
//!   in-process (e.g. on a stdin thread) to tune its live instances
//! - [`offline`]: rebuilds a manager from a save file so the `liveconfig`
//!   binary can edit saved state between runs

pub mod offline;
pub mod shell;

pub use offline::{hydrate, PERSISTED_CLASS};
pub use shell::{Outcome, Shell};
