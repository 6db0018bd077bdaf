//! Lazily write an embedded executable to a temp file on first use.

// special lint
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
// rust compiler lints
#![deny(unused_must_use)]
#![warn(missing_debug_implementations)]

mod exe;

pub use exe::{Error, LazyExe, Result};

fn _assertion() {
    fn assert_sync_send<T: Sync + Send>() {}

    assert_sync_send::<LazyExe>();
}
