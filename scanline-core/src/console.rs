// scanline-core/src/console.rs
//! Graphics-exclusive console mode.
//!
//! Switching the virtual console to `KD_GRAPHICS` stops the kernel from
//! drawing its text cursor and messages over our framebuffer. The previous
//! mode is saved in a [`ConsoleGuard`] and put back exactly once, when the
//! guard is restored or dropped.

use crate::sys::{KD_GRAPHICS, KD_TEXT, ioctl};
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::os::fd::{AsFd, AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

/// Saved console mode, restored on drop.
#[derive(Debug)]
pub struct ConsoleGuard {
    tty: PathBuf,
    saved_mode: i32,
    restored: bool,
}

impl ConsoleGuard {
    /// Switch the console behind stdin to graphics mode.
    ///
    /// Returns `None` when stdin is not an interactive virtual console
    /// (a pipe, a pseudo-terminal, a file). That is not an error: the
    /// surface works the same, the kernel just keeps drawing text on top.
    pub fn acquire() -> Option<Self> {
        let tty = stdin_console()?;
        let saved_mode = set_kd_mode(&tty, KD_GRAPHICS)?;
        tracing::info!("{} switched to graphics mode (was {})", tty.display(), saved_mode);

        Some(Self {
            tty,
            saved_mode,
            restored: false,
        })
    }

    pub fn tty(&self) -> &Path {
        &self.tty
    }

    /// Put the saved mode back now instead of waiting for drop.
    pub fn restore(mut self) {
        self.restore_once();
    }

    fn restore_once(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        if set_kd_mode(&self.tty, self.saved_mode).is_some() {
            tracing::info!("{} restored to mode {}", self.tty.display(), self.saved_mode);
        }
    }
}

impl Drop for ConsoleGuard {
    fn drop(&mut self) {
        self.restore_once();
    }
}

/// Virtual consoles live at `/dev/ttyN` or `/dev/vc/N`; pseudo-terminals
/// (`/dev/pts/N`) have no KD mode to switch.
pub fn is_virtual_console(path: &Path) -> bool {
    let s = path.to_string_lossy();
    s.contains("/dev/tty") || s.contains("/dev/vc")
}

fn stdin_console() -> Option<PathBuf> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        tracing::debug!("stdin is not a terminal; skipping console mode switch");
        return None;
    }

    let path = match nix::unistd::ttyname(stdin.as_fd()) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!("ttyname(stdin) failed: {}", e);
            return None;
        }
    };

    if !is_virtual_console(&path) {
        tracing::debug!("{} is not a virtual console; skipping console mode switch", path.display());
        return None;
    }
    Some(path)
}

/// Set the KD mode of `tty` and return the mode it had before.
///
/// A failed read of the old mode falls back to `KD_TEXT` so the console is
/// never left in graphics mode on exit.
fn set_kd_mode(tty: &Path, mode: i32) -> Option<i32> {
    let file = match OpenOptions::new().read(true).write(true).open(tty) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("failed to open tty {}: {}", tty.display(), e);
            return None;
        }
    };

    let mut old: libc::c_int = KD_TEXT;
    if let Err(e) = unsafe { ioctl::kd_get_mode(file.as_raw_fd(), &mut old) } {
        tracing::warn!("failed to get current kd mode: {}", e);
        old = KD_TEXT;
    }
    if let Err(e) = unsafe { ioctl::kd_set_mode(file.as_raw_fd(), mode) } {
        tracing::warn!("failed to set kd mode: {}", e);
    }
    close_tty(file);

    Some(old)
}

fn close_tty(file: File) {
    if let Err(e) = nix::unistd::close(file.into_raw_fd()) {
        tracing::warn!("failed to close tty: {}", e);
    }
}
