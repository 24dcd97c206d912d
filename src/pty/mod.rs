//! Driven-shell process plumbing.
//!
//! The shell runs on the slave side of a pseudo-terminal; the relay
//! holds the master side as an ordinary read/write stream. The shell
//! interprets nothing here: both directions are opaque bytes.
//!
//! [`RawModeGuard`] puts the user's own terminal into raw mode for the
//! relay's lifetime, restoring the saved settings on drop (including
//! during unwinding), so byte-at-a-time forwarding works and the tab
//! byte can be consumed before the terminal acts on it.

use nix::pty::{forkpty, ForkptyResult, Winsize};
use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, SetArg, Termios};
use nix::sys::wait::waitpid;
use nix::unistd::{execvp, Pid};
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::fd::AsFd;

/// Errors from pseudo-terminal setup and teardown.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    /// The shell path contains an interior NUL and cannot be executed.
    #[error("invalid shell path {0:?}")]
    BadShellPath(String),
    /// Forking the shell onto a pseudo-terminal failed.
    #[error("failed to fork the shell onto a pseudo-terminal")]
    Fork(#[source] nix::Error),
    /// Reading or changing terminal attributes failed.
    #[error("failed to change terminal attributes")]
    Termios(#[source] nix::Error),
    /// Reaping the shell process failed.
    #[error("failed to wait for the shell process")]
    Wait(#[source] nix::Error),
}

/// A shell process running on the slave side of a pseudo-terminal.
#[derive(Debug)]
pub struct ShellSession {
    master: File,
    child: Pid,
}

impl ShellSession {
    /// The master side of the pseudo-terminal: write to feed the shell
    /// input, read to observe its output.
    pub fn master_mut(&mut self) -> &mut File {
        &mut self.master
    }

    /// The shell's process id.
    pub fn pid(&self) -> Pid {
        self.child
    }

    /// Close the master side and reap the shell process.
    ///
    /// Closing first means a shell that outlived the user's input sees
    /// end-of-file and exits rather than leaving the wait hanging.
    pub fn wait(self) -> Result<(), PtyError> {
        let ShellSession { master, child } = self;
        drop(master);
        let status = waitpid(child, None).map_err(PtyError::Wait)?;
        tracing::debug!(?status, "shell process reaped");
        Ok(())
    }
}

/// Fork `shell` onto a fresh pseudo-terminal.
///
/// The child execs the shell, which becomes the session leader of the
/// slave side; the parent gets the master as a plain [`File`].
pub fn spawn_shell(shell: &str) -> Result<ShellSession, PtyError> {
    let prog =
        CString::new(shell).map_err(|_| PtyError::BadShellPath(shell.to_string()))?;

    // SAFETY: between fork and exec the child calls only execvp and
    // _exit, both async-signal-safe.
    let fork = unsafe { forkpty(None::<&Winsize>, None::<&Termios>) }.map_err(PtyError::Fork)?;

    match fork {
        ForkptyResult::Parent { child, master } => {
            tracing::debug!(shell, pid = child.as_raw(), "spawned driven shell");
            Ok(ShellSession {
                master: File::from(master),
                child,
            })
        }
        ForkptyResult::Child => {
            let _ = execvp(&prog, &[&prog]);
            // Only reached when exec failed; bail without running any
            // of the parent's atexit machinery.
            unsafe { nix::libc::_exit(127) }
        }
    }
}

/// Raw-mode guard for the user's terminal.
///
/// Saves the current attributes of standard input, switches it to raw
/// mode, and restores the saved attributes on drop.
pub struct RawModeGuard {
    saved: Termios,
}

impl RawModeGuard {
    /// Switch standard input to raw mode.
    ///
    /// Fails when standard input is not a terminal.
    pub fn new() -> Result<Self, PtyError> {
        let stdin = io::stdin();
        let saved = tcgetattr(stdin.as_fd()).map_err(PtyError::Termios)?;

        let mut raw = saved.clone();
        cfmakeraw(&mut raw);
        tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &raw).map_err(PtyError::Termios)?;

        Ok(Self { saved })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let stdin = io::stdin();
        if let Err(err) = tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &self.saved) {
            tracing::warn!(error = %err, "failed to restore terminal attributes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn shell_path_with_nul_is_rejected() {
        let err = spawn_shell("/bin/\0sh").unwrap_err();
        assert!(matches!(err, PtyError::BadShellPath(_)));
    }

    #[test]
    fn spawned_shell_can_be_driven_and_reaped() {
        let mut session = spawn_shell("/bin/sh").expect("no pty available");

        session.master_mut().write_all(b"exit\n").unwrap();

        // Drain output until the child side closes.
        let mut sink = Vec::new();
        let _ = session.master_mut().read_to_end(&mut sink);

        session.wait().unwrap();
    }
}
