//! The real-time session relay.
//!
//! One loop multiplexes two byte streams: the user's keyboard and the
//! driven shell's output. Bytes are forwarded in both directions; on a
//! "command not found" signal the relay queries the suggestion engine
//! and appends the rendered candidates to the visible stream, and on a
//! tab it completes the in-progress line against the last suggestions.
//!
//! The byte-level handlers are separated from the OS readiness wait so
//! tests can drive the relay with in-memory streams. The loop itself is
//! single-threaded and cooperative: one `poll` over exactly two read
//! ends, each ready branch completing a bounded read before the next
//! wait. The suggestion index is read-only for the relay's lifetime, so
//! there is no locking anywhere.

mod scanner;

use crate::index::MatchList;
use crate::suggest::{Completion, SuggestionEngine};
use colored::Colorize;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use scanner::FailureScanner;
use std::io::{self, Read, Write};
use std::os::fd::AsFd;

/// Tab signal: triggers autocomplete, never forwarded.
const TAB: u8 = 0x09;

/// Read size for each ready branch. Bounded so no branch can stall the
/// wait loop.
const CHUNK: usize = 4096;

/// Errors that terminate the relay.
///
/// Stream closure on either side is a normal exit, not an error; only a
/// failed readiness wait is fatal.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The readiness wait itself failed.
    #[error("readiness wait failed")]
    Wait(#[source] io::Error),
}

/// Mutable per-session state: the line being typed and the most recent
/// suggestion list.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Bytes of the in-progress command line.
    buffer: Vec<u8>,
    /// How many buffer bytes were already forwarded to the shell as the
    /// user typed them. Completion rewrites the buffer wholesale, and
    /// only the unsent remainder goes out on submit.
    forwarded: usize,
    /// The last submitted command line, kept for failure-token
    /// extraction once the shell reports on it.
    last_command: String,
    /// Most recent suggestion results; autocomplete scans these.
    matches: MatchList,
}

impl SessionState {
    /// The in-progress line as text.
    pub fn line(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    /// The last submitted command line.
    pub fn last_command(&self) -> &str {
        &self.last_command
    }

    /// The most recent suggestion results.
    pub fn matches(&self) -> &MatchList {
        &self.matches
    }
}

/// The relay itself: owns the engine, the session state, and the
/// failure scanner.
pub struct SessionRelay {
    engine: SuggestionEngine,
    state: SessionState,
    scanner: FailureScanner,
    /// Suggestions fire at most once per submitted line; the scanner is
    /// armed on submit and disarmed after firing, so echoes or repeated
    /// failure text cannot re-trigger.
    armed: bool,
}

impl SessionRelay {
    /// Create a relay around a suggestion engine.
    pub fn new(engine: SuggestionEngine) -> Self {
        Self {
            engine,
            state: SessionState::default(),
            scanner: FailureScanner::new(),
            armed: false,
        }
    }

    /// Current session state (primarily for inspection in tests).
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Process a chunk of keyboard input.
    ///
    /// Ordinary bytes are appended to the line buffer and forwarded to
    /// the shell immediately, in contiguous runs; echo is the shell's
    /// responsibility. A tab triggers autocomplete and is consumed. A
    /// line-feed (or the carriage return a raw terminal sends for
    /// enter) submits the line.
    pub fn handle_user_input<S, U>(
        &mut self,
        bytes: &[u8],
        shell_in: &mut S,
        user_out: &mut U,
    ) -> io::Result<()>
    where
        S: Write,
        U: Write,
    {
        let mut run_start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            match byte {
                TAB => {
                    self.forward_run(&bytes[run_start..i], shell_in)?;
                    run_start = i + 1;
                    self.autocomplete(shell_in, user_out)?;
                }
                b'\n' | b'\r' => {
                    self.forward_run(&bytes[run_start..i], shell_in)?;
                    run_start = i + 1;
                    self.submit_line(shell_in)?;
                }
                _ => {}
            }
        }
        self.forward_run(&bytes[run_start..], shell_in)?;
        Ok(())
    }

    /// Process a chunk of shell output.
    ///
    /// The chunk is forwarded to the user's terminal before any
    /// suggestion work: shell output is never delayed behind a query.
    /// The failure scanner then consumes the chunk, and if the failure
    /// phrase completed while a submitted line is pending, the rendered
    /// suggestion block is appended to the stream.
    pub fn handle_shell_output<U>(&mut self, bytes: &[u8], user_out: &mut U) -> io::Result<()>
    where
        U: Write,
    {
        user_out.write_all(bytes)?;
        user_out.flush()?;

        // Scan unconditionally to keep the rolling tail current.
        let hit = self.scanner.scan(bytes);
        if hit && self.armed {
            self.armed = false;
            self.suggest_for_last_command(user_out)?;
        }
        Ok(())
    }

    /// Drive the relay until either stream closes.
    ///
    /// Blocks on `poll` over the two read ends and services whichever
    /// is ready. A failed wait is fatal; `EINTR` retries it. A failed
    /// or empty read on either side ends the session, as does any
    /// downstream write failure: the relay has no notion of a
    /// recoverable transient fault.
    pub fn run<I, O, S>(
        &mut self,
        user_in: &mut I,
        user_out: &mut O,
        shell: &mut S,
    ) -> Result<(), RelayError>
    where
        I: Read + AsFd,
        O: Write,
        S: Read + Write + AsFd,
    {
        let mut buf = [0u8; CHUNK];

        loop {
            let (user_ready, shell_ready) = {
                let mut fds = [
                    PollFd::new(user_in.as_fd(), PollFlags::POLLIN),
                    PollFd::new(shell.as_fd(), PollFlags::POLLIN),
                ];
                loop {
                    match poll(&mut fds, PollTimeout::NONE) {
                        Ok(_) => break,
                        Err(Errno::EINTR) => continue,
                        Err(err) => return Err(RelayError::Wait(err.into())),
                    }
                }
                (is_ready(&fds[0]), is_ready(&fds[1]))
            };

            if user_ready {
                match user_in.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if self.handle_user_input(&buf[..n], shell, user_out).is_err() {
                            break;
                        }
                    }
                }
            }

            if shell_ready {
                match shell.read(&mut buf) {
                    // EOF, or EIO from a pty master whose child is gone:
                    // the session is over either way.
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if self.handle_shell_output(&buf[..n], user_out).is_err() {
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!("relay loop finished");
        Ok(())
    }

    /// Append a run of ordinary bytes to the line buffer and forward it.
    fn forward_run<S: Write>(&mut self, run: &[u8], shell_in: &mut S) -> io::Result<()> {
        if run.is_empty() {
            return Ok(());
        }
        self.state.buffer.extend_from_slice(run);
        self.state.forwarded += run.len();
        shell_in.write_all(run)?;
        shell_in.flush()
    }

    /// Submit the accumulated line: send the not-yet-forwarded part plus
    /// the terminator, remember the line, clear the buffer, and arm the
    /// failure scanner for the shell's verdict.
    fn submit_line<S: Write>(&mut self, shell_in: &mut S) -> io::Result<()> {
        shell_in.write_all(&self.state.buffer[self.state.forwarded..])?;
        shell_in.write_all(b"\n")?;
        shell_in.flush()?;

        self.state.last_command = self.state.line();
        self.state.buffer.clear();
        self.state.forwarded = 0;
        self.scanner.reset();
        self.armed = true;
        Ok(())
    }

    /// Run autocomplete against the last match list and act on the
    /// outcome. The tab byte itself is never forwarded.
    fn autocomplete<S, U>(&mut self, shell_in: &mut S, user_out: &mut U) -> io::Result<()>
    where
        S: Write,
        U: Write,
    {
        let partial = self.state.line();
        match self.engine.complete(&self.state.matches, &partial) {
            Completion::NoMatch => Ok(()),
            Completion::Unique(word) => {
                // The shell holds the partial already; sending the
                // suffix completes its line buffer and echoes the
                // completion to the user in one step.
                let suffix = &word.as_bytes()[partial.len()..];
                shell_in.write_all(suffix)?;
                shell_in.flush()?;

                self.state.buffer = word.into_bytes();
                self.state.forwarded = self.state.buffer.len();
                Ok(())
            }
            Completion::Ambiguous(words) => {
                // List the candidates, then re-show the typed line so
                // the user can keep narrowing it.
                user_out.write_all(b"\r\n")?;
                user_out.write_all(words.join("  ").as_bytes())?;
                user_out.write_all(b"\r\n")?;
                user_out.write_all(partial.as_bytes())?;
                user_out.flush()
            }
        }
    }

    /// Query for the failed command and append the rendered block.
    fn suggest_for_last_command<U: Write>(&mut self, user_out: &mut U) -> io::Result<()> {
        let token = self
            .state
            .last_command
            .split_whitespace()
            .next()
            .unwrap_or("");

        let Some(matches) = self.engine.suggest(token) else {
            return Ok(());
        };

        if !matches.is_empty() {
            user_out.write_all(render_suggestions(token, &matches).as_bytes())?;
            user_out.flush()?;
        } else {
            tracing::debug!(token, "no suggestions within threshold");
        }

        // The last list is replaced even when empty; stale suggestions
        // must not complete against a newer failure.
        self.state.matches = matches;
        Ok(())
    }
}

fn is_ready(fd: &PollFd<'_>) -> bool {
    fd.revents().is_some_and(|r| !r.is_empty())
}

/// Render the suggestion block: a header naming the failed command,
/// then one indented line per candidate in rank order.
fn render_suggestions(token: &str, matches: &MatchList) -> String {
    let mut block = String::new();
    block.push_str(&format!(
        "\r\nterma: closest matches for '{}':\r\n",
        token.cyan().bold()
    ));
    for term in matches.terms() {
        block.push_str("    ");
        block.push_str(term);
        block.push_str("\r\n");
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::BkTree;

    fn relay() -> SessionRelay {
        let mut tree = BkTree::new("terma");
        for word in ["list", "grep", "git", "install", "instant"] {
            tree.insert(word).unwrap();
        }
        SessionRelay::new(SuggestionEngine::new(tree))
    }

    #[test]
    fn ordinary_bytes_are_forwarded_and_buffered() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        relay.handle_user_input(b"ls -l", &mut shell, &mut user).unwrap();

        assert_eq!(shell, b"ls -l");
        assert_eq!(relay.state().line(), "ls -l");
        assert!(user.is_empty());
    }

    #[test]
    fn submit_sends_terminator_and_clears_buffer() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        relay.handle_user_input(b"ls\n", &mut shell, &mut user).unwrap();

        // The two typed bytes went out as typed; submit adds only the
        // terminator.
        assert_eq!(shell, b"ls\n");
        assert_eq!(relay.state().line(), "");
        assert_eq!(relay.state().last_command(), "ls");
    }

    #[test]
    fn carriage_return_submits_like_line_feed() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        relay.handle_user_input(b"ls\r", &mut shell, &mut user).unwrap();

        assert_eq!(shell, b"ls\n");
        assert_eq!(relay.state().last_command(), "ls");
    }

    #[test]
    fn tab_is_consumed_not_forwarded() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        relay.handle_user_input(b"xy\t", &mut shell, &mut user).unwrap();

        assert_eq!(shell, b"xy");
        assert_eq!(relay.state().line(), "xy");
    }

    #[test]
    fn shell_output_is_forwarded_verbatim() {
        let mut relay = relay();
        let mut user = Vec::new();

        relay.handle_shell_output(b"total 12\r\n", &mut user).unwrap();

        assert_eq!(user, b"total 12\r\n");
    }

    #[test]
    fn failure_after_submit_appends_suggestions() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        relay.handle_user_input(b"gti\n", &mut shell, &mut user).unwrap();
        relay
            .handle_shell_output(b"bash: gti: command not found\r\n", &mut user)
            .unwrap();

        let out = String::from_utf8_lossy(&user);
        assert!(out.starts_with("bash: gti: command not found\r\n"));
        assert!(out.contains("closest matches"));
        assert!(out.contains("git"));
        assert!(relay.state().matches().terms().any(|t| t == "git"));
    }

    #[test]
    fn failure_without_submit_is_ignored() {
        let mut relay = relay();
        let mut user = Vec::new();

        relay
            .handle_shell_output(b"bash: gti: command not found\r\n", &mut user)
            .unwrap();

        assert_eq!(user, b"bash: gti: command not found\r\n");
        assert!(relay.state().matches().is_empty());
    }

    #[test]
    fn suggestions_fire_once_per_submitted_line() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        relay.handle_user_input(b"gti\n", &mut shell, &mut user).unwrap();
        relay
            .handle_shell_output(b"bash: gti: command not found\r\n", &mut user)
            .unwrap();
        let after_first = user.len();

        relay
            .handle_shell_output(b"still: command not found\r\n", &mut user)
            .unwrap();

        let tail = String::from_utf8_lossy(&user[after_first..]);
        assert!(!tail.contains("closest matches"));
    }

    #[test]
    fn split_failure_phrase_is_detected() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        relay.handle_user_input(b"gti\n", &mut shell, &mut user).unwrap();
        relay.handle_shell_output(b"bash: gti: command no", &mut user).unwrap();
        relay.handle_shell_output(b"t found\r\n", &mut user).unwrap();

        assert!(String::from_utf8_lossy(&user).contains("closest matches"));
    }

    #[test]
    fn unique_completion_sends_suffix_to_shell() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        // A failed "instal" populates the match list with "install".
        relay.handle_user_input(b"instal\n", &mut shell, &mut user).unwrap();
        relay
            .handle_shell_output(b"bash: instal: command not found\r\n", &mut user)
            .unwrap();

        shell.clear();
        relay.handle_user_input(b"instal\t", &mut shell, &mut user).unwrap();

        // "instal" was forwarded as typed, then the completion suffix.
        assert_eq!(shell, b"install");
        assert_eq!(relay.state().line(), "install");

        // Submit now only sends the terminator.
        shell.clear();
        relay.handle_user_input(b"\n", &mut shell, &mut user).unwrap();
        assert_eq!(shell, b"\n");
        assert_eq!(relay.state().last_command(), "install");
    }

    #[test]
    fn ambiguous_completion_lists_candidates() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        relay.handle_user_input(b"insta\n", &mut shell, &mut user).unwrap();
        relay
            .handle_shell_output(b"bash: insta: command not found\r\n", &mut user)
            .unwrap();

        shell.clear();
        let before = user.len();
        relay.handle_user_input(b"insta\t", &mut shell, &mut user).unwrap();

        let listing = String::from_utf8_lossy(&user[before..]);
        assert!(listing.contains("install"));
        assert!(listing.contains("instant"));
        // Buffer unchanged, nothing extra sent to the shell.
        assert_eq!(relay.state().line(), "insta");
        assert_eq!(shell, b"insta");
    }

    #[test]
    fn tab_with_no_matches_does_nothing() {
        let mut relay = relay();
        let mut shell = Vec::new();
        let mut user = Vec::new();

        relay.handle_user_input(b"xyz\t", &mut shell, &mut user).unwrap();

        assert_eq!(shell, b"xyz");
        assert!(user.is_empty());
        assert_eq!(relay.state().line(), "xyz");
    }
}
