//! Failure-signal detection over the shell's output stream.
//!
//! The shell reports an unknown command with a "command not found" line.
//! Output arrives in arbitrary read-sized chunks, so the phrase can be
//! split across two reads; the scanner therefore carries the tail of the
//! previous chunk (one byte short of the phrase length) into the next
//! scan instead of matching per chunk.

/// The phrase that marks a failed command, matched case-insensitively.
pub(crate) const FAILURE_PHRASE: &[u8] = b"command not found";

/// Rolling case-insensitive substring scanner.
#[derive(Debug, Default)]
pub(crate) struct FailureScanner {
    tail: Vec<u8>,
}

impl FailureScanner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Drop carried state, e.g. when a new command line is submitted.
    pub(crate) fn reset(&mut self) {
        self.tail.clear();
    }

    /// Feed one output chunk; returns true if the failure phrase
    /// completed anywhere in it (including across the chunk boundary).
    pub(crate) fn scan(&mut self, chunk: &[u8]) -> bool {
        let mut window = Vec::with_capacity(self.tail.len() + chunk.len());
        window.extend_from_slice(&self.tail);
        window.extend(chunk.iter().map(u8::to_ascii_lowercase));

        let hit = window
            .windows(FAILURE_PHRASE.len())
            .any(|w| w == FAILURE_PHRASE);

        let keep = window.len().min(FAILURE_PHRASE.len() - 1);
        self.tail = window.split_off(window.len() - keep);

        hit
    }
}
