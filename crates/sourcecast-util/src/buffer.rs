//! Append-only output accumulator used by the transcoding engine.
//!
//! The buffer always carries a trailing NUL byte so the converted text can be
//! handed to C-style consumers without another copy. Every append grows the
//! allocation to exactly the written length plus the terminator.

/// Growable, NUL-terminated byte accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

impl OutputBuffer {
    /// Create an empty buffer holding only the terminator.
    pub fn new() -> Self {
        let mut bytes = Vec::with_capacity(1);
        bytes.push(0);
        Self { bytes }
    }

    /// Append `chunk`, growing by exactly `chunk.len()` bytes.
    ///
    /// Allocation failure aborts the process, as with any `Vec` growth.
    pub fn append(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.bytes.pop();
        self.bytes.reserve_exact(chunk.len() + 1);
        self.bytes.extend_from_slice(chunk);
        self.bytes.push(0);
    }

    /// Number of meaningful bytes, terminator excluded.
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Contents without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Consume the buffer, dropping the terminator.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.bytes.pop();
        self.bytes
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
