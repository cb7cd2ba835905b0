//! Size-bounded accumulation of serialized documents

/// Default flush threshold for one output batch (10 MiB).
pub const DEFAULT_MAX_BATCH_BYTES: usize = 10 * 1024 * 1024;

/// In-memory buffer of serialized documents bounded by a byte threshold.
///
/// The buffer never decides to flush by itself; the owner asks
/// [`BatchBuffer::would_overflow`] before pushing and drains it with
/// [`BatchBuffer::take`].
#[derive(Debug)]
pub struct BatchBuffer {
    docs: Vec<Vec<u8>>,
    total_bytes: usize,
    max_bytes: usize,
}

impl BatchBuffer {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            docs: Vec::new(),
            total_bytes: 0,
            max_bytes,
        }
    }

    /// Whether appending `len` more bytes would push a non-empty buffer over the threshold.
    ///
    /// An empty buffer always accepts, so one oversized document becomes a
    /// batch of its own instead of an empty file.
    pub fn would_overflow(&self, len: usize) -> bool {
        !self.docs.is_empty() && self.total_bytes + len > self.max_bytes
    }

    pub fn push(&mut self, doc: Vec<u8>) {
        self.total_bytes += doc.len();
        self.docs.push(doc);
    }

    /// Number of buffered documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Take buffered documents, resetting internal state
    pub fn take(&mut self) -> Vec<Vec<u8>> {
        self.total_bytes = 0;
        std::mem::take(&mut self.docs)
    }
}

impl Default for BatchBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCH_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    #[test]
    fn empty_buffer_accepts_oversized_document() {
        let buf = BatchBuffer::new(10 * MIB);
        assert!(!buf.would_overflow(12 * MIB));
    }

    #[test]
    fn second_large_document_overflows() {
        let mut buf = BatchBuffer::new(10 * MIB);
        buf.push(vec![b'x'; 6 * MIB]);
        assert!(buf.would_overflow(6 * MIB));
        assert!(!buf.would_overflow(4 * MIB));
    }

    #[test]
    fn exact_fill_does_not_overflow() {
        let mut buf = BatchBuffer::new(10);
        buf.push(vec![0; 4]);
        assert!(!buf.would_overflow(6));
        assert!(buf.would_overflow(7));
    }

    #[test]
    fn take_resets_state() {
        let mut buf = BatchBuffer::new(100);
        buf.push(b"<a/>".to_vec());
        buf.push(b"<b/>".to_vec());
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.total_bytes(), 8);

        let docs = buf.take();
        assert_eq!(docs.len(), 2);
        assert!(buf.is_empty());
        assert_eq!(buf.total_bytes(), 0);
    }
}
