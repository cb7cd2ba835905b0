//! Batch output: XML container files written with atomic tmp→rename

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::batch::BatchBuffer;

/// Tag wrapping every document of one batch file.
pub const CONTAINER_TAG: &str = "file";

/// Write `bytes` to `path` via a sibling `.tmp` file and a rename.
///
/// A reader never observes `path` with truncated content.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    {
        let mut file = io::BufWriter::new(fs::File::create(&tmp_path)?);
        file.write_all(bytes)?;
        file.flush()?;
    }
    fs::rename(&tmp_path, path)
}

/// Wrap serialized documents in the container tag and write them atomically.
pub fn write_batch_file(path: &Path, docs: &[Vec<u8>]) -> io::Result<()> {
    let payload: usize = docs.iter().map(|d| d.len() + 1).sum();
    let mut out = Vec::with_capacity(payload + 2 * CONTAINER_TAG.len() + 8);
    out.extend_from_slice(format!("<{CONTAINER_TAG}>\n").as_bytes());
    for doc in docs {
        out.extend_from_slice(doc);
        out.push(b'\n');
    }
    out.extend_from_slice(format!("</{CONTAINER_TAG}>\n").as_bytes());
    write_atomic(path, &out)
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    if !output_dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Numbered batch files `<stub>-<N>.xml` in one directory.
///
/// Documents are buffered until the next one would exceed the byte
/// threshold; the buffer is then written under the current index and the
/// index advances.
pub struct BatchSink {
    target_dir: PathBuf,
    stub: String,
    index: usize,
    buffer: BatchBuffer,
    written: Vec<PathBuf>,
}

impl std::fmt::Debug for BatchSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchSink")
            .field("target_dir", &self.target_dir)
            .field("current", &self.current_filename())
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl BatchSink {
    /// Create a sink whose first batch gets number `first_index`.
    pub fn new(
        target_dir: impl Into<PathBuf>,
        stub: impl Into<String>,
        first_index: usize,
        max_bytes: usize,
    ) -> Self {
        Self {
            target_dir: target_dir.into(),
            stub: stub.into(),
            index: first_index,
            buffer: BatchBuffer::new(max_bytes),
            written: Vec::new(),
        }
    }

    /// File name the buffered documents will be flushed under.
    pub fn current_filename(&self) -> String {
        format!("{}-{}.xml", self.stub, self.index)
    }

    /// Buffer one serialized document, flushing first if it would not fit.
    ///
    /// Returns the name of the batch file the document ends up in.
    pub fn push(&mut self, doc: Vec<u8>) -> io::Result<String> {
        if self.buffer.would_overflow(doc.len()) {
            self.flush()?;
        }
        self.buffer.push(doc);
        Ok(self.current_filename())
    }

    /// Write buffered documents (if any) and advance to the next index.
    pub fn flush(&mut self) -> io::Result<Option<PathBuf>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let path = self.target_dir.join(self.current_filename());
        let docs = self.buffer.take();
        write_batch_file(&path, &docs)?;
        log::info!("  File {} written ({} documents)", path.display(), docs.len());
        self.index += 1;
        self.written.push(path.clone());
        Ok(Some(path))
    }

    /// Flush the remainder and return every file written by this sink.
    pub fn finish(mut self) -> io::Result<Vec<PathBuf>> {
        self.flush()?;
        Ok(self.written)
    }
}
