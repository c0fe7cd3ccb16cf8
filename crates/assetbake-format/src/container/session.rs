//! Writer sessions
//!
//! A [`WriterSession`] owns the output stream for one container write:
//! `begin` opens it, `write_span` appends contiguous runs of records and
//! `finish` hands the stream back. Holding the session by value is what
//! keeps a second writer off the same stream.

use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use assetbake_core::{Error, Result, ResultExt};

/// Output stream plus the running byte offset of the container being written
#[derive(Debug)]
pub struct WriterSession<W: Write + Seek> {
    writer: W,
    start: u64,
    offset: u64,
}

impl<W: Write + Seek> WriterSession<W> {
    /// Start a session at the writer's current position
    pub fn begin(mut writer: W) -> Result<Self> {
        let start = writer.stream_position()?;
        Ok(Self {
            writer,
            start,
            offset: start,
        })
    }

    /// Write one contiguous span, advance the offset and re-sync the
    /// stream position to it
    pub fn write_span(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        self.writer.seek(SeekFrom::Start(self.offset))?;
        Ok(())
    }

    /// Encode records into a scratch buffer, then write it as one span
    pub fn write_records<F>(&mut self, capacity: usize, encode: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buffer = Vec::with_capacity(capacity);
        encode(&mut buffer)?;
        self.write_span(&buffer)
    }

    /// Absolute stream offset of the next byte
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes written since `begin`
    pub fn bytes_written(&self) -> u64 {
        self.offset - self.start
    }

    /// End the session, flushing and returning the stream
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Sibling path an in-progress file write goes to
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Removes the partial file unless the write was committed
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::debug!(path = %self.path.display(), error = %e, "Could not remove partial file");
            }
        }
    }
}

/// Run a writer session against `path`.
///
/// Bytes go to `<path>.partial` first, which is renamed over `path` only
/// after `write` and the flush succeed. On any failure the partial file is
/// removed and an existing file at `path` is left as it was.
pub fn write_container_file<F>(path: &Path, write: F) -> Result<u64>
where
    F: FnOnce(&mut WriterSession<BufWriter<File>>) -> Result<()>,
{
    let partial = partial_path(path);
    let file = File::create(&partial)
        .map_err(Error::from)
        .with_context(|| format!("creating {}", partial.display()))?;
    let mut guard = PartialFile {
        path: partial.clone(),
        committed: false,
    };

    let mut session = WriterSession::begin(BufWriter::new(file))?;
    write(&mut session)?;
    let written = session.bytes_written();
    let file = session
        .finish()?
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    file.sync_all()?;
    drop(file);

    fs::rename(&partial, path)
        .map_err(Error::from)
        .with_context(|| format!("committing {}", path.display()))?;
    guard.committed = true;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_session_tracks_offset() {
        let mut session = WriterSession::begin(Cursor::new(Vec::new())).unwrap();
        session.write_span(b"ast\0").unwrap();
        session
            .write_records(2, |buf| {
                buf.extend_from_slice(&[1, 0]);
                Ok(())
            })
            .unwrap();

        assert_eq!(session.offset(), 6);
        let cursor = session.finish().unwrap();
        assert_eq!(cursor.into_inner(), b"ast\0\x01\x00");
    }

    #[test]
    fn test_session_starts_at_current_position() {
        let mut cursor = Cursor::new(vec![0u8; 4]);
        cursor.set_position(4);
        let mut session = WriterSession::begin(cursor).unwrap();
        session.write_span(&[7, 7]).unwrap();
        assert_eq!(session.offset(), 6);
        assert_eq!(session.bytes_written(), 2);
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(partial_path(Path::new("out/a.ast")), PathBuf::from("out/a.ast.partial"));
    }

    #[test]
    fn test_failed_write_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hull.ast");
        fs::write(&path, b"original").unwrap();

        let result = write_container_file(&path, |session| {
            session.write_span(b"half")?;
            Err(Error::invalid_data("interrupted"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"original");
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_successful_write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hull.ast");
        fs::write(&path, b"original").unwrap();

        let written = write_container_file(&path, |session| session.write_span(b"new")).unwrap();

        assert_eq!(written, 3);
        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert!(!partial_path(&path).exists());
    }
}
