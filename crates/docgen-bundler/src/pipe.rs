//! Bounded in-memory byte pipe connecting pipeline stages.
//!
//! At most one chunk is in flight: a writer blocks until the reader has taken
//! the previous chunk. Dropping the writer signals end of stream, closing it
//! with an error delivers that error to the reader's next read. Writing after
//! the reader is gone fails with [`io::ErrorKind::BrokenPipe`].

use std::io::{self, Read, Write};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

type Chunk = io::Result<Vec<u8>>;

/// Create a connected reader/writer pair.
pub(crate) fn pipe() -> (PipeReader, PipeWriter) {
    let (tx, rx) = sync_channel(1);
    (
        PipeReader {
            rx,
            buf: Vec::new(),
            pos: 0,
        },
        PipeWriter { tx },
    )
}

/// Reading half of a [`pipe`].
pub(crate) struct PipeReader {
    rx: Receiver<Chunk>,
    buf: Vec<u8>,
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.buf.len() {
            match self.rx.recv() {
                Ok(Ok(chunk)) => {
                    self.buf = chunk;
                    self.pos = 0;
                }
                Ok(Err(err)) => return Err(err),
                // Writer dropped: end of stream.
                Err(_) => return Ok(0),
            }
        }
        let n = out.len().min(self.buf.len() - self.pos);
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Writing half of a [`pipe`].
pub(crate) struct PipeWriter {
    tx: SyncSender<Chunk>,
}

impl PipeWriter {
    /// Close the pipe so that the reader fails with `err`.
    pub(crate) fn close_with_error(self, err: io::Error) {
        // The reader may already be gone, nothing left to notify then.
        let _ = self.tx.send(Err(err));
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(Ok(buf.to_vec()))
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_pipe_transfers_bytes_in_order() {
        let (mut reader, mut writer) = pipe();

        let producer = thread::spawn(move || {
            for i in 0..100u8 {
                writer.write_all(&[i; 3]).unwrap();
            }
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        producer.join().unwrap();

        let expected: Vec<u8> = (0..100u8).flat_map(|i| [i; 3]).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_small_reads_drain_large_chunk() {
        let (mut reader, mut writer) = pipe();

        let producer = thread::spawn(move || writer.write_all(b"hello world").unwrap());

        let mut buf = [0u8; 4];
        let mut out = Vec::new();
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        producer.join().unwrap();

        assert_eq!(out, b"hello world");
    }

    #[test]
    fn test_close_with_error_reaches_reader() {
        let (mut reader, mut writer) = pipe();

        let producer = thread::spawn(move || {
            writer.write_all(b"partial").unwrap();
            writer.close_with_error(io::Error::other("stage failed"));
        });

        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        producer.join().unwrap();

        assert_eq!(err.to_string(), "stage failed");
        assert_eq!(out, b"partial");
    }

    #[test]
    fn test_write_after_reader_dropped_is_broken_pipe() {
        let (reader, mut writer) = pipe();
        drop(reader);

        let err = writer.write_all(b"data").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
