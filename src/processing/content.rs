//! Deadline-bounded content reading

use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::HASH_CHUNK_SIZE;
use crate::core::ContentSource;

type Chunk = io::Result<Vec<u8>>;

fn timed_out() -> io::Error {
	io::Error::new(io::ErrorKind::TimedOut, "read timed out")
}

/// Reader that fails with `TimedOut` once its deadline has passed.
///
/// With a deadline, the inner reader runs on a helper thread and every
/// chunk is awaited with `recv_timeout`, so a hung read cannot hold the
/// caller past the deadline. End of input arriving after the deadline is
/// also a timeout. A helper stuck in a read exits once that read returns.
pub struct BoundedReader<R> {
	state: State<R>,
}

enum State<R> {
	Direct(R),
	Threaded {
		chunks: Receiver<Chunk>,
		deadline: Instant,
		pending: Vec<u8>,
		offset: usize,
		finished: bool,
	},
}

impl<R: Read + Send + 'static> BoundedReader<R> {
	pub fn new(inner: R, timeout: Option<Duration>) -> io::Result<Self> {
		let Some(timeout) = timeout else {
			return Ok(Self { state: State::Direct(inner) });
		};

		let deadline = Instant::now() + timeout;
		let chunks = spawn_reader(inner)?;
		Ok(Self {
			state: State::Threaded {
				chunks,
				deadline,
				pending: Vec::new(),
				offset: 0,
				finished: false,
			},
		})
	}
}

fn spawn_reader<R: Read + Send + 'static>(mut inner: R) -> io::Result<Receiver<Chunk>> {
	// One chunk in flight; the helper stops as soon as the receiver is gone
	let (tx, rx) = mpsc::sync_channel::<Chunk>(1);
	thread::Builder::new().name("dupesift-read".to_string()).spawn(move || {
		let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
		loop {
			let chunk = match inner.read(&mut buffer) {
				Ok(n) => Ok(buffer[..n].to_vec()),
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => Err(e),
			};
			let last = !matches!(&chunk, Ok(bytes) if !bytes.is_empty());
			if tx.send(chunk).is_err() || last {
				break;
			}
		}
	})?;
	Ok(rx)
}

impl<R: Read> Read for BoundedReader<R> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let (chunks, deadline, pending, offset, finished) = match &mut self.state {
			State::Direct(inner) => return inner.read(buf),
			State::Threaded { chunks, deadline, pending, offset, finished } => {
				(chunks, *deadline, pending, offset, finished)
			}
		};

		if *offset < pending.len() {
			let n = buf.len().min(pending.len() - *offset);
			buf[..n].copy_from_slice(&pending[*offset..*offset + n]);
			*offset += n;
			return Ok(n);
		}
		if *finished || buf.is_empty() {
			return Ok(0);
		}

		let now = Instant::now();
		if now >= deadline {
			return Err(timed_out());
		}
		let chunk = match chunks.recv_timeout(deadline - now) {
			Ok(chunk) => chunk?,
			Err(RecvTimeoutError::Timeout) => return Err(timed_out()),
			Err(RecvTimeoutError::Disconnected) => {
				return Err(io::Error::other("reader thread stopped before end of input"));
			}
		};
		if Instant::now() >= deadline {
			return Err(timed_out());
		}

		if chunk.is_empty() {
			*finished = true;
			return Ok(0);
		}
		let n = buf.len().min(chunk.len());
		buf[..n].copy_from_slice(&chunk[..n]);
		*pending = chunk;
		*offset = n;
		Ok(n)
	}
}

/// Read up to `max_bytes` of a source as text, replacing invalid UTF-8
pub fn read_text(source: &dyn ContentSource, max_bytes: u64, timeout: Option<Duration>) -> io::Result<String> {
	let reader = BoundedReader::new(source.open()?, timeout)?;
	let mut bytes = Vec::new();
	reader.take(max_bytes).read_to_end(&mut bytes)?;
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read at most `limit` leading bytes of a source
pub fn read_prefix(source: &dyn ContentSource, limit: usize, timeout: Option<Duration>) -> io::Result<Vec<u8>> {
	let reader = BoundedReader::new(source.open()?, timeout)?;
	let mut bytes = Vec::with_capacity(limit);
	reader.take(limit as u64).read_to_end(&mut bytes)?;
	Ok(bytes)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::MemorySource;

	/// Sleeps on every read, then reports end of input
	struct StallingReader(Duration);

	impl Read for StallingReader {
		fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
			thread::sleep(self.0);
			Ok(0)
		}
	}

	#[test]
	fn test_read_text_is_lossy_and_capped() {
		let source = MemorySource::new(vec![b'h', b'i', 0xff, b'!', b'x', b'y']);
		let text = read_text(&source, 4, None).unwrap();
		assert_eq!(text, "hi\u{fffd}!");

		let text = read_text(&source, 4, Some(Duration::from_secs(5))).unwrap();
		assert_eq!(text, "hi\u{fffd}!");
	}

	#[test]
	fn test_expired_deadline_times_out() {
		let source = MemorySource::new(vec![b'a'; 128]);
		let err = read_text(&source, 1024, Some(Duration::ZERO)).unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::TimedOut);
	}

	#[test]
	fn test_empty_source_reads_empty() {
		let source = MemorySource::new(Vec::new());
		assert_eq!(read_text(&source, 1024, None).unwrap(), "");
		assert_eq!(read_text(&source, 1024, Some(Duration::from_secs(5))).unwrap(), "");
	}

	#[test]
	fn test_stalled_read_returns_at_deadline() {
		let start = Instant::now();
		let mut reader = BoundedReader::new(StallingReader(Duration::from_secs(2)), Some(Duration::from_millis(50))).unwrap();
		let mut bytes = Vec::new();
		let err = reader.read_to_end(&mut bytes).unwrap_err();

		assert_eq!(err.kind(), io::ErrorKind::TimedOut);
		assert!(start.elapsed() < Duration::from_secs(1), "waited {:?}", start.elapsed());
		assert!(bytes.is_empty());
	}

	#[test]
	fn test_end_of_input_after_deadline_times_out() {
		let mut reader =
			BoundedReader::new(StallingReader(Duration::from_millis(200)), Some(Duration::from_millis(20))).unwrap();
		let err = reader.read(&mut [0u8; 16]).unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::TimedOut);
	}

	#[test]
	fn test_large_input_spans_many_chunks() {
		let data: Vec<u8> = (0..HASH_CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
		let mut reader = BoundedReader::new(io::Cursor::new(data.clone()), Some(Duration::from_secs(10))).unwrap();
		let mut out = Vec::new();
		reader.read_to_end(&mut out).unwrap();
		assert_eq!(out, data);
	}

	#[test]
	fn test_read_prefix() {
		let source = MemorySource::new(b"hello world".to_vec());
		assert_eq!(read_prefix(&source, 5, Some(Duration::from_secs(5))).unwrap(), b"hello");
	}
}
