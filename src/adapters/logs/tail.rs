//! Log Tail - Last N Lines and Follow Stream
//!
//! `tail_lines` reads backwards in fixed-size chunks so large logs
//! are never loaded whole. `follow_lines` turns appends to a file
//! into a `Stream` of lines; it never ends on its own and is meant
//! to be raced against Ctrl-C.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::Stream;
use futures_util::stream;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::ports::logs::{LogReader, LogTail};

/// Backwards read granularity.
const CHUNK_SIZE: u64 = 8 * 1024;

/// Last `count` lines of `path` and the file length at read time.
///
/// # Errors
/// Returns any I/O error from opening or reading the file.
pub async fn tail_lines(path: &Path, count: usize) -> io::Result<LogTail> {
    let mut file = File::open(path).await?;
    let len = file.metadata().await?.len();
    if count == 0 || len == 0 {
        return Ok(LogTail {
            lines: Vec::new(),
            end_offset: len,
        });
    }

    let mut pos = len;
    let mut buf: Vec<u8> = Vec::new();
    loop {
        let read = CHUNK_SIZE.min(pos);
        pos -= read;
        file.seek(SeekFrom::Start(pos)).await?;

        let mut chunk = vec![0u8; usize::try_from(read).unwrap_or(usize::MAX)];
        file.read_exact(&mut chunk).await?;
        chunk.extend_from_slice(&buf);
        buf = chunk;

        // More newlines than wanted lines means the first, possibly
        // partial, line can be dropped.
        let newlines = buf.iter().filter(|&&b| b == b'\n').count();
        if pos == 0 || newlines > count {
            break;
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let all: Vec<&str> = text.lines().collect();
    let skip = all.len().saturating_sub(count);

    Ok(LogTail {
        lines: all[skip..].iter().map(|l| (*l).to_string()).collect(),
        end_offset: len,
    })
}

/// Stream every line appended to `path` after `offset`.
///
/// The file is polled every `poll`. A file shorter than the current
/// offset is treated as truncated and re-read from the start; a
/// missing file is waited for.
pub fn follow_lines(
    path: PathBuf,
    offset: u64,
    poll: Duration,
) -> impl Stream<Item = io::Result<String>> {
    let state = FollowState {
        path,
        offset,
        partial: Vec::new(),
        ready: VecDeque::new(),
    };

    stream::unfold(state, move |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                return Some((Ok(line), state));
            }
            match state.read_appended().await {
                Ok(true) => {}
                Ok(false) => tokio::time::sleep(poll).await,
                Err(e) => return Some((Err(e), state)),
            }
        }
    })
}

struct FollowState {
    path: PathBuf,
    offset: u64,
    /// Bytes after the last newline seen.
    partial: Vec<u8>,
    ready: VecDeque<String>,
}

impl FollowState {
    /// Read newly appended bytes. Returns whether anything was read.
    async fn read_appended(&mut self) -> io::Result<bool> {
        let len = match fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        if len < self.offset {
            self.offset = 0;
            self.partial.clear();
        }
        if len == self.offset {
            return Ok(false);
        }

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut appended = Vec::new();
        let read = file.read_to_end(&mut appended).await?;
        self.offset += read as u64;
        self.partial.extend_from_slice(&appended);

        while let Some(idx) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=idx).collect();
            let text = String::from_utf8_lossy(&line[..idx]);
            self.ready.push_back(text.trim_end_matches('\r').to_string());
        }

        Ok(read > 0)
    }
}

/// [`LogReader`] over plain files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLogReader;

#[async_trait]
impl LogReader for FileLogReader {
    async fn tail(&self, path: &Path, lines: usize) -> io::Result<Option<LogTail>> {
        match tail_lines(path, lines).await {
            Ok(tail) => Ok(Some(tail)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::io::Write;

    fn write_log(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("bot.log");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_fewer_lines_than_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), "one\ntwo\n");
        let tail = tail_lines(&path, 50).await.unwrap();
        assert_eq!(tail.lines, ["one", "two"]);
        assert_eq!(tail.end_offset, 8);
    }

    #[tokio::test]
    async fn test_last_lines_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), "a\nb\nc\r\nd");
        let tail = tail_lines(&path, 2).await.unwrap();
        assert_eq!(tail.lines, ["c", "d"]);
    }

    #[tokio::test]
    async fn test_tail_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let content: String = (0..5_000).map(|i| format!("line {i:05} of the log\n")).collect();
        let path = write_log(dir.path(), &content);

        let tail = tail_lines(&path, 700).await.unwrap();
        assert_eq!(tail.lines.len(), 700);
        assert_eq!(tail.lines[0], "line 04300 of the log");
        assert_eq!(tail.lines[699], "line 04999 of the log");
    }

    #[tokio::test]
    async fn test_empty_file_and_zero_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), "");
        assert!(tail_lines(&path, 10).await.unwrap().lines.is_empty());

        let path = write_log(dir.path(), "x\n");
        assert!(tail_lines(&path, 0).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_reader_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let tail = FileLogReader.tail(&dir.path().join("none.log"), 5).await.unwrap();
        assert!(tail.is_none());
    }

    #[tokio::test]
    async fn test_follow_yields_appended_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), "old\n");
        let offset = tail_lines(&path, 10).await.unwrap().end_offset;

        let stream = follow_lines(path.clone(), offset, Duration::from_millis(10));
        futures_util::pin_mut!(stream);

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"new 1\nnew ").unwrap();
        file.write_all(b"2\n").unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(first, "new 1");
        assert_eq!(second, "new 2");
    }

    #[tokio::test]
    async fn test_follow_restarts_after_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), "a long line that will be truncated away\n");
        let offset = tail_lines(&path, 1).await.unwrap().end_offset;

        let stream = follow_lines(path.clone(), offset, Duration::from_millis(10));
        futures_util::pin_mut!(stream);

        std::fs::write(&path, "fresh\n").unwrap();

        let line = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(line, "fresh");
    }
}
