//! Length-bounded line reading.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// A line read by [`LineReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
  pub text: String,
  pub truncated: bool,
}

/// Splits a byte stream into `\n` terminated lines of at most `limit` bytes.
///
/// Longer lines are cut at the limit and flagged; the rest of the line is
/// read and discarded. A trailing `\r` is removed. Invalid UTF-8 is replaced.
pub struct LineReader<R> {
  inner: R,
  limit: usize,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
  pub fn new(inner: R, limit: usize) -> Self {
    Self { inner, limit }
  }

  /// Read the next line, or `None` at end of stream.
  pub async fn next_line(&mut self) -> io::Result<Option<RawLine>> {
    let mut buf = Vec::new();
    let mut truncated = false;
    let mut saw_any = false;

    loop {
      let available = self.inner.fill_buf().await?;
      if available.is_empty() {
        if !saw_any {
          return Ok(None);
        }
        break;
      }
      saw_any = true;

      match available.iter().position(|b| *b == b'\n') {
        Some(end) => {
          let mut segment = &available[..end];
          if let Some(stripped) = segment.strip_suffix(b"\r") {
            segment = stripped;
          } else if segment.is_empty() && !truncated && buf.last() == Some(&b'\r') {
            buf.pop();
          }
          append_bounded(&mut buf, segment, self.limit, &mut truncated);
          self.inner.consume(end + 1);
          break;
        }
        None => {
          let len = available.len();
          append_bounded(&mut buf, available, self.limit, &mut truncated);
          self.inner.consume(len);
        }
      }
    }

    Ok(Some(RawLine {
      text: String::from_utf8_lossy(&buf).into_owned(),
      truncated,
    }))
  }
}

fn append_bounded(buf: &mut Vec<u8>, chunk: &[u8], limit: usize, truncated: &mut bool) {
  let room = limit.saturating_sub(buf.len());
  if chunk.len() > room {
    buf.extend_from_slice(&chunk[..room]);
    *truncated = true;
  } else {
    buf.extend_from_slice(chunk);
  }
}
