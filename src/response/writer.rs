use http::StatusCode;
use std::io;
use thiserror::Error;
use tokio::sync::watch;

use super::descriptor::ResponseDescriptor;
use super::headers::HeaderTable;

/// `Content-Type` used when the handler commits without setting one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf8";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResponseError {
    #[error("gateway[response]: write after response end")]
    Closed,
}

#[derive(Debug, Clone)]
struct Committed {
    status: u16,
    headers: HeaderTable,
}

/// Response sink handed to HTTP handlers.
///
/// Headers are buffered until the status is committed, either explicitly via
/// [`ResponseWriter::write_header`] or implicitly (status 200) by the first
/// [`ResponseWriter::write`]. Header changes after the commit are not part of
/// the response. The body is buffered whole; [`ResponseWriter::end`]
/// finalizes it into a [`ResponseDescriptor`] exactly once.
#[derive(Debug)]
pub struct ResponseWriter {
    headers: HeaderTable,
    committed: Option<Committed>,
    body: Vec<u8>,
    finished: Option<ResponseDescriptor>,
    done: watch::Sender<bool>,
}

impl ResponseWriter {
    #[must_use]
    pub fn new() -> Self {
        let (done, _) = watch::channel(false);
        Self {
            headers: HeaderTable::new(),
            committed: None,
            body: Vec::new(),
            finished: None,
            done,
        }
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    pub const fn headers_mut(&mut self) -> &mut HeaderTable {
        &mut self.headers
    }

    /// Committed status code, if the status line has been committed.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.committed.as_ref().map(|c| c.status)
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.finished.is_some()
    }

    /// Commits `status` and the current headers. Only the first call counts.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.is_closed() {
            return;
        }
        self.commit(status.as_u16());
    }

    /// Appends `bytes` to the body, committing status 200 first if needed.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::Closed` once the response has ended.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, ResponseError> {
        if self.is_closed() {
            return Err(ResponseError::Closed);
        }
        self.commit(StatusCode::OK.as_u16());
        self.body.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Receiver that flips to `true` once [`ResponseWriter::end`] has run.
    #[must_use]
    pub fn close_notify(&self) -> watch::Receiver<bool> {
        self.done.subscribe()
    }

    /// Finalizes the response. Later calls return the same descriptor and
    /// every later write is rejected.
    pub fn end(&mut self) -> ResponseDescriptor {
        if let Some(finished) = &self.finished {
            return finished.clone();
        }

        let committed = self.commit(StatusCode::OK.as_u16()).clone();
        let body = std::mem::take(&mut self.body);
        let descriptor = ResponseDescriptor::capture(committed.status, &committed.headers, body);

        self.finished = Some(descriptor.clone());
        self.done.send_replace(true);
        descriptor
    }

    fn commit(&mut self, status: u16) -> &Committed {
        if self.committed.is_none() && self.headers.get("Content-Type").is_none_or(str::is_empty)
        {
            self.headers.set("Content-Type", DEFAULT_CONTENT_TYPE);
        }
        self.committed.get_or_insert_with(|| Committed {
            status,
            headers: self.headers.clone(),
        })
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Self::write(self, buf).map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_text_content_types_stay_text() {
        let kinds = [
            "text/x-custom",
            "text/plain",
            "text/plain; charset=utf-8",
            "application/json",
            "application/json; charset=utf-8",
            "application/xml",
            "image/svg+xml",
        ];

        for kind in kinds {
            let mut w = ResponseWriter::new();
            let notify = w.close_notify();
            w.headers_mut().set("Content-Type", kind);
            w.write(b"hello world\n").unwrap();

            let e = w.end();
            assert_eq!(e.status_code, 200, "{kind}");
            assert_eq!(e.body, "hello world\n", "{kind}");
            assert_eq!(e.headers["Content-Type"], kind);
            assert!(!e.is_base64_encoded, "{kind}");
            assert!(*notify.borrow(), "{kind}");
        }
    }

    #[test]
    fn test_binary_content_type() {
        let mut w = ResponseWriter::new();
        w.headers_mut().set("Content-Type", "image/png");
        w.write(b"hello world\n").unwrap();

        let e = w.end();
        assert_eq!(e.status_code, 200);
        assert_eq!(e.body, "aGVsbG8gd29ybGQK");
        assert_eq!(e.headers["Content-Type"], "image/png");
        assert!(e.is_base64_encoded);
    }

    #[test]
    fn test_gzip_forces_base64() {
        let mut w = ResponseWriter::new();
        w.headers_mut().set("Content-Type", "text/plain");
        w.headers_mut().set("Content-Encoding", "gzip");
        w.write(b"hello world\n").unwrap();

        let e = w.end();
        assert_eq!(e.body, "aGVsbG8gd29ybGQK");
        assert_eq!(e.headers["Content-Type"], "text/plain");
        assert!(e.is_base64_encoded);
    }

    #[test]
    fn test_write_header_sets_status_and_default_content_type() {
        let mut w = ResponseWriter::new();
        w.write_header(StatusCode::NOT_FOUND);
        w.write(b"Not Found\n").unwrap();

        let e = w.end();
        assert_eq!(e.status_code, 404);
        assert_eq!(e.body, "Not Found\n");
        assert_eq!(e.headers["Content-Type"], DEFAULT_CONTENT_TYPE);
        assert!(!e.is_base64_encoded);
    }

    #[test]
    fn test_first_status_wins() {
        let mut w = ResponseWriter::new();
        w.write(b"ok").unwrap();
        w.write_header(StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(w.status(), Some(200));
        assert_eq!(w.end().status_code, 200);
    }

    #[test]
    fn test_headers_after_commit_are_ignored() {
        let mut w = ResponseWriter::new();
        w.headers_mut().set("Content-Type", "text/plain");
        w.write(b"hello").unwrap();
        w.headers_mut().set("Content-Type", "image/png");
        w.headers_mut().set("X-Late", "1");

        let e = w.end();
        assert_eq!(e.headers["Content-Type"], "text/plain");
        assert!(!e.headers.contains_key("X-Late"));
        assert!(!e.is_base64_encoded);
    }

    #[test]
    fn test_end_without_write() {
        let mut w = ResponseWriter::new();
        let e = w.end();

        assert_eq!(e.status_code, 200);
        assert_eq!(e.body, "");
        assert_eq!(e.headers["Content-Type"], DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_writes_after_end_are_rejected() {
        let mut w = ResponseWriter::new();
        w.write(b"first").unwrap();
        let first = w.end();

        assert_eq!(w.write(b"second"), Err(ResponseError::Closed));
        assert!(writeln!(w, "third").is_err());
        w.write_header(StatusCode::IM_A_TEAPOT);

        assert!(w.is_closed());
        assert_eq!(w.end(), first);
        assert_eq!(first.body, "first");
    }

    #[test]
    fn test_io_write() {
        let mut w = ResponseWriter::new();
        write!(w, "Hello {}", "World").unwrap();
        assert_eq!(w.end().body, "Hello World");
    }

    #[test]
    fn test_close_notify_wakes_waiters() {
        let mut w = ResponseWriter::new();
        let mut notify = w.close_notify();
        assert!(!*notify.borrow());

        w.end();
        drop(w);

        let done = tokio_test::block_on(notify.wait_for(|done| *done)).map(|v| *v);
        assert!(matches!(done, Ok(true)));
    }
}
