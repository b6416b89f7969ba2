//! Response emission.
//!
//! An [`Emitter`] writes the final response to wherever the hosting
//! environment expects it. [`CgiEmitter`] writes a CGI response (status
//! line, headers, blank line, body) to any writer, stdout by default;
//! [`MemoryEmitter`] records responses for inspection.

use std::io::{self, Write};

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tinyapp_core::{BoxFuture, DispatchError, DispatchResult, Response};
use tracing::debug;

/// Writes a finished response.
pub trait Emitter: Send + Sync {
    /// Emits `response`.
    fn emit(&self, response: Response) -> BoxFuture<'_, DispatchResult<()>>;
}

async fn into_parts(response: Response) -> (StatusCode, HeaderMap, Bytes) {
    let (parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };
    (parts.status, parts.headers, bytes)
}

/// Emits CGI responses to a writer.
///
/// ```rust
/// use http::StatusCode;
/// use tinyapp_core::{body, Response};
/// use tinyapp_server::{CgiEmitter, Emitter};
///
/// # tokio_test::block_on(async {
/// let emitter = CgiEmitter::new(Vec::new());
/// let mut response = Response::new(body("hi"));
/// *response.status_mut() = StatusCode::CREATED;
/// emitter.emit(response).await.unwrap();
///
/// let output = String::from_utf8(emitter.into_inner()).unwrap();
/// assert_eq!(output, "Status: 201 Created\r\n\r\nhi");
/// # });
/// ```
#[derive(Debug)]
pub struct CgiEmitter<W> {
    out: Mutex<W>,
}

impl CgiEmitter<io::Stdout> {
    /// Emits to the process's stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> CgiEmitter<W> {
    /// Emits to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// The writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write(&self, status: StatusCode, headers: &HeaderMap, body: &[u8]) -> io::Result<()> {
        let mut out = self.out.lock();
        write!(
            out,
            "Status: {} {}\r\n",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )?;
        for (name, value) in headers {
            out.write_all(name.as_str().as_bytes())?;
            out.write_all(b": ")?;
            out.write_all(value.as_bytes())?;
            out.write_all(b"\r\n")?;
        }
        out.write_all(b"\r\n")?;
        out.write_all(body)?;
        out.flush()
    }
}

impl<W: Write + Send> Emitter for CgiEmitter<W> {
    fn emit(&self, response: Response) -> BoxFuture<'_, DispatchResult<()>> {
        Box::pin(async move {
            let (status, headers, body) = into_parts(response).await;
            self.write(status, &headers, &body).map_err(DispatchError::Emit)?;
            debug!(status = status.as_u16(), bytes = body.len(), "response emitted");
            Ok(())
        })
    }
}

/// A response recorded by [`MemoryEmitter`].
#[derive(Debug, Clone)]
pub struct EmittedResponse {
    /// Status code.
    pub status: StatusCode,
    /// Headers.
    pub headers: HeaderMap,
    /// Collected body.
    pub body: Bytes,
}

impl EmittedResponse {
    /// The body as UTF-8 text, lossily.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Records emitted responses in memory.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    emitted: Mutex<Vec<EmittedResponse>>,
}

impl MemoryEmitter {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of responses emitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emitted.lock().len()
    }

    /// True if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emitted.lock().is_empty()
    }

    /// The most recent response.
    #[must_use]
    pub fn last(&self) -> Option<EmittedResponse> {
        self.emitted.lock().last().cloned()
    }

    /// Removes and returns everything recorded.
    pub fn take(&self) -> Vec<EmittedResponse> {
        std::mem::take(&mut *self.emitted.lock())
    }
}

impl Emitter for MemoryEmitter {
    fn emit(&self, response: Response) -> BoxFuture<'_, DispatchResult<()>> {
        Box::pin(async move {
            let (status, headers, body) = into_parts(response).await;
            self.emitted.lock().push(EmittedResponse {
                status,
                headers,
                body,
            });
            Ok(())
        })
    }
}
