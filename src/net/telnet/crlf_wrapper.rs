use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::io::{self, AsyncWrite};

/// Normalizes bare '\n' to "\r\n" on all writes.
///
/// The input `buf.len()` is only reported as written once the expanded
/// data has fully reached the inner writer.
pub struct CrlfWriter<W> {
    inner: W,
    // Buffered, expanded output awaiting flush
    out_buf: Vec<u8>,
    out_pos: usize,
    // Last byte taken from the caller, so "\r\n" is not expanded twice
    last: u8,
}

impl<W: AsyncWrite + Unpin> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            out_buf: Vec::new(),
            out_pos: 0,
            last: 0,
        }
    }

    fn expand_crlf(&mut self, src: &[u8]) {
        self.out_buf.reserve(src.len());
        for &b in src {
            if b == b'\n' && self.last != b'\r' {
                self.out_buf.push(b'\r');
            }
            self.out_buf.push(b);
            self.last = b;
        }
    }

    /// Try to flush `out_buf` into inner.
    fn poll_flush_outbuf(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.out_pos < self.out_buf.len() {
            let n = ready!(Pin::new(&mut self.inner).poll_write(cx, &self.out_buf[self.out_pos..]))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.out_pos += n;
        }

        self.out_buf.clear();
        self.out_pos = 0;
        Poll::Ready(Ok(()))
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for CrlfWriter<W> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        // Pending expanded bytes go out first.
        ready!(this.poll_flush_outbuf(cx))?;

        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        this.expand_crlf(buf);

        // The chunk is ours now; whatever is left is flushed on the next call.
        match this.poll_flush_outbuf(cx) {
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            _ => Poll::Ready(Ok(buf.len())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_flush_outbuf(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_flush_outbuf(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn expands_bare_newlines_only() {
        let mut w = CrlfWriter::new(Vec::new());
        w.write_all(b"a\nb\r\nc\n").await.unwrap();
        w.flush().await.unwrap();
        assert_eq!(w.inner, b"a\r\nb\r\nc\r\n");
    }

    #[tokio::test]
    async fn crlf_split_across_writes() {
        let mut w = CrlfWriter::new(Vec::new());
        w.write_all(b"x\r").await.unwrap();
        w.write_all(b"\ny").await.unwrap();
        w.flush().await.unwrap();
        assert_eq!(w.inner, b"x\r\ny");
    }
}
