//! Low-level modem stream handling.
//!
//! Modems terminate lines with CR, LF or both, and pad responses with blank
//! lines. [`ModemStream`] buffers incoming bytes and hands out one non-empty
//! line at a time. The buffer lives in the stream, so a read cancelled by a
//! timeout never loses a partially received line.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{DataBits, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, trace};

use super::ModemChannel;
use super::config::DeviceConfig;
use crate::error::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// Longest line accepted before the buffer is discarded as noise.
const MAX_LINE_LENGTH: usize = 1024;

/// Line-oriented modem connection over any byte stream.
#[derive(Debug)]
pub struct ModemStream<S> {
    inner: S,
    buffer: BytesMut,
}

impl<S> ModemStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Reads the next non-empty line, waiting at most `wait`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if no complete line arrives in time,
    /// [`Error::Closed`] at end of stream, [`Error::Io`] if the read fails and
    /// [`Error::MalformedNotification`] for over-long lines.
    pub async fn read_line(&mut self, wait: Duration) -> Result<String> {
        timeout(wait, self.next_line())
            .await
            .map_err(|_| Error::Timeout(wait))?
    }

    async fn next_line(&mut self) -> Result<String> {
        loop {
            if let Some(line) = self.take_line() {
                trace!(line = %line, "modem <");
                return Ok(line);
            }

            if self.buffer.len() > MAX_LINE_LENGTH {
                let len = self.buffer.len();
                self.buffer.clear();
                return Err(Error::MalformedNotification(format!(
                    "line exceeds {MAX_LINE_LENGTH} bytes ({len} buffered)"
                )));
            }

            let read = self.inner.read_buf(&mut self.buffer).await?;
            if read == 0 {
                return Err(Error::Closed);
            }
        }
    }

    /// Splits the first complete, non-blank line off the buffer.
    fn take_line(&mut self) -> Option<String> {
        loop {
            let end = self.buffer.iter().position(|&b| b == b'\r' || b == b'\n')?;
            let raw = self.buffer.split_to(end);
            self.buffer.advance(1);

            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
    }

    /// Writes raw bytes and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] if the device rejects the write.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(data);
        trace!(data = %text.trim_end(), "modem >");
        self.inner.write_all(data).await.map_err(Error::Write)?;
        self.inner.flush().await.map_err(Error::Write)?;
        Ok(())
    }
}

impl<S> ModemChannel for ModemStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn read_line(&mut self, wait: Duration) -> Result<String> {
        Self::read_line(self, wait).await
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        Self::write(self, data).await
    }
}

/// Opens the serial device described by `config`.
///
/// # Errors
///
/// Returns [`Error::DeviceUnavailable`] if the device node cannot be opened
/// or configured.
pub fn open(config: &DeviceConfig) -> Result<ModemStream<SerialStream>> {
    let stop_bits = if config.two_stop_bits {
        StopBits::Two
    } else {
        StopBits::One
    };

    let port = tokio_serial::new(&config.path, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(config.parity.into())
        .stop_bits(stop_bits)
        .flow_control(config.flow_control.into())
        .open_native_async()
        .map_err(|source| Error::DeviceUnavailable {
            path: config.path.clone(),
            source,
        })?;

    debug!(path = %config.path, baud = config.baud_rate, "serial device opened");
    Ok(ModemStream::new(port))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_line_crlf() {
        let mock = Builder::new().read(b"\r\nOK\r\n").build();
        let mut stream = ModemStream::new(mock);

        let line = stream.read_line(Duration::from_secs(1)).await.unwrap();
        assert_eq!(line, "OK");
    }

    #[tokio::test]
    async fn test_read_line_split_chunks() {
        let mock = Builder::new()
            .read(b"NMBR = 555")
            .read(b"1234567\r\nNAME = ACME\n")
            .build();
        let mut stream = ModemStream::new(mock);

        let wait = Duration::from_secs(1);
        assert_eq!(stream.read_line(wait).await.unwrap(), "NMBR = 5551234567");
        assert_eq!(stream.read_line(wait).await.unwrap(), "NAME = ACME");
    }

    #[tokio::test]
    async fn test_read_line_bare_cr() {
        let mock = Builder::new().read(b"RING\rRING\r").build();
        let mut stream = ModemStream::new(mock);

        let wait = Duration::from_secs(1);
        assert_eq!(stream.read_line(wait).await.unwrap(), "RING");
        assert_eq!(stream.read_line(wait).await.unwrap(), "RING");
    }

    #[tokio::test]
    async fn test_read_line_eof_is_closed() {
        let mock = Builder::new().read(b"partial").build();
        let mut stream = ModemStream::new(mock);

        let result = stream.read_line(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Error::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_line_timeout_keeps_partial_line() {
        let mock = Builder::new()
            .read(b"NMBR = 55")
            .wait(Duration::from_secs(5))
            .read(b"51234\r\n")
            .build();
        let mut stream = ModemStream::new(mock);

        let result = stream.read_line(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Error::Timeout(_))));

        let line = stream.read_line(Duration::from_secs(10)).await.unwrap();
        assert_eq!(line, "NMBR = 5551234");
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 1);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut stream = ModemStream::new(mock);

        let result = stream.read_line(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Error::MalformedNotification(_))));
    }

    #[tokio::test]
    async fn test_write() {
        let mock = Builder::new().write(b"ATZ\r").build();
        let mut stream = ModemStream::new(mock);

        stream.write(b"ATZ\r").await.unwrap();
    }

    #[tokio::test]
    async fn test_open_missing_device() {
        let config = DeviceConfig::new("/dev/callblock-does-not-exist");
        let result = open(&config);
        assert!(matches!(result, Err(Error::DeviceUnavailable { .. })));
    }
}
