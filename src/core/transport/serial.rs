//! Serial port transport implementation

use super::{LinePort, PortOpener, TransportError};
use crate::config::LinkConfig;
use serialport::{DataBits, FlowControl, Parity, StopBits};
use std::io::{ErrorKind, Read, Write};

/// Longest line kept while waiting for a terminator
pub const MAX_LINE_LEN: usize = 256;

const CHUNK_SIZE: usize = 64;

/// Opens real serial ports (8N1, no flow control)
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialOpener;

impl PortOpener for SerialOpener {
    fn open(&self, config: &LinkConfig) -> Result<Box<dyn LinePort>, TransportError> {
        let port = serialport::new(&config.device, config.baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout_duration())
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => TransportError::PortNotFound(config.device.clone()),
                serialport::ErrorKind::Io(ErrorKind::NotFound) => {
                    TransportError::PortNotFound(config.device.clone())
                }
                serialport::ErrorKind::Io(ErrorKind::PermissionDenied) => {
                    TransportError::PermissionDenied(config.device.clone())
                }
                _ => TransportError::OpenFailed {
                    device: config.device.clone(),
                    reason: e.to_string(),
                },
            })?;

        Ok(Box::new(StreamPort::new(&config.device, port)))
    }
}

/// Line framing over any byte stream whose reads time out
///
/// Bytes after the last newline stay buffered for the next call, so a line
/// split across two reads is still delivered whole.
pub struct StreamPort<S> {
    name: String,
    stream: S,
    buffer: Vec<u8>,
}

impl<S: Read + Write + Send> StreamPort<S> {
    /// Wrap a stream
    pub fn new(name: &str, stream: S) -> Self {
        Self {
            name: name.to_string(),
            stream,
            buffer: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        Some(self.buffer.drain(..=end).collect())
    }
}

impl<S: Read + Write + Send> LinePort for StreamPort<S> {
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        if let Some(line) = self.take_line() {
            return Ok(line);
        }

        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => {
                    tracing::trace!("{}: read {} bytes", self.name, n);
                    self.buffer.extend_from_slice(&chunk[..n]);
                    if let Some(line) = self.take_line() {
                        return Ok(line);
                    }
                    if self.buffer.len() >= MAX_LINE_LEN {
                        // No terminator in sight; hand the junk up as a non-frame
                        return Ok(std::mem::take(&mut self.buffer));
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::TimedOut => return Ok(Vec::new()),
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(data)?;
        self.stream.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>, TransportError> {
    serialport::available_ports().map_err(|e| TransportError::Io(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Replays scripted read results, records writes
    struct ScriptedStream {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
    }

    impl ScriptedStream {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
                written: Vec::new(),
            }
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::new(ErrorKind::TimedOut, "timeout")),
            }
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn timeout() -> io::Result<Vec<u8>> {
        Err(io::Error::new(ErrorKind::TimedOut, "timeout"))
    }

    #[test]
    fn test_line_split_across_reads() {
        let stream = ScriptedStream::new(vec![
            Ok(b":512,22".to_vec()),
            timeout(),
            Ok(b"3,47$\r\n:1,".to_vec()),
        ]);
        let mut port = StreamPort::new("test", stream);

        assert!(port.read_line().unwrap().is_empty());
        assert_eq!(port.read_line().unwrap(), b":512,223,47$\r\n");
        // Remainder stays buffered
        assert!(port.read_line().unwrap().is_empty());
        assert_eq!(port.buffer, b":1,");
    }

    #[test]
    fn test_two_lines_in_one_read() {
        let stream = ScriptedStream::new(vec![Ok(b":1,2,3$\r\n:4,5,6$\r\n".to_vec())]);
        let mut port = StreamPort::new("test", stream);

        assert_eq!(port.read_line().unwrap(), b":1,2,3$\r\n");
        assert_eq!(port.read_line().unwrap(), b":4,5,6$\r\n");
    }

    #[test]
    fn test_overlong_line_is_flushed() {
        let reads = (0..5).map(|_| Ok(vec![b'x'; CHUNK_SIZE])).collect();
        let mut port = StreamPort::new("test", ScriptedStream::new(reads));

        let line = port.read_line().unwrap();
        assert_eq!(line.len(), MAX_LINE_LEN);
        assert!(port.buffer.is_empty());
    }

    #[test]
    fn test_eof_is_disconnect() {
        let mut port = StreamPort::new("test", ScriptedStream::new(vec![Ok(Vec::new())]));
        assert!(matches!(port.read_line(), Err(TransportError::Disconnected)));
    }

    #[test]
    fn test_io_error_propagates() {
        let stream = ScriptedStream::new(vec![Err(io::Error::new(
            ErrorKind::BrokenPipe,
            "unplugged",
        ))]);
        let mut port = StreamPort::new("test", stream);
        assert!(matches!(port.read_line(), Err(TransportError::Io(_))));
    }

    #[test]
    fn test_write_bytes() {
        let mut port = StreamPort::new("test", ScriptedStream::new(Vec::new()));
        port.write_bytes(&[0x7F]).unwrap();
        assert_eq!(port.stream.written, vec![0x7F]);
    }
}
