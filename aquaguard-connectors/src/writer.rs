//! Line-oriented connector over any `io::Write`
//!
//! Each message becomes `<topic> <body>\n`. Useful for piping readings to
//! stdout, a serial console or an append-only log file.

use std::io::Write;

use crate::{Connector, ConnectorError};

#[derive(Debug)]
pub struct WriterConnector<W: Write> {
    writer: W,
}

impl<W: Write> WriterConnector<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Connector for WriterConnector<W> {
    type Error = ConnectorError;

    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error> {
        self.writer.write_all(topic.as_bytes())?;
        self.writer.write_all(b" ")?;
        self.writer.write_all(data)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
