// Streaming reader for the device inventory JSON.
//
// The document must be a single top-level array of objects. Elements are
// decoded one at a time straight from the reader, so the raw text is never
// held in memory. The array framing (`[`, `,`, `]`) is walked by hand and
// each object is handed to serde_json; an object is self-delimiting, so
// serde_json never reads past its closing brace.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use devrecon_recon::{DeviceRecord, ReconError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the opening `[`.
    Start,
    /// Inside the array; `first` until one element has been read.
    Open { first: bool },
    /// Closing `]` seen, or an error was returned.
    Done,
}

/// Lazy, non-restartable sequence of [`DeviceRecord`]s.
///
/// A malformed element or document ends the sequence: the error is yielded
/// once and every later call returns `None`.
pub struct DeviceRecordStream<R> {
    reader: R,
    path: PathBuf,
    state: State,
    index: usize,
}

/// Open `path` and stream its device records.
pub fn load_device_records(path: &Path) -> Result<DeviceRecordStream<BufReader<File>>, ReconError> {
    let file = File::open(path).map_err(|e| ReconError::unreadable(path, e.to_string()))?;
    log::info!("streaming device records from {}", path.display());
    Ok(DeviceRecordStream::new(BufReader::new(file), path))
}

impl<R: BufRead> DeviceRecordStream<R> {
    /// `path` is only used in error messages.
    pub fn new(reader: R, path: &Path) -> Self {
        Self {
            reader,
            path: path.to_path_buf(),
            state: State::Start,
            index: 0,
        }
    }

    fn malformed(&mut self, message: impl Into<String>) -> ReconError {
        self.state = State::Done;
        ReconError::malformed(&self.path, message)
    }

    fn io_error(&mut self, err: std::io::Error) -> ReconError {
        self.state = State::Done;
        ReconError::unreadable(&self.path, err.to_string())
    }

    /// Skip JSON whitespace and return the next byte without consuming it.
    fn peek_token(&mut self) -> std::io::Result<Option<u8>> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }
            let skip = buf
                .iter()
                .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
                .count();
            let next = buf.get(skip).copied();
            self.reader.consume(skip);
            if next.is_some() {
                return Ok(next);
            }
        }
    }

    fn skip_bom(&mut self) -> std::io::Result<()> {
        let buf = self.reader.fill_buf()?;
        if buf.starts_with(UTF8_BOM) {
            self.reader.consume(UTF8_BOM.len());
        }
        Ok(())
    }

    fn open_array(&mut self) -> Result<(), ReconError> {
        self.skip_bom().map_err(|e| self.io_error(e))?;
        match self.peek_token().map_err(|e| self.io_error(e))? {
            Some(b'[') => {
                self.reader.consume(1);
                self.state = State::Open { first: true };
                Ok(())
            }
            Some(b) => Err(self.malformed(format!(
                "expected a JSON array at top level, found '{}'",
                char::from(b)
            ))),
            None => Err(self.malformed("empty document, expected a JSON array")),
        }
    }

    /// After `]`: only whitespace may follow.
    fn close_array(&mut self) -> Result<(), ReconError> {
        self.reader.consume(1);
        self.state = State::Done;
        match self.peek_token().map_err(|e| self.io_error(e))? {
            None => Ok(()),
            Some(b) => Err(self.malformed(format!(
                "unexpected '{}' after the closing ']'",
                char::from(b)
            ))),
        }
    }

    fn next_record(&mut self) -> Result<Option<DeviceRecord>, ReconError> {
        if self.state == State::Start {
            self.open_array()?;
        }
        let first = match self.state {
            State::Open { first } => first,
            _ => return Ok(None),
        };

        let mut token = self.peek_token().map_err(|e| self.io_error(e))?;
        if token == Some(b']') {
            self.close_array()?;
            return Ok(None);
        }
        if !first {
            if token != Some(b',') {
                return Err(self.unexpected(token, "',' or ']'"));
            }
            self.reader.consume(1);
            token = self.peek_token().map_err(|e| self.io_error(e))?;
        }
        if token != Some(b'{') {
            return Err(self.unexpected(token, "an object"));
        }

        let decoded = {
            let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
            DeviceRecord::deserialize(&mut de)
        };
        let record = match decoded {
            Ok(record) => record,
            Err(e) if e.is_io() => {
                self.state = State::Done;
                return Err(ReconError::unreadable(&self.path, e.to_string()));
            }
            Err(e) => {
                let index = self.index;
                return Err(self.malformed(format!("element {index}: {e}")));
            }
        };

        self.state = State::Open { first: false };
        self.index += 1;
        Ok(Some(record))
    }

    fn unexpected(&mut self, token: Option<u8>, expected: &str) -> ReconError {
        let index = self.index;
        match token {
            None => self.malformed(format!(
                "unexpected end of input at element {index}, expected {expected}"
            )),
            Some(b) => self.malformed(format!(
                "element {index}: expected {expected}, found '{}'",
                char::from(b)
            )),
        }
    }
}

impl<R: BufRead> Iterator for DeviceRecordStream<R> {
    type Item = Result<DeviceRecord, ReconError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Done {
            return None;
        }
        self.next_record().transpose()
    }
}
