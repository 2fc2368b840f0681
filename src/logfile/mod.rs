//! Reading and querying individual log files.

pub mod ansi;
pub mod level;
pub mod line;
pub mod reader;
pub mod search;

pub use ansi::strip_decorations;
pub use level::{LevelReport, filter_by_level};
pub use line::{LogLine, extract_level, extract_step_header, parse_line};
pub use reader::{RangeSpec, Rendered, StepHeader, outline, render};
pub use search::{
    SearchGroup, SearchHit, SearchReport, SearchScope, SkippedLog, compile_pattern, highlight,
    search_file, search_logs, search_run,
};

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::{ViewerError, ViewerResult};

/// Line iterator over a log file.
///
/// Lines are decoded lossily; the `\n` terminator and a preceding `\r` are
/// removed.
pub struct LogLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LogLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LogLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Open a log file for line-by-line reading
pub fn open_lines(path: &Path) -> io::Result<LogLines<BufReader<File>>> {
    Ok(LogLines::new(BufReader::new(File::open(path)?)))
}

/// Open a log file that must exist, mapping a missing file to
/// [`ViewerError::LogNotFound`].
pub(crate) fn open_existing(path: &Path) -> ViewerResult<LogLines<BufReader<File>>> {
    if !path.is_file() {
        return Err(ViewerError::LogNotFound(path.to_path_buf()));
    }
    open_lines(path).map_err(|e| ViewerError::io(path, e))
}

/// Read a whole log file as lossily decoded text
pub fn read_text(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
