//! Line-based terminal I/O shared between the shell and the VM.
//!
//! The debugger shell and the program it drives read from the same input
//! and write to the same output, so both sides hold clones of one handle.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use num_bigint::BigInt;
use tracing::warn;
use xvm_common::Value;
use xvm_vm::{Input, InputKind, Output};

/// A line reader that can be cloned and shared.
pub struct SharedReader<R> {
    inner: Rc<RefCell<R>>,
}

impl<R> Clone for SharedReader<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: BufRead> SharedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: Rc::new(RefCell::new(reader)),
        }
    }

    /// Next line without its terminator, or `None` at end of input.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.inner.borrow_mut().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

/// A writer that can be cloned and shared.
pub struct SharedWriter<W> {
    inner: Rc<RefCell<W>>,
}

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<W: Write> SharedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Rc::new(RefCell::new(writer)),
        }
    }
}

impl SharedWriter<Vec<u8>> {
    /// Everything written so far, as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow()).into_owned()
    }
}

impl<W: Write> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.borrow_mut().flush()
    }
}

/// Feeds INPUT_STRING / INPUT_NUMBER one line at a time.
pub struct LineInput<R> {
    reader: SharedReader<R>,
}

impl<R: BufRead> LineInput<R> {
    pub fn new(reader: SharedReader<R>) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Input for LineInput<R> {
    fn read(&mut self, kind: InputKind) -> Result<Value, String> {
        let line = self
            .reader
            .read_line()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "end of input".to_string())?;
        Ok(parse_input(&line, kind))
    }
}

/// Interpret one line of user input.
///
/// Text is taken verbatim. A number is an integer if it parses as one,
/// otherwise a finite float. Anything else stays text, which INPUT_NUMBER
/// rejects as a type mismatch.
pub fn parse_input(line: &str, kind: InputKind) -> Value {
    if kind == InputKind::Number {
        let word = line.trim();
        if let Ok(n) = word.parse::<BigInt>() {
            return Value::Int(n);
        }
        if let Some(x) = word.parse::<f64>().ok().filter(|x| x.is_finite()) {
            return Value::Float(x);
        }
    }
    Value::Str(line.to_string())
}

/// Writes each PRINTed value on its own line.
pub struct Printer<W> {
    out: SharedWriter<W>,
}

impl<W: Write> Printer<W> {
    pub fn new(out: SharedWriter<W>) -> Self {
        Self { out }
    }
}

impl<W: Write> Output for Printer<W> {
    fn write(&mut self, value: &Value) {
        if let Err(e) = writeln!(self.out, "{value}") {
            warn!(error = %e, "failed to write program output");
        }
    }
}
