//! Input and output seams for the VM.
//!
//! INPUT_STRING / INPUT_NUMBER pull from an [`Input`]; PRINT pushes into an
//! [`Output`]. Both are plain traits with blanket impls for closures, so a
//! host can pass `|kind| ...` and `|value| ...` directly.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use xvm_common::Value;

/// What the requesting opcode expects to receive.
///
/// Sources that read untyped text (a terminal, a file) use this to decide
/// how to interpret a line. The VM checks the returned value regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// INPUT_STRING.
    Text,
    /// INPUT_NUMBER.
    Number,
}

/// Produces runtime values on demand.
pub trait Input {
    /// Read one value. An `Err` aborts the requesting instruction.
    fn read(&mut self, kind: InputKind) -> Result<Value, String>;
}

/// Consumes runtime values.
pub trait Output {
    fn write(&mut self, value: &Value);
}

impl<F> Input for F
where
    F: FnMut(InputKind) -> Result<Value, String>,
{
    fn read(&mut self, kind: InputKind) -> Result<Value, String> {
        self(kind)
    }
}

impl<F> Output for F
where
    F: FnMut(&Value),
{
    fn write(&mut self, value: &Value) {
        self(value)
    }
}

/// An input source with nothing to give.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl Input for NoInput {
    fn read(&mut self, _kind: InputKind) -> Result<Value, String> {
        Err("no input source".to_string())
    }
}

/// An output sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl Output for Discard {
    fn write(&mut self, _value: &Value) {}
}

/// Replays a fixed queue of values.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    queue: VecDeque<Value>,
}

impl ScriptedInput {
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            queue: values.into_iter().collect(),
        }
    }

    /// Values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl Input for ScriptedInput {
    fn read(&mut self, _kind: InputKind) -> Result<Value, String> {
        self.queue
            .pop_front()
            .ok_or_else(|| "input exhausted".to_string())
    }
}

/// Records everything written to it.
///
/// Clones share the same buffer, so one clone can be handed to the VM and
/// another kept by the host to read results back.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    values: Rc<RefCell<Vec<Value>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn values(&self) -> Vec<Value> {
        self.values.borrow().clone()
    }

    /// The most recent value written.
    pub fn last(&self) -> Option<Value> {
        self.values.borrow().last().cloned()
    }
}

impl Output for Transcript {
    fn write(&mut self, value: &Value) {
        self.values.borrow_mut().push(value.clone());
    }
}
