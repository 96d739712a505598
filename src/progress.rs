use std::sync::{Mutex, PoisonError};

/// Destination for human-readable progress. `out` carries notices, `err`
/// carries failures.
pub trait ProgressSink: Send + Sync {
    fn out(&self, line: &str);
    fn err(&self, line: &str);
}

pub struct StdioSink;

impl ProgressSink for StdioSink {
    fn out(&self, line: &str) {
        println!("{}", line);
    }

    fn err(&self, line: &str) {
        eprintln!("{}", line);
    }
}

pub struct NullSink;

impl ProgressSink for NullSink {
    fn out(&self, _line: &str) {}

    fn err(&self, _line: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressLine {
    Out(String),
    Err(String),
}

impl ProgressLine {
    pub fn text(&self) -> &str {
        match self {
            ProgressLine::Out(line) | ProgressLine::Err(line) => line,
        }
    }
}

/// Keeps every line in arrival order.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<ProgressLine>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<ProgressLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn out_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                ProgressLine::Out(text) => Some(text),
                ProgressLine::Err(_) => None,
            })
            .collect()
    }

    pub fn err_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                ProgressLine::Err(text) => Some(text),
                ProgressLine::Out(_) => None,
            })
            .collect()
    }

    fn push(&self, line: ProgressLine) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

impl ProgressSink for RecordingSink {
    fn out(&self, line: &str) {
        self.push(ProgressLine::Out(line.to_string()));
    }

    fn err(&self, line: &str) {
        self.push(ProgressLine::Err(line.to_string()));
    }
}
