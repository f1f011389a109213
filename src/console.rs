//! Console output sink for seeding runs
//!
//! The seeder never prints directly; it talks to a [`Console`]. The
//! terminal implementation draws an indicatif progress bar per file, the
//! captured one records everything for embedders and tests.

use crate::report::render_table;
use indicatif::{ProgressBar, ProgressStyle};

pub trait Console {
    fn line(&mut self, message: &str);
    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
    fn error(&mut self, message: &str);

    /// Start a progress indicator with `steps` total steps
    fn progress_start(&mut self, steps: u64);
    fn progress_set(&mut self, step: u64);
    fn progress_finish(&mut self);

    fn table(&mut self, header: &[String], rows: &[Vec<String>]);
}

/// Writes to stdout/stderr
#[derive(Default)]
pub struct TerminalConsole {
    progress: Option<ProgressBar>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&self, message: &str, to_stderr: bool) {
        let print = || {
            if to_stderr {
                eprintln!("{}", message);
            } else {
                println!("{}", message);
            }
        };
        match &self.progress {
            Some(bar) => bar.suspend(print),
            None => print(),
        }
    }
}

impl Console for TerminalConsole {
    fn line(&mut self, message: &str) {
        self.emit(message, false);
    }

    fn info(&mut self, message: &str) {
        self.emit(message, false);
    }

    fn warn(&mut self, message: &str) {
        self.emit(&format!("warning: {}", message), true);
    }

    fn error(&mut self, message: &str) {
        self.emit(&format!("error: {}", message), true);
    }

    fn progress_start(&mut self, steps: u64) {
        let bar = ProgressBar::new(steps);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        bar.set_style(style);
        self.progress = Some(bar);
    }

    fn progress_set(&mut self, step: u64) {
        if let Some(bar) = &self.progress {
            bar.set_position(step);
        }
    }

    fn progress_finish(&mut self) {
        if let Some(bar) = self.progress.take() {
            bar.finish_and_clear();
        }
    }

    fn table(&mut self, header: &[String], rows: &[Vec<String>]) {
        self.emit(&render_table(header, rows), false);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Line,
    Info,
    Warn,
    Error,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub level: Level,
    pub text: String,
}

/// Records console output in memory
#[derive(Debug, Default)]
pub struct CapturedConsole {
    pub lines: Vec<ConsoleLine>,
    /// Every progress position reported, across all files
    pub progress: Vec<u64>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, level: Level, needle: &str) -> bool {
        self.lines
            .iter()
            .any(|l| l.level == level && l.text.contains(needle))
    }

    pub fn at(&self, level: Level) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(move |l| l.level == level)
            .map(|l| l.text.as_str())
    }

    fn push(&mut self, level: Level, text: impl Into<String>) {
        self.lines.push(ConsoleLine {
            level,
            text: text.into(),
        });
    }
}

impl Console for CapturedConsole {
    fn line(&mut self, message: &str) {
        self.push(Level::Line, message);
    }

    fn info(&mut self, message: &str) {
        self.push(Level::Info, message);
    }

    fn warn(&mut self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&mut self, message: &str) {
        self.push(Level::Error, message);
    }

    fn progress_start(&mut self, _steps: u64) {}

    fn progress_set(&mut self, step: u64) {
        self.progress.push(step);
    }

    fn progress_finish(&mut self) {}

    fn table(&mut self, header: &[String], rows: &[Vec<String>]) {
        self.push(Level::Table, render_table(header, rows));
    }
}
