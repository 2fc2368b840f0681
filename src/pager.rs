//! Pager abstraction for interactive log display.
//!
//! The viewer hands fully formatted text to a [`Pager`]:
//! - `CommandPager` pipes it into an external program (`less -R`, `more`, ...)
//! - `MemoryPager` keeps it in memory for tests

use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

use crate::config::{FALLBACK_PAGER, PREFERRED_PAGER, PREFERRED_PAGER_ARGS, PagerSettings};

/// Errors from displaying text through a pager
#[derive(Error, Debug)]
pub enum PagerError {
    #[error("No pager program available")]
    Unavailable,

    #[error("Failed to run pager: {0}")]
    Spawn(#[from] io::Error),

    #[error("Pager exited with {0}")]
    Exit(ExitStatus),
}

/// Something that can display a block of text to the user
pub trait Pager {
    /// Display `text`, blocking until the user is done with it
    fn display(&mut self, text: &str) -> Result<(), PagerError>;
}

/// Pipes text into an external pager program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPager {
    program: String,
    args: Vec<String>,
}

impl CommandPager {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Use the configured command, else `less -R`, else `more`
    pub fn detect(settings: &PagerSettings) -> Result<Self, PagerError> {
        if let Some((program, args)) = settings.command.as_ref().and_then(|c| c.split_first()) {
            log::debug!("Using configured pager {}", program);
            return Ok(Self::new(program.clone(), args.to_vec()));
        }

        if which::which(PREFERRED_PAGER).is_ok() {
            log::debug!("Using pager {}", PREFERRED_PAGER);
            let args = PREFERRED_PAGER_ARGS.iter().map(|s| s.to_string()).collect();
            return Ok(Self::new(PREFERRED_PAGER, args));
        }

        if which::which(FALLBACK_PAGER).is_ok() {
            log::debug!("Using pager {}", FALLBACK_PAGER);
            return Ok(Self::new(FALLBACK_PAGER, Vec::new()));
        }

        Err(PagerError::Unavailable)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Pager for CommandPager {
    fn display(&mut self, text: &str) -> Result<(), PagerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // The user may quit before reading everything
            match stdin.write_all(text.as_bytes()) {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                    let _ = child.wait();
                    return Err(e.into());
                }
                _ => {}
            }
        }

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(PagerError::Exit(status))
        }
    }
}

/// Collects displayed text in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryPager {
    pages: Vec<String>,
    fail: bool,
}

impl MemoryPager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pager whose every display fails as if no program were installed
    pub fn failing() -> Self {
        Self {
            pages: Vec::new(),
            fail: true,
        }
    }

    /// Text of every successful display, in order
    pub fn pages(&self) -> &[String] {
        &self.pages
    }
}

impl Pager for MemoryPager {
    fn display(&mut self, text: &str) -> Result<(), PagerError> {
        if self.fail {
            return Err(PagerError::Unavailable);
        }
        self.pages.push(text.to_string());
        Ok(())
    }
}
