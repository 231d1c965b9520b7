//! I/O boundary traits for testability
//!
//! These traits abstract the file system and the terminal, allowing the
//! knowledge base and the interactive session to be tested with in-memory
//! implementations.

use std::io::{self, BufRead, Write};
use std::path::Path;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read whole file contents.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate a file and write `content` to it.
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Line-oriented terminal abstraction used by the interactive session.
pub trait Console {
    /// Show `prompt` and read one line without its terminator.
    /// Returns `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Print one line of output.
    fn print(&mut self, line: &str);
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

/// Console on stdin/stdout.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        crate::cli::output::prompt(prompt);
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn print(&mut self, line: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", line);
    }
}
