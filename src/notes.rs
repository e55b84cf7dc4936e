/*
 * @file notes.rs
 * @brief Append-only timestamped note log
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Append-only note log backed by a plain text file.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::debug;

use crate::error::NoteStoreError;

/// Default location of the note log, relative to the working directory.
pub const DEFAULT_NOTES_PATH: &str = "notes.txt";

/// Timestamp layout written in front of every note (ISO-8601, microseconds).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// What a full read of the store found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotesSnapshot {
    /// The file has never been created.
    Missing,
    /// The file exists but holds only whitespace.
    Empty,
    /// Trimmed file content.
    Present(String),
}

/// Handle to the note log.
///
/// # Details
/// Lines are only ever appended; nothing in this crate rewrites or
/// truncates the file, so line order is chronological order. The store
/// assumes a single writer.
#[derive(Clone, Debug)]
pub struct NoteStore {
    path: PathBuf,
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new(DEFAULT_NOTES_PATH)
    }
}

impl NoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `text` stamped with the current local time.
    ///
    /// # Returns
    /// * `Ok(String)` - The exact line written, without the newline.
    ///
    /// # Errors
    /// Returns [`NoteStoreError::Append`] if the file cannot be opened or written.
    pub fn append(&self, text: &str) -> Result<String, NoteStoreError> {
        self.append_at(Local::now().naive_local(), text)
    }

    /// Appends `text` stamped with an explicit timestamp.
    ///
    /// # Details
    /// Creates the file on first use. The line is written with a single
    /// `write_all` so a note is never split across partial writes.
    pub fn append_at(&self, at: NaiveDateTime, text: &str) -> Result<String, NoteStoreError> {
        let line = format_note_line(at, text);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.append_error(source))?;
        file.write_all(format!("{}\n", line).as_bytes())
            .map_err(|source| self.append_error(source))?;
        debug!(path = %self.path.display(), "note appended");
        Ok(line)
    }

    /// Reads the whole log.
    ///
    /// # Errors
    /// Returns [`NoteStoreError::Read`] for any failure other than the file
    /// not existing.
    pub fn read(&self) -> Result<NotesSnapshot, NoteStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(NotesSnapshot::Missing),
            Err(source) => {
                return Err(NoteStoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let trimmed = content.trim();
        if trimmed.is_empty() {
            Ok(NotesSnapshot::Empty)
        } else {
            Ok(NotesSnapshot::Present(trimmed.to_string()))
        }
    }

    fn append_error(&self, source: std::io::Error) -> NoteStoreError {
        NoteStoreError::Append {
            path: self.path.clone(),
            source,
        }
    }
}

/// Renders one log line: `{timestamp} - {text}`.
pub fn format_note_line(at: NaiveDateTime, text: &str) -> String {
    format!("{} - {}", at.format(TIMESTAMP_FORMAT), text)
}

/// Returns at most the first `max_chars` characters of `text`.
///
/// Counts characters, not bytes, so multi-byte text is never cut mid-glyph.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
