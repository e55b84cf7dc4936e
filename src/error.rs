/*
 * @file error.rs
 * @brief Error types for executors and their collaborators
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

//! Typed failures for every external collaborator the dispatcher touches.
//!
//! Executors never let these escape to the main loop; they are converted
//! into a fixed spoken message by [`ActionError::user_message`].

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a knowledge-lookup service.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no article matches {0:?}")]
    NotFound(String),

    #[error("{0:?} refers to more than one article")]
    Ambiguous(String),

    #[error("knowledge service unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected knowledge service response: {0}")]
    Malformed(String),
}

/// Failure reported while spawning an application.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported while handing a URL to the system browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to open {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reading from or appending to the note store.
#[derive(Debug, Error)]
pub enum NoteStoreError {
    #[error("failed to append to {}: {source}", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tagged failure of a single executor.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("lookup for {topic:?} failed: {source}")]
    Lookup {
        topic: String,
        #[source]
        source: LookupError,
    },

    #[error("launch of {app:?} failed: {source}")]
    Launch {
        app: String,
        #[source]
        source: LaunchError,
    },

    #[error(transparent)]
    NoteStore(#[from] NoteStoreError),
}

impl ActionError {
    /// Returns the sentence spoken to the user in place of the error.
    ///
    /// Error detail is logged, never spoken.
    pub fn user_message(&self) -> String {
        match self {
            ActionError::Lookup { .. } => "Sorry, I couldn't find that on Wikipedia.".to_string(),
            ActionError::Launch { app, .. } => format!(
                "Couldn't launch {} — try giving the exact executable name.",
                app
            ),
            ActionError::NoteStore(NoteStoreError::Append { .. }) => {
                "Sorry, I couldn't save that note.".to_string()
            }
            ActionError::NoteStore(NoteStoreError::Read { .. }) => {
                "Sorry, I couldn't read your notes.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn lookup_failures_share_one_apology() {
        let not_found = ActionError::Lookup {
            topic: "zzz".into(),
            source: LookupError::NotFound("zzz".into()),
        };
        let ambiguous = ActionError::Lookup {
            topic: "mercury".into(),
            source: LookupError::Ambiguous("mercury".into()),
        };
        assert_eq!(not_found.user_message(), ambiguous.user_message());
        assert_eq!(
            not_found.user_message(),
            "Sorry, I couldn't find that on Wikipedia."
        );
    }

    #[test]
    fn launch_failure_names_the_app() {
        let err = ActionError::Launch {
            app: "spotify".into(),
            source: LaunchError::Spawn {
                program: "spotify".into(),
                source: io::Error::new(io::ErrorKind::NotFound, "missing"),
            },
        };
        assert_eq!(
            err.user_message(),
            "Couldn't launch spotify — try giving the exact executable name."
        );
    }

    #[test]
    fn note_store_errors_convert() {
        let err: ActionError = NoteStoreError::Read {
            path: PathBuf::from("notes.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(matches!(err, ActionError::NoteStore(NoteStoreError::Read { .. })));
        assert_eq!(err.user_message(), "Sorry, I couldn't read your notes.");
    }
}
