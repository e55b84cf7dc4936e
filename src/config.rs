/*
 * @file config.rs
 * @brief Runtime configuration loading
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

//! Runtime configuration: `config.json`, then environment, then CLI flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::audio::CaptureLimits;
use crate::notes::DEFAULT_NOTES_PATH;
use crate::transcribe::DEFAULT_WHISPER_MODEL_PATH;

/// Path to the JSON configuration file that holds runtime defaults.
pub const CONFIG_PATH: &str = "config.json";

/// Environment variable overriding [`AppConfig::notes_path`].
pub const ENV_NOTES_PATH: &str = "VOICE_DISPATCH_NOTES";

/// Environment variable overriding [`AppConfig::whisper_model_path`].
pub const ENV_WHISPER_MODEL: &str = "VOICE_DISPATCH_WHISPER_MODEL";

/// Environment variable overriding [`AppConfig::wikipedia_language`].
pub const ENV_WIKI_LANG: &str = "VOICE_DISPATCH_WIKI_LANG";

/// Strongly typed representation of `config.json`.
///
/// # Details
/// Every field is optional in the file; missing fields take the value
/// from [`AppConfig::default`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub notes_path: PathBuf,
    pub listen_timeout_secs: u64,
    pub phrase_time_limit_secs: u64,
    /// Prefixes stripped from an utterance, checked in order.
    pub wake_words: Vec<String>,
    /// Move "read notes"/"show notes" ahead of the generic "note" rule.
    pub read_notes_first: bool,
    /// Do not write a note when no text was captured.
    pub skip_empty_notes: bool,
    /// Speaking rate in words per minute; platform default when absent.
    pub speech_rate: Option<u32>,
    pub whisper_model_path: PathBuf,
    pub wikipedia_language: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notes_path: PathBuf::from(DEFAULT_NOTES_PATH),
            listen_timeout_secs: 5,
            phrase_time_limit_secs: 8,
            wake_words: ["assistant", "jarvis", "hey assistant", "hey jarvis"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
            read_notes_first: false,
            skip_empty_notes: false,
            speech_rate: None,
            whisper_model_path: PathBuf::from(DEFAULT_WHISPER_MODEL_PATH),
            wikipedia_language: "en".to_string(),
        }
    }
}

impl AppConfig {
    /// Capture bounds derived from the timeout fields.
    pub fn capture_limits(&self) -> CaptureLimits {
        CaptureLimits {
            listen_timeout: Duration::from_secs(self.listen_timeout_secs),
            phrase_time_limit: Duration::from_secs(self.phrase_time_limit_secs),
        }
    }

    /// Applies environment overrides through `lookup`.
    ///
    /// # Arguments
    /// * `lookup` - Variable reader, normally `|k| std::env::var(k).ok()`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_NOTES_PATH).filter(|v| !v.is_empty()) {
            self.notes_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_WHISPER_MODEL).filter(|v| !v.is_empty()) {
            self.whisper_model_path = PathBuf::from(path);
        }
        if let Some(lang) = lookup(ENV_WIKI_LANG).filter(|v| !v.is_empty()) {
            self.wikipedia_language = lang;
        }
    }
}

/// Loads configuration from `path`, falling back to defaults when missing.
///
/// # Details
/// A missing file is normal and only logged at debug level; an unreadable
/// or malformed file is logged as a warning. Either way the defaults are
/// returned so startup never fails on configuration.
pub fn load_app_config(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config parse error, using defaults");
                AppConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            AppConfig::default()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "config load error, using defaults");
            AppConfig::default()
        }
    }
}
