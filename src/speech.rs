//! Text-to-speech output owned by the main loop.
//!
//! A [`Speaker`] is created once at startup and dropped (or explicitly
//! shut down) on every exit path. Shutdown is idempotent.

use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use crate::services::Platform;

/// Platform speech command used by a [`Speaker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeechBackend {
    /// macOS `say`.
    Say,
    /// `espeak` on Linux.
    Espeak,
    /// Windows SAPI through PowerShell.
    PowerShell,
}

impl SpeechBackend {
    /// Picks the backend for a platform.
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::MacOs => SpeechBackend::Say,
            Platform::Linux => SpeechBackend::Espeak,
            Platform::Windows => SpeechBackend::PowerShell,
        }
    }

    /// Builds the command that speaks `text`, optionally at `rate` words per minute.
    pub fn command(self, text: &str, rate: Option<u32>) -> Command {
        match self {
            SpeechBackend::Say => {
                let mut cmd = Command::new("say");
                if let Some(rate) = rate {
                    cmd.arg("-r").arg(rate.to_string());
                }
                cmd.arg(text);
                cmd
            }
            SpeechBackend::Espeak => {
                let mut cmd = Command::new("espeak");
                if let Some(rate) = rate {
                    cmd.arg("-s").arg(rate.to_string());
                }
                cmd.arg(text);
                cmd
            }
            SpeechBackend::PowerShell => {
                let mut cmd = Command::new("powershell");
                cmd.args(["-NoProfile", "-Command"])
                    .arg(powershell_script(text, rate));
                cmd
            }
        }
    }
}

/// SAPI snippet for PowerShell. Single quotes in `text` are doubled.
fn powershell_script(text: &str, rate: Option<u32>) -> String {
    let escaped = text.replace('\'', "''");
    // SAPI rate is -10..=10 around a ~180 wpm baseline
    let rate_line = rate
        .map(|wpm| {
            let sapi = ((wpm as i64 - 180) / 10).clamp(-10, 10);
            format!("$s.Rate = {}; ", sapi)
        })
        .unwrap_or_default();
    format!(
        "Add-Type -AssemblyName System.Speech; \
         $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
         {}$s.Speak('{}')",
        rate_line, escaped
    )
}

/// Owned speech-output resource.
///
/// # Details
/// A muted speaker accepts every call and produces no audio, which is how
/// console-only and test runs are expressed. After [`Speaker::shutdown`]
/// every call is a no-op.
#[derive(Debug)]
pub struct Speaker {
    backend: Option<SpeechBackend>,
    rate: Option<u32>,
    active: bool,
}

impl Speaker {
    /// Creates a speaker for the current platform.
    ///
    /// # Arguments
    /// * `rate` - Optional speaking rate in words per minute.
    pub fn new(rate: Option<u32>) -> Self {
        Self {
            backend: Some(SpeechBackend::for_platform(Platform::current())),
            rate,
            active: true,
        }
    }

    /// Creates a speaker that never produces audio.
    pub fn muted() -> Self {
        Self {
            backend: None,
            rate: None,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Speaks `text` and blocks until the platform command exits.
    ///
    /// # Errors
    /// Returns an error for blank text, or if the speech command cannot be
    /// spawned or exits unsuccessfully.
    pub fn speak(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            anyhow::bail!("Cannot speak empty text");
        }
        let Some(backend) = self.backend.filter(|_| self.active) else {
            return Ok(());
        };
        let status = backend
            .command(text, self.rate)
            .output()
            .with_context(|| format!("Failed to run {:?} speech backend", backend))?
            .status;
        if !status.success() {
            anyhow::bail!("Speech backend {:?} exited with {}", backend, status);
        }
        Ok(())
    }

    /// Releases the speaker. Safe to call any number of times.
    pub fn shutdown(&mut self) {
        if self.active {
            debug!("speaker shut down");
            self.active = false;
        }
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
