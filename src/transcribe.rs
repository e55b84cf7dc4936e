/*
 * @file transcribe.rs
 * @brief Local Whisper transcription of captured phrases
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

//! Speech capture: microphone audio in, recognized text out.
//!
//! Every failure mode (timeout, unintelligible audio, missing device,
//! transcription error) collapses to `None` at this boundary so the main
//! loop can always fall back to the keyboard.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
};

use crate::audio::{record_phrase, CaptureLimits};

/// Default GGML model location (downloaded on first use).
pub const DEFAULT_WHISPER_MODEL_PATH: &str = "models/ggml-base.en.bin";

/// Source of the default model.
const MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.en.bin";

/// Produces one utterance of text per call.
#[async_trait]
pub trait SpeechCapture: Send {
    /// Captures and recognizes a single utterance.
    ///
    /// # Returns
    /// * `Some(text)` - Non-empty, trimmed text.
    /// * `None` - Nothing usable was captured.
    async fn capture(&mut self, limits: CaptureLimits) -> Option<String>;
}

/// Microphone capture transcribed locally with Whisper.
///
/// # Details
/// The Whisper context is loaded lazily on the first capture and then kept
/// for the lifetime of the capture. Recording and inference both run on
/// the blocking thread pool.
pub struct WhisperCapture {
    model_path: PathBuf,
    ctx: Option<Arc<WhisperContext>>,
}

impl WhisperCapture {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ctx: None,
        }
    }

    /// Ensures the Whisper context is initialized, creating it if necessary.
    ///
    /// # Returns
    /// * `Some(ctx)` - Context ready for inference.
    /// * `None` - Initialization failed and the error was logged.
    async fn ensure_context(&mut self) -> Option<Arc<WhisperContext>> {
        if self.ctx.is_none() {
            let path = self.model_path.clone();
            match tokio::task::spawn_blocking(move || init_whisper(&path)).await {
                Ok(Ok(ctx)) => self.ctx = Some(Arc::new(ctx)),
                Ok(Err(err)) => {
                    warn!("whisper init failed: {:#}", err);
                    return None;
                }
                Err(err) => {
                    warn!(error = %err, "whisper init task failed");
                    return None;
                }
            }
        }
        self.ctx.clone()
    }
}

#[async_trait]
impl SpeechCapture for WhisperCapture {
    async fn capture(&mut self, limits: CaptureLimits) -> Option<String> {
        let ctx = self.ensure_context().await?;
        let recorded = match tokio::task::spawn_blocking(move || record_phrase(limits)).await {
            Ok(Ok(Some(audio))) => audio,
            Ok(Ok(None)) => return None,
            Ok(Err(err)) => {
                warn!(error = %err, "microphone error");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "recording task failed");
                return None;
            }
        };
        let audio = recorded.to_whisper_input();
        let text = tokio::task::spawn_blocking(move || run_whisper_inference(&ctx, &audio))
            .await
            .ok()
            .flatten()?;
        if text.is_empty() {
            debug!("transcription was empty");
            None
        } else {
            Some(text)
        }
    }
}

/// Runs Whisper over 16 kHz mono samples.
///
/// # Returns
/// * `Some(String)` - Trimmed text joined across all segments.
/// * `None` - State creation or inference failed and the error was logged.
fn run_whisper_inference(ctx: &WhisperContext, audio: &[f32]) -> Option<String> {
    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some("en"));
    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    let mut state = match ctx.create_state() {
        Ok(state) => state,
        Err(err) => {
            warn!(error = %err, "whisper state error");
            return None;
        }
    };
    if let Err(err) = state.full(params, audio) {
        warn!(error = %err, "whisper transcription error");
        return None;
    }
    Some(extract_transcription_text(&state))
}

fn extract_transcription_text(state: &WhisperState) -> String {
    let segments = state.full_n_segments().unwrap_or(0);
    let parts: Vec<String> = (0..segments)
        .filter_map(|i| state.full_get_segment_text(i).ok())
        .collect();
    clean_transcript(&parts)
}

/// Joins segment texts and drops Whisper's non-speech markers.
///
/// # Details
/// Whisper emits bracketed tags such as `[BLANK_AUDIO]` or `(music)` for
/// stretches without words; those never count as an utterance.
pub fn clean_transcript(segments: &[String]) -> String {
    segments
        .iter()
        .map(|segment| segment.trim())
        .filter(|segment| !is_non_speech_marker(segment))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn is_non_speech_marker(segment: &str) -> bool {
    segment.is_empty()
        || (segment.starts_with('[') && segment.ends_with(']'))
        || (segment.starts_with('(') && segment.ends_with(')'))
}

/// Loads the Whisper model, downloading it first if it is missing.
///
/// # Errors
/// Returns an error if the model directory cannot be created, the
/// download fails, or the context cannot be initialized.
fn init_whisper(model_path: &Path) -> Result<WhisperContext> {
    if let Some(dir) = model_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    if !model_path.exists() {
        info!(path = %model_path.display(), "downloading whisper model");
        download_whisper_model(model_path)?;
    }
    let mut params = WhisperContextParameters::default();
    params.use_gpu(false);
    let path = model_path
        .to_str()
        .with_context(|| format!("Model path {} is not UTF-8", model_path.display()))?;
    WhisperContext::new_with_params(path, params).with_context(|| "Failed to initialize Whisper")
}

/// Fetches the GGML model with curl, following redirects.
fn download_whisper_model(model_path: &Path) -> Result<()> {
    let output = std::process::Command::new("curl")
        .arg("-L")
        .arg("-o")
        .arg(model_path)
        .arg(MODEL_URL)
        .output()
        .with_context(|| "Failed to execute curl")?;
    if !output.status.success() {
        anyhow::bail!("Failed to download Whisper model");
    }
    info!("whisper model downloaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn transcript_joins_segments() {
        assert_eq!(
            clean_transcript(&segs(&[" open", " youtube "])),
            "open youtube"
        );
    }

    #[test]
    fn markers_are_not_speech() {
        assert_eq!(clean_transcript(&segs(&["[BLANK_AUDIO]"])), "");
        assert_eq!(
            clean_transcript(&segs(&["(music)", " tell me a joke"])),
            "tell me a joke"
        );
    }
}
