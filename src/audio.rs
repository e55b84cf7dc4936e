/*
 * @file audio.rs
 * @brief Microphone capture and phrase detection
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

//! Microphone capture bounded by a listen timeout and a phrase time limit.
//!
//! This module records from the default CPAL input device until a phrase
//! has been spoken, then converts the result into the 16 kHz mono `f32`
//! buffer Whisper expects.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, StreamError};
use tracing::{debug, warn};

/// Sample rate Whisper consumes, in Hertz.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// How often the recorder inspects newly captured audio.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Silence after speech that ends a phrase early.
const TRAILING_SILENCE: Duration = Duration::from_millis(800);

/// Minimum RMS amplitude (on the `f32` scale) considered speech.
///
/// Equivalent to ~150 on the 16-bit PCM scale; higher values miss normal
/// speaking levels on some microphones.
const SILENCE_RMS_THRESHOLD: f32 = 150.0 / 32_768.0;

/// Bounds for a single capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureLimits {
    /// How long to wait for speech to begin.
    pub listen_timeout: Duration,
    /// Longest phrase recorded once speech has begun.
    pub phrase_time_limit: Duration,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self {
            listen_timeout: Duration::from_secs(5),
            phrase_time_limit: Duration::from_secs(8),
        }
    }
}

/// Raw interleaved audio as delivered by the input device.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl RecordedAudio {
    /// Converts to 16 kHz mono, the layout Whisper requires.
    pub fn to_whisper_input(&self) -> Vec<f32> {
        let mono = downmix(&self.samples, self.channels);
        if self.sample_rate == WHISPER_SAMPLE_RATE {
            mono
        } else {
            resample(&mono, self.sample_rate, WHISPER_SAMPLE_RATE)
        }
    }
}

/// Where a capture stands after the latest poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhraseState {
    /// No speech yet; still inside the listen timeout.
    Waiting,
    /// Speech has started and the phrase is still open.
    Recording,
    /// No speech began before the listen timeout.
    TimedOut,
    /// The phrase ended by trailing silence or the phrase time limit.
    Complete,
}

/// Tracks speech onset and end across polls.
#[derive(Clone, Debug)]
pub struct PhraseTracker {
    limits: CaptureLimits,
    speech_started: Option<Duration>,
    last_speech: Duration,
}

impl PhraseTracker {
    pub fn new(limits: CaptureLimits) -> Self {
        Self {
            limits,
            speech_started: None,
            last_speech: Duration::ZERO,
        }
    }

    /// Feeds one poll result.
    ///
    /// # Arguments
    /// * `elapsed` - Time since recording began.
    /// * `has_speech` - Whether the audio since the previous poll held speech.
    pub fn observe(&mut self, elapsed: Duration, has_speech: bool) -> PhraseState {
        if has_speech {
            self.speech_started.get_or_insert(elapsed);
            self.last_speech = elapsed;
        }
        match self.speech_started {
            None if elapsed >= self.limits.listen_timeout => PhraseState::TimedOut,
            None => PhraseState::Waiting,
            Some(start) if elapsed.saturating_sub(start) >= self.limits.phrase_time_limit => {
                PhraseState::Complete
            }
            Some(_) if elapsed.saturating_sub(self.last_speech) >= TRAILING_SILENCE => {
                PhraseState::Complete
            }
            Some(_) => PhraseState::Recording,
        }
    }
}

/// Records one phrase from the default input device.
///
/// # Details
/// Blocks the calling thread. Every [`POLL_INTERVAL`] the audio captured
/// since the previous poll is checked for speech energy and fed to a
/// [`PhraseTracker`].
///
/// # Returns
/// * `Ok(Some(audio))` - A phrase was captured.
/// * `Ok(None)` - Nobody spoke before the listen timeout.
///
/// # Errors
/// Returns an error if no input device is available or the stream cannot
/// be built or started.
pub fn record_phrase(limits: CaptureLimits) -> Result<Option<RecordedAudio>> {
    let device = default_input_device()?;
    let supported = device.default_input_config()?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let samples = shared_samples();
    let stream = build_input_stream(&device, &config, sample_format, samples.clone())?;
    stream.play()?;

    let started = Instant::now();
    let mut tracker = PhraseTracker::new(limits);
    let mut consumed = 0;
    loop {
        std::thread::sleep(POLL_INTERVAL);
        let has_speech = {
            let guard = samples
                .lock()
                .map_err(|_| anyhow!("sample buffer lock poisoned"))?;
            let fresh = contains_speech(&guard[consumed..]);
            consumed = guard.len();
            fresh
        };
        match tracker.observe(started.elapsed(), has_speech) {
            PhraseState::Waiting | PhraseState::Recording => continue,
            PhraseState::TimedOut => {
                debug!("listen timeout elapsed without speech");
                return Ok(None);
            }
            PhraseState::Complete => break,
        }
    }
    drop(stream);

    let captured = samples
        .lock()
        .map_err(|_| anyhow!("sample buffer lock poisoned"))?
        .clone();
    Ok(Some(RecordedAudio {
        samples: captured,
        sample_rate: config.sample_rate.0,
        channels: config.channels,
    }))
}

/// Whether a slice of `f32` samples carries speech-level energy.
pub fn contains_speech(samples: &[f32]) -> bool {
    if samples.is_empty() {
        return false;
    }
    let energy = samples.iter().map(|sample| sample * sample).sum::<f32>() / samples.len() as f32;
    energy.sqrt() >= SILENCE_RMS_THRESHOLD
}

/// Averages interleaved channels into mono.
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Resamples mono audio with linear interpolation.
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }
    let ratio = from_rate as f32 / to_rate as f32;
    let output_len = (input.len() as f32 / ratio) as usize;
    (0..output_len)
        .map(|i| sample_at_position(input, i as f32 * ratio))
        .collect()
}

fn sample_at_position(input: &[f32], pos: f32) -> f32 {
    let idx = pos as usize;
    if idx + 1 < input.len() {
        let frac = pos - idx as f32;
        input[idx] * (1.0 - frac) + input[idx + 1] * frac
    } else if idx < input.len() {
        input[idx]
    } else {
        0.0
    }
}

fn default_input_device() -> Result<Device> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device"))
}

fn shared_samples() -> Arc<Mutex<Vec<f32>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Builds the CPAL input stream for the device's native sample format.
///
/// # Errors
/// Returns an error for sample formats other than `f32` and `i16`, or when
/// the device refuses the stream.
fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    format: SampleFormat,
    samples: Arc<Mutex<Vec<f32>>>,
) -> Result<Stream> {
    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &_| push_samples(&samples, data.iter().copied()),
            log_stream_error,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &_| {
                push_samples(&samples, data.iter().map(|&s| s as f32 / 32_768.0))
            },
            log_stream_error,
            None,
        ),
        other => return Err(anyhow!("Unsupported input sample format {:?}", other)),
    };
    stream.map_err(|err| anyhow!(err))
}

fn push_samples(buffer: &Arc<Mutex<Vec<f32>>>, data: impl Iterator<Item = f32>) {
    if let Ok(mut guard) = buffer.lock() {
        guard.extend(data);
    }
}

fn log_stream_error(error: StreamError) {
    warn!(%error, "audio stream error");
}
