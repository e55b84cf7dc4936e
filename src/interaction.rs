/*
 * @file interaction.rs
 * @brief Console speech and keyboard interaction
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

//! The user-facing side of a turn: speaking, printing, listening, typing.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;

use crate::audio::CaptureLimits;
use crate::speech::Speaker;
use crate::transcribe::SpeechCapture;

/// Everything the main loop and the executors need from the user.
#[async_trait]
pub trait Interaction: Send {
    /// Speaks `text` and mirrors it to the console.
    fn announce(&mut self, text: &str);

    /// Prints `text` to the console only.
    fn show(&mut self, text: &str);

    /// Captures one spoken utterance. `None` covers every capture failure.
    async fn listen(&mut self) -> Option<String>;

    /// Reads one typed line after printing `prompt`.
    ///
    /// # Returns
    /// * `Ok(Some(line))` - The trimmed line, possibly empty.
    /// * `Ok(None)` - Input is closed (end of file).
    ///
    /// # Errors
    /// Returns an error if the input stream cannot be read.
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Releases output resources. Idempotent.
    fn shutdown(&mut self) {}
}

/// Terminal implementation: a [`Speaker`] for output and a pluggable
/// [`SpeechCapture`] for input, with stdin for typed fallbacks.
pub struct ConsoleInteraction {
    speaker: Speaker,
    capture: Box<dyn SpeechCapture>,
    limits: CaptureLimits,
}

impl ConsoleInteraction {
    pub fn new(speaker: Speaker, capture: Box<dyn SpeechCapture>, limits: CaptureLimits) -> Self {
        Self {
            speaker,
            capture,
            limits,
        }
    }
}

#[async_trait]
impl Interaction for ConsoleInteraction {
    fn announce(&mut self, text: &str) {
        println!("Assistant: {}", text);
        if let Err(err) = self.speaker.speak(text) {
            warn!("TTS error: {:#}", err);
        }
    }

    fn show(&mut self, text: &str) {
        println!("{}", text);
    }

    async fn listen(&mut self) -> Option<String> {
        self.capture.capture(self.limits).await
    }

    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        read_stdin_line(prompt).await
    }

    fn shutdown(&mut self) {
        self.speaker.shutdown();
    }
}

/// [`SpeechCapture`] that reads typed lines instead of using a microphone.
///
/// Blank lines and end of input both yield `None`.
#[derive(Debug, Default)]
pub struct KeyboardCapture;

impl KeyboardCapture {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SpeechCapture for KeyboardCapture {
    async fn capture(&mut self, _limits: CaptureLimits) -> Option<String> {
        match read_stdin_line("> ").await {
            Ok(Some(line)) if !line.is_empty() => Some(line),
            Ok(_) => None,
            Err(err) => {
                warn!("keyboard capture failed: {:#}", err);
                None
            }
        }
    }
}

/// Prints `prompt` and reads one line from stdin on the blocking pool.
///
/// # Details
/// Stdout is only locked while the prompt is written, so other output
/// (the interrupt farewell in particular) is never stuck behind a pending
/// read.
async fn read_stdin_line(prompt: &str) -> Result<Option<String>> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || {
        write_prompt(&mut io::stdout().lock(), &prompt)?;
        read_trimmed_line(&mut io::stdin().lock())
    })
    .await
    .with_context(|| "stdin reader task failed")?
}

fn write_prompt(output: &mut impl Write, prompt: &str) -> Result<()> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    Ok(())
}

/// Reads one line from `input`.
///
/// # Returns
/// * `Ok(Some(line))` - Trimmed line, possibly empty.
/// * `Ok(None)` - `input` reached end of file.
fn read_trimmed_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .with_context(|| "Failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn prompt_is_written_and_flushed() {
        let mut output = Vec::<u8>::new();
        write_prompt(&mut output, "> ").unwrap();
        assert_eq!(output, b"> ");
    }

    #[test]
    fn line_is_trimmed() {
        let mut input = io::Cursor::new("  open youtube \n");
        let line = read_trimmed_line(&mut input).unwrap();
        assert_eq!(line.as_deref(), Some("open youtube"));
    }

    #[test]
    fn blank_line_is_empty_not_closed() {
        let mut input = io::Cursor::new("\n");
        let line = read_trimmed_line(&mut input).unwrap();
        assert_eq!(line.as_deref(), Some(""));
    }

    #[test]
    fn end_of_input_is_none() {
        let mut input = io::Cursor::new("");
        assert_eq!(read_trimmed_line(&mut input).unwrap(), None);
    }

    /// Input that blocks until its sender is dropped, like a quiet terminal.
    struct StalledInput(mpsc::Receiver<()>);

    impl io::Read for StalledInput {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn stdout_is_free_while_a_read_is_pending() {
        let (release, stalled) = mpsc::channel::<()>();
        let reader = std::thread::spawn(move || {
            write_prompt(&mut io::stdout().lock(), "").unwrap();
            read_trimmed_line(&mut io::BufReader::new(StalledInput(stalled)))
        });
        std::thread::sleep(Duration::from_millis(50));

        let (done, finished) = mpsc::channel();
        std::thread::spawn(move || {
            let mut out = io::stdout().lock();
            let _ = out.flush();
            let _ = done.send(());
        });
        let locked = finished.recv_timeout(Duration::from_secs(2)).is_ok();

        drop(release);
        assert_eq!(reader.join().unwrap().unwrap(), None);
        assert!(locked, "stdout stayed locked during the read");
    }
}
