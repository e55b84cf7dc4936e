/*
 * @file assistant.rs
 * @brief Main loop of the voice command dispatcher
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

//! Voice assistant orchestration module.

use std::future::Future;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::actions::{Dispatch, DispatchOptions, Dispatcher, Services};
use crate::commands::RuleTable;
use crate::config::AppConfig;
use crate::interaction::{ConsoleInteraction, Interaction, KeyboardCapture};
use crate::notes::NoteStore;
use crate::speech::Speaker;
use crate::transcribe::{SpeechCapture, WhisperCapture};

/// Spoken once when the loop starts.
pub const READY_MESSAGE: &str = "Hello, I'm ready. Say a command or say 'exit' to stop.";

/// Spoken when the user says a quit word or closes input.
pub const GOODBYE_MESSAGE: &str = "Goodbye. See you later.";

/// Spoken when the process is interrupted.
pub const INTERRUPTED_MESSAGE: &str = "Interrupted. Bye.";

/// Spoken after a fatal error has been printed.
pub const FATAL_MESSAGE: &str = "An error occurred. Check the console for details.";

const DIDNT_CATCH_MESSAGE: &str = "I didn't catch that. You can type the command or say it again.";

const FALLBACK_QUESTION: &str =
    "I couldn't map that to a command. Shall I search the web for that?";

const CANCELLED_MESSAGE: &str = "Okay, command cancelled.";

/// Whole utterances that end the session.
const QUIT_WORDS: [&str; 4] = ["exit", "quit", "stop", "goodbye"];

/// Where the main loop reads utterances from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Microphone with local Whisper transcription.
    Voice,
    /// Typed lines on stdin.
    Text,
}

/// Whether the loop should keep going after a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turn {
    Continue,
    Quit,
}

/// Builds every component from `config` and runs the assistant until the
/// user quits, input closes, or the process is interrupted.
///
/// # Errors
/// Returns an error if startup fails, or after a fatal turn error has been
/// printed and announced.
pub async fn run_voice_assistant(config: &AppConfig, mode: InputMode, mute: bool) -> Result<()> {
    let speaker = if mute {
        Speaker::muted()
    } else {
        Speaker::new(config.speech_rate)
    };
    let capture: Box<dyn SpeechCapture> = match mode {
        InputMode::Voice => Box::new(WhisperCapture::new(&config.whisper_model_path)),
        InputMode::Text => Box::new(KeyboardCapture::new()),
    };
    let io = ConsoleInteraction::new(speaker, capture, config.capture_limits());
    let dispatcher = Dispatcher::new(
        RuleTable::from_config(config.read_notes_first),
        Services::system(&config.wikipedia_language)?,
        NoteStore::new(&config.notes_path),
        DispatchOptions {
            skip_empty_notes: config.skip_empty_notes,
        },
    );
    let mut assistant = Assistant::new(io, dispatcher, config.wake_words.clone());
    let result = assistant.run().await;
    assistant.shutdown();
    result
}

/// The main loop: capture, normalize, dispatch, fall back.
pub struct Assistant<I: Interaction> {
    io: I,
    dispatcher: Dispatcher,
    wake_words: Vec<String>,
}

impl<I: Interaction> Assistant<I> {
    pub fn new(io: I, dispatcher: Dispatcher, wake_words: Vec<String>) -> Self {
        Self {
            io,
            dispatcher,
            wake_words,
        }
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Greets, loops until exit, and handles interrupt and fatal errors.
    ///
    /// # Details
    /// An interrupt (Ctrl+C) announces a farewell and returns `Ok`. A fatal
    /// turn error is printed, announced generically and returned; the loop
    /// is never resumed after it.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(interrupt_signal()).await
    }

    /// [`Assistant::run`] with the interrupt source supplied by the caller.
    ///
    /// The loop is abandoned as soon as `interrupt` completes, even in the
    /// middle of a capture or a typed read.
    pub async fn run_until(&mut self, interrupt: impl Future<Output = ()>) -> Result<()> {
        self.io.announce(READY_MESSAGE);
        let finished = tokio::select! {
            result = self.run_loop() => Some(result),
            () = interrupt => None,
        };
        match finished {
            None => {
                info!("interrupted");
                self.io.announce(INTERRUPTED_MESSAGE);
                Ok(())
            }
            Some(Ok(())) => Ok(()),
            Some(Err(err)) => {
                error!("fatal error: {:#}", err);
                self.io.show(&format!("Fatal error: {:#}", err));
                self.io.announce(FATAL_MESSAGE);
                Err(err)
            }
        }
    }

    /// Runs turns until one returns [`Turn::Quit`].
    ///
    /// # Errors
    /// Bubbles up the first fatal error from a turn.
    pub async fn run_loop(&mut self) -> Result<()> {
        while self.process_iteration().await? == Turn::Continue {}
        Ok(())
    }

    /// Executes one capture-dispatch iteration.
    ///
    /// # Details
    /// A failed capture is never fatal: the user is offered the keyboard.
    /// A blank typed line skips the turn; closed input ends the session.
    pub async fn process_iteration(&mut self) -> Result<Turn> {
        self.io.show("\nListening...");
        let text = match self.io.listen().await {
            Some(text) => text,
            None => {
                self.io.announce(DIDNT_CATCH_MESSAGE);
                match self
                    .io
                    .read_line("Type command (or press Enter to skip): ")
                    .await?
                {
                    None => {
                        self.io.announce(GOODBYE_MESSAGE);
                        return Ok(Turn::Quit);
                    }
                    Some(line) if line.trim().is_empty() => return Ok(Turn::Continue),
                    Some(line) => line,
                }
            }
        };
        self.handle_utterance(&text).await
    }

    /// Normalizes one raw utterance and acts on it.
    ///
    /// # Returns
    /// * `Ok(Turn::Quit)` - The utterance was exactly a quit word.
    /// * `Ok(Turn::Continue)` - Anything else, matched or not.
    pub async fn handle_utterance(&mut self, raw: &str) -> Result<Turn> {
        let text = normalize(raw);
        self.io.show(&format!("You said: {}", text));
        if should_quit(&text) {
            self.io.announce(GOODBYE_MESSAGE);
            return Ok(Turn::Quit);
        }
        let text = strip_wake_words(&text, &self.wake_words);
        match self.dispatcher.dispatch(&text, &mut self.io).await? {
            Dispatch::Handled { .. } => {}
            Dispatch::Unmatched => self.offer_web_search(&text).await,
        }
        Ok(Turn::Continue)
    }

    /// Asks before searching the web for an utterance no rule matched.
    async fn offer_web_search(&mut self, query: &str) {
        self.io.announce(FALLBACK_QUESTION);
        let confirmed = self
            .io
            .listen()
            .await
            .is_some_and(|answer| answer.to_lowercase().contains("yes"));
        if confirmed {
            self.io.announce(&format!("Searching the web for {}", query));
            self.dispatcher.open_url(&fallback_search_url(query));
        } else {
            self.io.announce(CANCELLED_MESSAGE);
        }
    }

    /// Releases the speaker. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.io.shutdown();
    }
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn interrupt_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
}

/// Lower-cases and trims one raw utterance.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// True only when the whole normalized utterance is a quit word.
///
/// "please stop the music" does not quit.
pub fn should_quit(text: &str) -> bool {
    QUIT_WORDS.contains(&text)
}

/// Removes wake-word prefixes, trying each word in order.
///
/// # Details
/// Each word is checked against the text left by the previous one, so
/// "jarvis assistant open github" loses "jarvis" but keeps "assistant"
/// (it was checked first, before "jarvis" was removed).
pub fn strip_wake_words(text: &str, wake_words: &[String]) -> String {
    let mut text = text.to_string();
    for word in wake_words {
        if let Some(rest) = text.strip_prefix(word.as_str()) {
            text = rest.trim().to_string();
        }
    }
    text
}

/// Google search URL with the query form-encoded.
pub fn fallback_search_url(query: &str) -> String {
    match reqwest::Url::parse_with_params("https://www.google.com/search", &[("q", query)]) {
        Ok(url) => url.to_string(),
        Err(_) => crate::actions::search_url(query),
    }
}
