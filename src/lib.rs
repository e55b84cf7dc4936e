/*
 * @file lib.rs
 * @brief Voice Dispatch library root
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

//! Voice Dispatch - a voice-driven command dispatcher.
//!
//! Spoken (or typed) phrases are matched against a fixed, ordered table of
//! literal substring and prefix rules and turned into one of a small set of
//! desktop actions:
//! - greeting and telling the time
//! - opening sites, searching the web, reading Wikipedia summaries
//! - telling jokes, taking and reading notes, launching applications
//!
//! Audio is captured with CPAL and transcribed locally with Whisper;
//! replies are spoken through the platform's speech command.
//!
//! # Example
//! ```no_run
//! use anyhow::Result;
//! use voice_dispatch::assistant::{self, InputMode};
//! use voice_dispatch::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     dotenv::dotenv().ok();
//!     assistant::run_voice_assistant(&AppConfig::default(), InputMode::Text, true).await
//! }
//! ```

pub mod actions;
pub mod assistant;
pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod interaction;
pub mod notes;
pub mod services;
pub mod speech;
pub mod transcribe;
