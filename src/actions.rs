/*
 * @file actions.rs
 * @brief Executors for every dispatchable action
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

//! Executors for every classified command, plus the dispatcher that
//! classifies an utterance, runs the matching executor and speaks the
//! outcome.

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use tracing::{info, warn};

use crate::commands::{Action, Command, RuleTable};
use crate::error::ActionError;
use crate::interaction::Interaction;
use crate::notes::{truncate_chars, NoteStore, NotesSnapshot};
use crate::services::{
    AppLauncher, BrowserOpener, BuiltinJokes, JokeProvider, KnowledgeLookup, Platform,
    SystemBrowser, SystemLauncher, WikipediaClient,
};

/// Search endpoint used by the open-site and web-search executors.
pub const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Sentences requested from the knowledge service.
const SUMMARY_SENTENCES: u32 = 2;

/// Longest note excerpt spoken aloud; the console always gets everything.
pub const SPOKEN_NOTES_LIMIT: usize = 500;

/// Short names the open-site executor resolves without a lookup.
pub const SITE_ALIASES: &[(&str, &str)] = &[
    ("youtube", "https://www.youtube.com"),
    ("google", "https://www.google.com"),
    ("github", "https://github.com"),
    ("gmail", "https://mail.google.com"),
    ("reddit", "https://www.reddit.com"),
];

/// Successful executor outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    /// Text spoken back to the user.
    pub response: String,
    /// Whether an external side effect (browser, process, file) happened.
    pub side_effect: bool,
}

impl Reply {
    fn spoken(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            side_effect: false,
        }
    }

    fn with_side_effect(response: impl Into<String>, side_effect: bool) -> Self {
        Self {
            response: response.into(),
            side_effect,
        }
    }
}

/// Outcome of one dispatch call.
#[derive(Debug)]
pub enum Dispatch {
    /// No rule fired; the caller owns the fallback.
    Unmatched,
    /// A rule fired and its executor ran to completion.
    Handled {
        action: Action,
        outcome: Result<Reply, ActionError>,
    },
}

impl Dispatch {
    pub fn matched(&self) -> bool {
        matches!(self, Dispatch::Handled { .. })
    }

    /// Spoken text for a handled dispatch, including failure apologies.
    pub fn response(&self) -> Option<String> {
        match self {
            Dispatch::Unmatched => None,
            Dispatch::Handled { outcome: Ok(reply), .. } => Some(reply.response.clone()),
            Dispatch::Handled { outcome: Err(err), .. } => Some(err.user_message()),
        }
    }

    pub fn side_effect(&self) -> bool {
        matches!(
            self,
            Dispatch::Handled {
                outcome: Ok(Reply {
                    side_effect: true,
                    ..
                }),
                ..
            }
        )
    }
}

/// The external collaborators an executor may call.
pub struct Services {
    pub browser: Box<dyn BrowserOpener>,
    pub launcher: Box<dyn AppLauncher>,
    pub knowledge: Box<dyn KnowledgeLookup>,
    pub jokes: Box<dyn JokeProvider>,
}

impl Services {
    /// Real collaborators for the current platform.
    ///
    /// # Errors
    /// Returns an error if the Wikipedia HTTP client cannot be built.
    pub fn system(wikipedia_language: &str) -> Result<Self> {
        let platform = Platform::current();
        Ok(Self {
            browser: Box::new(SystemBrowser::new(platform)),
            launcher: Box::new(SystemLauncher::new(platform)),
            knowledge: Box::new(WikipediaClient::new(wikipedia_language)?),
            jokes: Box::new(BuiltinJokes::new()),
        })
    }
}

/// Behaviour switches that do not change rule order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Skip writing a note when no text was captured.
    pub skip_empty_notes: bool,
}

/// Classifies utterances and runs the matching executor.
pub struct Dispatcher {
    rules: RuleTable,
    services: Services,
    notes: NoteStore,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(
        rules: RuleTable,
        services: Services,
        notes: NoteStore,
        options: DispatchOptions,
    ) -> Self {
        Self {
            rules,
            services,
            notes,
            options,
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    /// Classifies `text`, executes the match and announces the result.
    ///
    /// # Details
    /// Executor failures are logged and replaced by their fixed apology;
    /// they never surface as `Err`.
    ///
    /// # Arguments
    /// * `text` - Normalized utterance with any wake word removed.
    /// * `io` - Where prompts and responses go.
    ///
    /// # Errors
    /// Only input-stream failures from `io` propagate.
    pub async fn dispatch(&mut self, text: &str, io: &mut dyn Interaction) -> Result<Dispatch> {
        let Some(command) = self.rules.classify(text) else {
            info!(utterance = text, "no rule matched");
            return Ok(Dispatch::Unmatched);
        };
        let action = command.action;
        info!(action = action.name(), argument = %command.argument, "dispatching");
        let outcome = self.execute(command, io).await?;
        match &outcome {
            Ok(reply) => io.announce(&reply.response),
            Err(err) => {
                warn!(action = action.name(), error = %err, "action failed");
                io.announce(&err.user_message());
            }
        }
        Ok(Dispatch::Handled { action, outcome })
    }

    /// Runs the executor for an already-classified command.
    ///
    /// The outer `Result` carries fatal input errors, the inner one the
    /// executor's own tagged outcome.
    pub async fn execute(
        &mut self,
        command: Command,
        io: &mut dyn Interaction,
    ) -> Result<Result<Reply, ActionError>> {
        let outcome = match command.action {
            Action::Greet => Ok(Reply::spoken("Hello! How can I help you?")),
            Action::TellTime => Ok(Reply::spoken(time_response(&Local::now()))),
            Action::OpenSite => Ok(self.open_site(&command.argument)),
            Action::WebSearch => Ok(self.web_search(&command.argument)),
            Action::Wikipedia => self.wikipedia(&command.argument).await,
            Action::Joke => Ok(Reply::spoken(self.services.jokes.joke())),
            Action::TakeNote => return self.take_note(io).await,
            Action::LaunchApp => self.launch_app(&command.argument, io),
            Action::ReadNotes => self.read_notes(io),
        };
        Ok(outcome)
    }

    fn open_site(&mut self, target: &str) -> Reply {
        let url = resolve_site_url(target);
        let opened = self.open_url(&url);
        Reply::with_side_effect(format!("Opening {}", target), opened)
    }

    fn web_search(&mut self, query: &str) -> Reply {
        let opened = self.open_url(&search_url(query));
        Reply::with_side_effect(format!("Searching for {}", query), opened)
    }

    /// Opens a URL. Browser failures are logged but not reported to the user.
    pub fn open_url(&mut self, url: &str) -> bool {
        match self.services.browser.open_url(url) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "browser open failed");
                false
            }
        }
    }

    async fn wikipedia(&mut self, topic: &str) -> Result<Reply, ActionError> {
        self.services
            .knowledge
            .summarize(topic, SUMMARY_SENTENCES)
            .await
            .map(Reply::spoken)
            .map_err(|source| ActionError::Lookup {
                topic: topic.to_string(),
                source,
            })
    }

    /// Prompts for note text (voice first, keyboard second) and appends it.
    async fn take_note(&mut self, io: &mut dyn Interaction) -> Result<Result<Reply, ActionError>> {
        io.announce("What should I write in the note?");
        let text = match io.listen().await {
            Some(text) => text,
            None => io.read_line("Type the note: ").await?.unwrap_or_default(),
        };
        if text.is_empty() && self.options.skip_empty_notes {
            return Ok(Ok(Reply::spoken("Note was empty, nothing saved.")));
        }
        Ok(self
            .notes
            .append(&text)
            .map(|_| Reply::with_side_effect("Note saved.", true))
            .map_err(ActionError::from))
    }

    fn launch_app(&mut self, app: &str, io: &mut dyn Interaction) -> Result<Reply, ActionError> {
        io.announce(&format!("Trying to open {}", app));
        self.services
            .launcher
            .launch(app)
            .map(|()| Reply::with_side_effect(format!("{} launched.", app), true))
            .map_err(|source| ActionError::Launch {
                app: app.to_string(),
                source,
            })
    }

    fn read_notes(&mut self, io: &mut dyn Interaction) -> Result<Reply, ActionError> {
        match self.notes.read()? {
            NotesSnapshot::Missing => Ok(Reply::spoken("You don't have any notes yet.")),
            NotesSnapshot::Empty => Ok(Reply::spoken("Your notes file is empty.")),
            NotesSnapshot::Present(content) => {
                io.announce("Here are your notes.");
                io.show(&format!("\n--- NOTES ---\n{}", content));
                Ok(Reply::spoken(truncate_chars(&content, SPOKEN_NOTES_LIMIT)))
            }
        }
    }
}

/// Resolves an open-site target to a URL.
///
/// # Details
/// Resolution order:
/// 1. Exact alias from [`SITE_ALIASES`].
/// 2. Anything containing "." or ending in "com" is a bare domain and
///    gets "http://" unless it already starts with "http".
/// 3. Otherwise a Google search for the target.
pub fn resolve_site_url(target: &str) -> String {
    if let Some((_, url)) = SITE_ALIASES.iter().find(|(name, _)| *name == target) {
        return (*url).to_string();
    }
    if target.contains('.') || target.ends_with("com") {
        if target.starts_with("http") {
            target.to_string()
        } else {
            format!("http://{}", target)
        }
    } else {
        search_url(target)
    }
}

/// Google search URL with spaces turned into `+`. No other escaping.
pub fn search_url(query: &str) -> String {
    format!("{}{}", GOOGLE_SEARCH_URL, query.replace(' ', "+"))
}

/// "The time is 03:45 PM" style response for a given instant.
pub fn time_response<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("The time is {}", now.format("%I:%M %p"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn aliases_resolve_exactly() {
        assert_eq!(resolve_site_url("youtube"), "https://www.youtube.com");
        assert_eq!(resolve_site_url("gmail"), "https://mail.google.com");
    }

    #[test]
    fn domains_get_http_prefix() {
        assert_eq!(resolve_site_url("example.com"), "http://example.com");
        assert_eq!(resolve_site_url("examplecom"), "http://examplecom");
        assert_eq!(
            resolve_site_url("https://rust-lang.org"),
            "https://rust-lang.org"
        );
    }

    #[test]
    fn other_targets_become_searches() {
        assert_eq!(
            resolve_site_url("coffee shops near me"),
            "https://www.google.com/search?q=coffee+shops+near+me"
        );
    }

    #[test]
    fn alias_match_is_exact() {
        assert_eq!(
            resolve_site_url("youtube music"),
            "https://www.google.com/search?q=youtube+music"
        );
    }

    #[test]
    fn time_uses_twelve_hour_clock() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let afternoon = tz.with_ymd_and_hms(2025, 6, 1, 15, 45, 0).unwrap();
        assert_eq!(time_response(&afternoon), "The time is 03:45 PM");
        let morning = tz.with_ymd_and_hms(2025, 6, 1, 0, 5, 0).unwrap();
        assert_eq!(time_response(&morning), "The time is 12:05 AM");
    }

    #[test]
    fn dispatch_accessors() {
        let unmatched = Dispatch::Unmatched;
        assert!(!unmatched.matched());
        assert_eq!(unmatched.response(), None);

        let handled = Dispatch::Handled {
            action: Action::OpenSite,
            outcome: Ok(Reply::with_side_effect("Opening youtube", true)),
        };
        assert!(handled.matched());
        assert!(handled.side_effect());
        assert_eq!(handled.response().as_deref(), Some("Opening youtube"));
    }
}
