/*
 * @file commands.rs
 * @brief Ordered rule table and argument extraction
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

//! Ordered command rules and the classifier that walks them.
//!
//! Matching is literal: each rule either looks for a substring anywhere in
//! the utterance or for a prefix. Rules are tried in table order and the
//! first hit wins, so the position of a rule in [`RuleTable`] *is* its
//! precedence.

/// Every action the dispatcher knows how to execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Greet,
    TellTime,
    OpenSite,
    WebSearch,
    Wikipedia,
    Joke,
    TakeNote,
    LaunchApp,
    ReadNotes,
}

impl Action {
    /// Short stable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Action::Greet => "greet",
            Action::TellTime => "tell_time",
            Action::OpenSite => "open_site",
            Action::WebSearch => "web_search",
            Action::Wikipedia => "wikipedia",
            Action::Joke => "joke",
            Action::TakeNote => "take_note",
            Action::LaunchApp => "launch_app",
            Action::ReadNotes => "read_notes",
        }
    }
}

/// Predicate half of a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Matcher {
    /// Fires when any needle occurs anywhere in the utterance.
    Contains(&'static [&'static str]),
    /// Fires when the utterance starts with any of the prefixes.
    StartsWith(&'static [&'static str]),
}

impl Matcher {
    /// Tests the matcher against an already-normalized utterance.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Contains(needles) => needles.iter().any(|needle| text.contains(needle)),
            Matcher::StartsWith(prefixes) => {
                prefixes.iter().any(|prefix| text.starts_with(prefix))
            }
        }
    }
}

/// One entry of the rule table: when `matcher` fires, `action` runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rule {
    pub action: Action,
    pub matcher: Matcher,
}

/// Rules in their historical evaluation order.
///
/// # Details
/// `TakeNote` sits ahead of `ReadNotes` and matches the bare substring
/// "note", so "read notes" and "show notes" never reach `ReadNotes` with
/// this ordering. `LaunchApp`'s "open app " prefix is likewise shadowed by
/// `OpenSite`'s "open ". Both are kept as-is; see
/// [`RuleTable::with_read_notes_first`] for the reordered table.
pub const STANDARD_RULES: [Rule; 9] = [
    Rule {
        action: Action::Greet,
        matcher: Matcher::Contains(&["hello", "hi", "hey"]),
    },
    Rule {
        action: Action::TellTime,
        matcher: Matcher::Contains(&["time"]),
    },
    Rule {
        action: Action::OpenSite,
        matcher: Matcher::StartsWith(&["open "]),
    },
    Rule {
        action: Action::WebSearch,
        matcher: Matcher::StartsWith(&["search ", "google "]),
    },
    Rule {
        action: Action::Wikipedia,
        matcher: Matcher::StartsWith(&["wikipedia ", "who is ", "what is "]),
    },
    Rule {
        action: Action::Joke,
        matcher: Matcher::Contains(&["joke"]),
    },
    Rule {
        action: Action::TakeNote,
        matcher: Matcher::Contains(&["take a note", "note"]),
    },
    Rule {
        action: Action::LaunchApp,
        matcher: Matcher::StartsWith(&["launch ", "open app "]),
    },
    Rule {
        action: Action::ReadNotes,
        matcher: Matcher::Contains(&["read notes", "show notes"]),
    },
];

/// A classified utterance: the action to run and its extracted argument.
///
/// `argument` is empty for actions that take no input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub action: Action,
    pub argument: String,
}

/// Ordered, inspectable list of rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleTable {
    /// Builds the table in the historical order.
    pub fn standard() -> Self {
        Self {
            rules: STANDARD_RULES.to_vec(),
        }
    }

    /// Builds the table with `ReadNotes` moved directly ahead of `TakeNote`.
    ///
    /// # Details
    /// With this ordering "read notes" and "show notes" reach the note
    /// reader, while any other utterance containing "note" still writes one.
    pub fn with_read_notes_first() -> Self {
        let mut rules = STANDARD_RULES.to_vec();
        if let Some(read_pos) = rules.iter().position(|r| r.action == Action::ReadNotes) {
            let read = rules.remove(read_pos);
            let take_pos = rules
                .iter()
                .position(|r| r.action == Action::TakeNote)
                .unwrap_or(rules.len());
            rules.insert(take_pos, read);
        }
        Self { rules }
    }

    /// Picks the table variant requested by configuration.
    pub fn from_config(read_notes_first: bool) -> Self {
        if read_notes_first {
            Self::with_read_notes_first()
        } else {
            Self::standard()
        }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Finds the first rule that fires for `text` and extracts its argument.
    ///
    /// # Arguments
    /// * `text` - The lower-cased, trimmed utterance.
    ///
    /// # Returns
    /// * `Some(Command)` - The first matching rule's action and argument.
    /// * `None` - No rule fired; the caller owns the fallback.
    pub fn classify(&self, text: &str) -> Option<Command> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(text))
            .map(|rule| Command {
                action: rule.action,
                argument: extract_argument(rule.action, text),
            })
    }
}

/// Pulls the parameter an action needs out of the utterance.
///
/// # Details
/// Extraction is literal text surgery, never parsing:
/// * `OpenSite` drops the first "open " and trims.
/// * `WebSearch` keeps everything after the first space, untrimmed.
/// * `Wikipedia` deletes every "wikipedia", "who is" and "what is".
/// * `LaunchApp` deletes every "launch" and "open app".
fn extract_argument(action: Action, text: &str) -> String {
    match action {
        Action::OpenSite => text.replacen("open ", "", 1).trim().to_string(),
        Action::WebSearch => text
            .split_once(' ')
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_default(),
        Action::Wikipedia => text
            .replace("wikipedia", "")
            .replace("who is", "")
            .replace("what is", "")
            .trim()
            .to_string(),
        Action::LaunchApp => text
            .replace("launch", "")
            .replace("open app", "")
            .trim()
            .to_string(),
        Action::Greet
        | Action::TellTime
        | Action::Joke
        | Action::TakeNote
        | Action::ReadNotes => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action_of(text: &str) -> Option<Action> {
        RuleTable::standard().classify(text).map(|cmd| cmd.action)
    }

    #[test]
    fn greeting_words_match_anywhere() {
        assert_eq!(action_of("hello there"), Some(Action::Greet));
        assert_eq!(action_of("hey"), Some(Action::Greet));
        // "this" contains "hi"; substring matching is intentionally literal
        assert_eq!(action_of("open this.com"), Some(Action::Greet));
    }

    #[test]
    fn time_wins_over_later_rules() {
        assert_eq!(action_of("what time is it"), Some(Action::TellTime));
        assert_eq!(action_of("search time zones"), Some(Action::TellTime));
        assert_eq!(action_of("open timetable.com"), Some(Action::TellTime));
    }

    #[test]
    fn open_extracts_target() {
        let cmd = RuleTable::standard().classify("open youtube").unwrap();
        assert_eq!(cmd.action, Action::OpenSite);
        assert_eq!(cmd.argument, "youtube");
    }

    #[test]
    fn open_app_is_shadowed_by_open_site() {
        let cmd = RuleTable::standard().classify("open app spotify").unwrap();
        assert_eq!(cmd.action, Action::OpenSite);
        assert_eq!(cmd.argument, "app spotify");
    }

    #[test]
    fn search_keeps_text_after_first_space() {
        let cmd = RuleTable::standard().classify("google rust lang").unwrap();
        assert_eq!(cmd.action, Action::WebSearch);
        assert_eq!(cmd.argument, "rust lang");
    }

    #[test]
    fn wikipedia_strips_every_trigger_phrase() {
        let cmd = RuleTable::standard().classify("who is ada lovelace").unwrap();
        assert_eq!(cmd.action, Action::Wikipedia);
        assert_eq!(cmd.argument, "ada lovelace");

        let cmd = RuleTable::standard().classify("wikipedia rust").unwrap();
        assert_eq!(cmd.argument, "rust");
    }

    #[test]
    fn launch_extracts_app_name() {
        let cmd = RuleTable::standard().classify("launch firefox").unwrap();
        assert_eq!(cmd.action, Action::LaunchApp);
        assert_eq!(cmd.argument, "firefox");
    }

    #[test]
    fn joke_is_recognized() {
        assert_eq!(action_of("tell me a joke"), Some(Action::Joke));
    }

    #[test]
    fn note_substring_captures_read_notes_in_standard_order() {
        assert_eq!(action_of("take a note"), Some(Action::TakeNote));
        assert_eq!(action_of("read notes"), Some(Action::TakeNote));
        assert_eq!(action_of("show notes"), Some(Action::TakeNote));
    }

    #[test]
    fn reordered_table_reaches_read_notes() {
        let table = RuleTable::with_read_notes_first();
        assert_eq!(table.classify("read notes").unwrap().action, Action::ReadNotes);
        assert_eq!(table.classify("show notes").unwrap().action, Action::ReadNotes);
        assert_eq!(table.classify("take a note").unwrap().action, Action::TakeNote);
    }

    #[test]
    fn reordered_table_only_moves_read_notes() {
        let table = RuleTable::with_read_notes_first();
        let order: Vec<Action> = table.rules().iter().map(|r| r.action).collect();
        assert_eq!(
            order,
            vec![
                Action::Greet,
                Action::TellTime,
                Action::OpenSite,
                Action::WebSearch,
                Action::Wikipedia,
                Action::Joke,
                Action::ReadNotes,
                Action::TakeNote,
                Action::LaunchApp,
            ]
        );
    }

    #[test]
    fn from_config_selects_variant() {
        assert_eq!(RuleTable::from_config(false), RuleTable::standard());
        assert_eq!(
            RuleTable::from_config(true),
            RuleTable::with_read_notes_first()
        );
    }

    #[test]
    fn unmatched_text_returns_none() {
        assert_eq!(action_of("play some music"), None);
        assert_eq!(action_of(""), None);
    }
}
