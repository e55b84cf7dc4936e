/*
 * @file services.rs
 * @brief Browser, launcher, Wikipedia and joke collaborators
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

//! External collaborators consumed by the executors.
//!
//! Each collaborator sits behind a small trait so the dispatcher can be
//! driven by fakes in tests and by the system implementations at runtime.

use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BrowserError, LaunchError, LookupError};

/// Request timeout for the knowledge service.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Operating-system family, used to pick spawn commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

/// Opens URLs in the user's browser.
pub trait BrowserOpener: Send {
    fn open_url(&mut self, url: &str) -> Result<(), BrowserError>;
}

/// Starts desktop applications by name or path.
pub trait AppLauncher: Send {
    fn launch(&mut self, app_name: &str) -> Result<(), LaunchError>;
}

/// Returns short encyclopedia summaries.
#[async_trait]
pub trait KnowledgeLookup: Send + Sync {
    async fn summarize(&self, topic: &str, sentences: u32) -> Result<String, LookupError>;
}

/// Supplies one joke per call.
pub trait JokeProvider: Send {
    fn joke(&mut self) -> String;
}

/// Browser opener that hands URLs to the platform's default handler.
///
/// # Details
/// The helper process is not awaited by the caller; it is reaped on a
/// background thread once it exits.
#[derive(Clone, Debug)]
pub struct SystemBrowser {
    platform: Platform,
}

impl SystemBrowser {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl BrowserOpener for SystemBrowser {
    fn open_url(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!(url, "opening url");
        browser_command(self.platform, url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|child| {
                reap_in_background(child);
            })
            .map_err(|source| BrowserError::Open {
                url: url.to_string(),
                source,
            })
    }
}

/// Builds the platform command that opens `url`.
fn browser_command(platform: Platform, url: &str) -> Command {
    match platform {
        Platform::Windows => {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", url]);
            cmd
        }
        Platform::MacOs => {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        }
        Platform::Linux => {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

/// Launcher that spawns processes directly, or through `open -a` on macOS.
///
/// # Details
/// No existence or argument validation is performed before spawning; the
/// only failure surfaced is the spawn itself.
#[derive(Clone, Debug)]
pub struct SystemLauncher {
    platform: Platform,
}

impl SystemLauncher {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl AppLauncher for SystemLauncher {
    fn launch(&mut self, app_name: &str) -> Result<(), LaunchError> {
        let mut cmd = launch_command(self.platform, app_name);
        let program = cmd.get_program().to_string_lossy().into_owned();
        debug!(program, app_name, "spawning application");
        cmd.spawn()
            .map(|child| {
                reap_in_background(child);
            })
            .map_err(|source| LaunchError::Spawn { program, source })
    }
}

/// Waits for `child` on a detached thread so it never lingers as a zombie.
fn reap_in_background(mut child: Child) -> thread::JoinHandle<io::Result<ExitStatus>> {
    thread::spawn(move || {
        let status = child.wait();
        match &status {
            Ok(status) => debug!(pid = child.id(), %status, "child exited"),
            Err(err) => debug!(pid = child.id(), error = %err, "child wait failed"),
        }
        status
    })
}

/// Builds the spawn command for `app_name` on `platform`.
fn launch_command(platform: Platform, app_name: &str) -> Command {
    match platform {
        Platform::MacOs => {
            let mut cmd = Command::new("open");
            cmd.args(["-a", app_name]);
            cmd
        }
        Platform::Windows | Platform::Linux => Command::new(app_name),
    }
}

/// Wikipedia-backed [`KnowledgeLookup`] using the MediaWiki action API.
///
/// # Details
/// A lookup is two requests: a title search that resolves the spoken
/// topic to the best-matching article, then a plain-text extract limited
/// to the requested number of sentences. Disambiguation pages are
/// reported as [`LookupError::Ambiguous`].
#[derive(Clone, Debug)]
pub struct WikipediaClient {
    client: reqwest::Client,
    endpoint: String,
}

impl WikipediaClient {
    /// Creates a client for the given language edition (e.g. "en").
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(language: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .user_agent(concat!("voice-dispatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to build Wikipedia HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("https://{}.wikipedia.org/w/api.php", language),
        })
    }

    async fn resolve_title(&self, topic: &str) -> Result<String, LookupError> {
        let body: SearchResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", topic),
                ("srlimit", "1"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        first_search_title(body, topic)
    }

    async fn fetch_extract(&self, title: &str, sentences: u32) -> Result<String, LookupError> {
        let sentences = sentences.to_string();
        let body: ExtractResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("prop", "extracts|pageprops"),
                ("ppprop", "disambiguation"),
                ("exsentences", sentences.as_str()),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        extract_summary(body, title)
    }
}

#[async_trait]
impl KnowledgeLookup for WikipediaClient {
    async fn summarize(&self, topic: &str, sentences: u32) -> Result<String, LookupError> {
        if topic.trim().is_empty() {
            return Err(LookupError::NotFound(topic.to_string()));
        }
        let title = self.resolve_title(topic).await?;
        debug!(topic, title, "resolved wikipedia title");
        self.fetch_extract(&title, sentences).await
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<serde_json::Value>,
}

fn first_search_title(body: SearchResponse, topic: &str) -> Result<String, LookupError> {
    let query = body
        .query
        .ok_or_else(|| LookupError::Malformed("search response has no query".into()))?;
    query
        .search
        .into_iter()
        .next()
        .map(|hit| hit.title)
        .ok_or_else(|| LookupError::NotFound(topic.to_string()))
}

fn extract_summary(body: ExtractResponse, title: &str) -> Result<String, LookupError> {
    let page = body
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(|| LookupError::Malformed("extract response has no pages".into()))?;
    if page.missing {
        return Err(LookupError::NotFound(title.to_string()));
    }
    let is_disambiguation = page
        .pageprops
        .as_ref()
        .is_some_and(|props| props.get("disambiguation").is_some());
    if is_disambiguation {
        return Err(LookupError::Ambiguous(title.to_string()));
    }
    match page.extract.map(|text| text.trim().to_string()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(LookupError::NotFound(title.to_string())),
    }
}

/// One-liners served by [`BuiltinJokes`].
const JOKES: &[&str] = &[
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "There are only 10 kinds of people in this world: those who know binary and those who don't.",
    "A SQL query walks into a bar, walks up to two tables and asks: can I join you?",
    "Why did the developer go broke? Because he used up all his cache.",
    "How many programmers does it take to change a light bulb? None, that's a hardware problem.",
    "I would tell you a UDP joke, but you might not get it.",
    "Debugging is like being the detective in a crime movie where you are also the murderer.",
    "Why do Java developers wear glasses? Because they don't C sharp.",
    "The best thing about a boolean is that even if you are wrong, you are only off by a bit.",
    "To understand what recursion is, you must first understand recursion.",
    "Knock knock. Race condition. Who's there?",
    "An optimist says the glass is half full. A programmer says the glass is twice as large as it needs to be.",
];

/// Joke provider that picks uniformly from a built-in list.
///
/// No de-duplication: the same joke may come up twice in a row.
pub struct BuiltinJokes {
    rng: StdRng,
}

impl BuiltinJokes {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic provider for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for BuiltinJokes {
    fn default() -> Self {
        Self::new()
    }
}

impl JokeProvider for BuiltinJokes {
    fn joke(&mut self) -> String {
        JOKES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(JOKES[0])
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn macos_launch_goes_through_open() {
        let cmd = launch_command(Platform::MacOs, "Safari");
        assert_eq!(cmd.get_program(), "open");
        assert_eq!(args_of(&cmd), vec!["-a", "Safari"]);
    }

    #[test]
    fn linux_and_windows_spawn_directly() {
        for platform in [Platform::Linux, Platform::Windows] {
            let cmd = launch_command(platform, "firefox");
            assert_eq!(cmd.get_program(), "firefox");
            assert!(args_of(&cmd).is_empty());
        }
    }

    #[test]
    fn launching_a_missing_binary_is_a_spawn_error() {
        let mut launcher = SystemLauncher::new(Platform::Linux);
        let err = launcher
            .launch("definitely-not-a-real-binary-7f3a")
            .unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn spawned_children_are_reaped() {
        let child = Command::new("true").spawn().unwrap();
        let status = reap_in_background(child).join().unwrap().unwrap();
        assert!(status.success());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn launching_an_existing_binary_succeeds() {
        let mut launcher = SystemLauncher::new(Platform::Linux);
        launcher.launch("true").unwrap();
    }

    #[test]
    fn browser_commands_per_platform() {
        let url = "https://example.com";
        assert_eq!(browser_command(Platform::Linux, url).get_program(), "xdg-open");
        assert_eq!(browser_command(Platform::MacOs, url).get_program(), "open");
        let win = browser_command(Platform::Windows, url);
        assert_eq!(win.get_program(), "cmd");
        assert_eq!(args_of(&win), vec!["/C", "start", "", url]);
    }

    #[test]
    fn search_title_picks_first_hit() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"query":{"search":[{"title":"Ada Lovelace"},{"title":"Ada"}]}}"#,
        )
        .unwrap();
        assert_eq!(first_search_title(body, "ada").unwrap(), "Ada Lovelace");
    }

    #[test]
    fn empty_search_is_not_found() {
        let body: SearchResponse = serde_json::from_str(r#"{"query":{"search":[]}}"#).unwrap();
        assert!(matches!(
            first_search_title(body, "qwxz"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn extract_returns_trimmed_text() {
        let body: ExtractResponse = serde_json::from_str(
            r#"{"query":{"pages":[{"title":"Rust","extract":" Rust is a language. It is fast. "}]}}"#,
        )
        .unwrap();
        assert_eq!(
            extract_summary(body, "Rust").unwrap(),
            "Rust is a language. It is fast."
        );
    }

    #[test]
    fn disambiguation_page_is_ambiguous() {
        let body: ExtractResponse = serde_json::from_str(
            r#"{"query":{"pages":[{"title":"Mercury","extract":"Mercury may refer to:","pageprops":{"disambiguation":""}}]}}"#,
        )
        .unwrap();
        assert!(matches!(
            extract_summary(body, "Mercury"),
            Err(LookupError::Ambiguous(_))
        ));
    }

    #[test]
    fn missing_page_is_not_found() {
        let body: ExtractResponse =
            serde_json::from_str(r#"{"query":{"pages":[{"title":"Nope","missing":true}]}}"#)
                .unwrap();
        assert!(matches!(
            extract_summary(body, "Nope"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn response_without_query_is_malformed() {
        let body: ExtractResponse = serde_json::from_str(r#"{"batchcomplete":true}"#).unwrap();
        assert!(matches!(
            extract_summary(body, "x"),
            Err(LookupError::Malformed(_))
        ));
    }

    #[test]
    fn builtin_jokes_come_from_the_list() {
        let mut jokes = BuiltinJokes::seeded(7);
        for _ in 0..20 {
            let joke = jokes.joke();
            assert!(JOKES.contains(&joke.as_str()));
        }
    }
}
