//! Headline source for the ticker.
//!
//! A refresh fetches the current entries, turns them into one display-safe
//! line of text and publishes it. Failures and empty results leave the
//! previous text in place.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::logging::{log_feed_failure, log_feed_refresh};
use crate::retry::{retry_async, RetryConfig};
use crate::ticker::TickerBuffer;

pub const ENTRY_SEPARATOR: &str = "   ---   ";

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Current entries, newest first as the source orders them.
    async fn fetch_entries(&self) -> Result<Vec<String>>;
}

/// RSS 2.0 document over HTTP; entries are the item titles.
pub struct RssFeed {
    client: Client,
    url: String,
}

impl RssFeed {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl FeedSource for RssFeed {
    async fn fetch_entries(&self) -> Result<Vec<String>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()?
            .text()
            .await
            .context("reading feed body")?;
        parse_rss_titles(&body)
    }
}

/// Fixed entries, for runs without network access.
pub struct StaticFeed(pub Vec<String>);

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_entries(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Titles of every `<item>` in an RSS document, in document order.
///
/// Titles outside an item (the channel title) are not entries.
pub fn parse_rss_titles(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut titles = Vec::new();
    let mut in_item = false;
    let mut title: Option<String> = None;
    loop {
        match reader.read_event().context("parsing feed document")? {
            XmlEvent::Start(tag) => match tag.local_name().as_ref() {
                b"item" => in_item = true,
                b"title" if in_item => title = Some(String::new()),
                _ => {}
            },
            XmlEvent::Text(text) => {
                if let Some(buf) = title.as_mut() {
                    buf.push_str(&text.unescape().context("decoding feed title")?);
                }
            }
            XmlEvent::CData(data) => {
                if let Some(buf) = title.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            XmlEvent::End(tag) => match tag.local_name().as_ref() {
                b"title" => {
                    if let Some(done) = title.take() {
                        let done = done.trim();
                        if !done.is_empty() {
                            titles.push(done.to_string());
                        }
                    }
                }
                b"item" => {
                    in_item = false;
                    title = None;
                }
                _ => {}
            },
            XmlEvent::Eof => break,
            _ => {}
        }
    }
    Ok(titles)
}

fn transliterate(c: char) -> Option<&'static str> {
    match c {
        'ä' => Some("ae"),
        'ö' => Some("oe"),
        'ü' => Some("ue"),
        'Ä' => Some("Ae"),
        'Ö' => Some("Oe"),
        'Ü' => Some("Ue"),
        'ß' => Some("ss"),
        _ => None,
    }
}

/// Length in bytes of a `+`-run followed by a space at the start of `s`.
fn plus_marker_len(s: &str) -> Option<usize> {
    let pluses = s.bytes().take_while(|&b| b == b'+').count();
    (pluses > 0 && s.as_bytes().get(pluses) == Some(&b' ')).then_some(pluses + 1)
}

/// Make a headline line printable on the single-byte panel.
///
/// Umlauts are spelled out, live-blog `+++` markers are dropped and any
/// remaining non-ASCII character becomes `?`.
pub fn prettify(input: &str) -> String {
    let mut spelled = String::with_capacity(input.len());
    for c in input.chars() {
        match transliterate(c) {
            Some(s) => spelled.push_str(s),
            None => spelled.push(c),
        }
    }

    let mut out = String::with_capacity(spelled.len());
    let mut rest = spelled.as_str();
    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("Liveblog: ") {
            if let Some(len) = plus_marker_len(after) {
                rest = &after[len..];
                continue;
            }
        }
        if let Some(len) = plus_marker_len(rest) {
            rest = &rest[len..];
            continue;
        }
        out.push(if c.is_ascii() { c } else { '?' });
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// One ticker line from a list of entries.
pub fn ticker_text(entries: &[String]) -> String {
    prettify(&entries.join(ENTRY_SEPARATOR))
}

/// Fetch once and publish. Returns whether the ticker text changed.
pub async fn refresh_once(
    source: &dyn FeedSource,
    buffer: &TickerBuffer,
    retry: &RetryConfig,
) -> Result<bool> {
    let entries = retry_async(retry, "feed_fetch", || source.fetch_entries()).await?;
    if entries.is_empty() {
        anyhow::bail!("feed returned no entries");
    }
    let text = ticker_text(&entries);
    log_feed_refresh(entries.len(), text.len());
    Ok(buffer.replace(text))
}

/// Refresh the ticker on a fixed interval for the life of the process.
pub async fn run(
    source: Arc<dyn FeedSource>,
    buffer: TickerBuffer,
    interval: Duration,
    retry: RetryConfig,
) -> Result<()> {
    loop {
        if let Err(err) = refresh_once(source.as_ref(), &buffer, &retry).await {
            log_feed_failure(&format!("{:#}", err));
        }
        sleep(interval).await;
    }
}
