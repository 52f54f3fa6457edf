//! Wikipedia current events portal scraper.
//!
//! Each day has a portal page such as `Portal:Current_events/2024_March_5`.
//! The page is fetched already rendered through the MediaWiki
//! [parse API](https://www.mediawiki.org/wiki/API:Parsing_wikitext) and its
//! top-level bullets are turned into [`EventItem`]s.
//!
//! # Page Structure
//!
//! Bullets live under `.current-events-content`, grouped by category
//! headings. A top-level bullet is usually either a full story or a topic
//! link (e.g. "Russian invasion of Ukraine") whose stories are nested
//! sub-bullets; sub-bullets are skipped, their text is part of the parent.

use crate::clock::Clock;
use crate::config::Settings;
use crate::error::ApiError;
use crate::models::{EventItem, EventsResponse, ParseResponse};
use crate::utils::{
    collapse_whitespace, parse_portal_date, portal_page_title, truncate_chars, truncate_for_log,
};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Maximum characters kept in [`EventItem::summary`].
pub const SUMMARY_MAX_CHARS: usize = 300;

/// Bullets with this many characters or fewer are dropped.
pub const MIN_ITEM_CHARS: usize = 20;

/// Fallback title length when a bullet has no link and no sentence break.
const TITLE_FALLBACK_CHARS: usize = 100;

static ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".current-events-content ul > li").unwrap());

static ARTICLE_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href^="/wiki/"]"#).unwrap());

/// Client for the MediaWiki parse API.
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    api_url: String,
    site_url: Url,
}

impl PortalClient {
    /// Build a client from the resolved settings.
    ///
    /// # Errors
    ///
    /// Fails when `site_url` is not an absolute URL or the HTTP client
    /// cannot be constructed.
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_url: settings.api_url.clone(),
            site_url: Url::parse(&settings.site_url)?,
        })
    }

    /// Fetch the rendered HTML of a page.
    ///
    /// A response without `parse.text` yields an empty string.
    ///
    /// # Errors
    ///
    /// Transport failures, non-success statuses and bodies that are not JSON
    /// are returned as-is; nothing is retried.
    #[instrument(level = "info", skip(self), fields(api_url = %self.api_url))]
    pub async fn fetch_page_html(&self, page_title: &str) -> Result<String, ApiError> {
        let params = [
            ("action", "parse"),
            ("format", "json"),
            ("formatversion", "2"),
            ("prop", "text"),
            ("page", page_title),
            ("origin", "*"),
        ];

        let response = self
            .http
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let parsed: ParseResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body_preview = %truncate_for_log(&body, 300),
                "Parse API returned non-JSON body"
            );
            e
        })?;

        let html = parsed.into_html();
        if html.is_empty() {
            warn!(page = page_title, "Parse API response has no page text");
        }
        debug!(bytes = html.len(), "Fetched portal HTML");
        Ok(html)
    }

    /// Fetch and extract up to `limit` events for a date.
    ///
    /// `date` is the raw request value. When absent (or empty) the clock's
    /// current UTC date picks the page and is stamped on every item.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidDate`] when `date` is not a calendar date, otherwise
    /// whatever [`fetch_page_html`](Self::fetch_page_html) returns.
    #[instrument(level = "info", skip(self, clock))]
    pub async fn current_events(
        &self,
        date: Option<&str>,
        limit: usize,
        clock: &dyn Clock,
    ) -> Result<EventsResponse, ApiError> {
        let requested = date.filter(|d| !d.is_empty());
        // One clock read so the page and the item dates agree across midnight.
        let today = clock.today();
        let portal_day = match requested {
            Some(raw) => {
                parse_portal_date(raw).map_err(|_| ApiError::InvalidDate(raw.to_string()))?
            }
            None => today,
        };
        let page = portal_page_title(portal_day);

        let item_date = match requested {
            Some(raw) => raw.to_string(),
            None => today.format("%Y-%m-%d").to_string(),
        };

        let html = self.fetch_page_html(&page).await?;
        let mut items = extract_events(&html, &page, &self.site_url, &item_date)?;
        let candidates = items.len();
        items.truncate(limit);

        info!(%page, candidates, returned = items.len(), limit, "Extracted portal events");
        Ok(EventsResponse::new(
            requested.map(str::to_string),
            page,
            items,
        ))
    }
}

/// Extract top-level portal bullets from rendered page HTML.
///
/// Every returned item has more than [`MIN_ITEM_CHARS`] characters of text
/// and a summary of at most [`SUMMARY_MAX_CHARS`] characters. Items keep
/// document order.
///
/// # Errors
///
/// Only fails when an article link cannot be joined onto `site_url`.
pub fn extract_events(
    html: &str,
    page_title: &str,
    site_url: &Url,
    item_date: &str,
) -> Result<Vec<EventItem>, ApiError> {
    let document = Html::parse_document(html);
    let page_url = format!(
        "{}/wiki/{}",
        site_url.as_str().trim_end_matches('/'),
        urlencoding::encode(page_title)
    );

    let mut items = Vec::new();
    let mut nested = 0usize;
    let mut short = 0usize;

    for li in document.select(&ITEM_SELECTOR) {
        if is_sub_bullet(&li) {
            nested += 1;
            continue;
        }

        let text = collapse_whitespace(&li.text().collect::<String>());
        if text.chars().count() <= MIN_ITEM_CHARS {
            short += 1;
            continue;
        }

        let link = first_article_link(&li);
        let url = match link.and_then(|a| a.value().attr("href")) {
            Some(href) => site_url.join(href)?.to_string(),
            None => page_url.clone(),
        };

        let link_text = link
            .map(|a| a.text().collect::<String>())
            .unwrap_or_default();
        let title = if !link_text.trim().is_empty() {
            link_text.trim().to_string()
        } else {
            fallback_title(&text)
        };

        items.push(EventItem {
            title,
            summary: truncate_chars(&text, SUMMARY_MAX_CHARS),
            url,
            date: item_date.to_string(),
        });
    }

    debug!(kept = items.len(), nested, short, "Walked portal bullets");
    Ok(items)
}

/// A bullet whose grandparent is a list item is a sub-bullet
/// (`li > ul > li`).
fn is_sub_bullet(li: &ElementRef) -> bool {
    li.parent()
        .and_then(|list| list.parent())
        .and_then(ElementRef::wrap)
        .is_some_and(|grandparent| grandparent.value().name() == "li")
}

/// First link to an existing article.
///
/// Links to missing pages carry `redlink` in the href and the `new` class.
fn first_article_link<'a>(li: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    li.select(&ARTICLE_LINK_SELECTOR).find(|a| {
        let el = a.value();
        let is_redlink = el.attr("href").is_some_and(|href| href.contains("redlink"))
            || el.classes().any(|c| c == "new");
        !is_redlink
    })
}

/// Text before the first period, or the first 100 characters.
fn fallback_title(text: &str) -> String {
    let sentence = text.split('.').next().unwrap_or_default();
    let title = if sentence.is_empty() {
        truncate_chars(text, TITLE_FALLBACK_CHARS)
    } else {
        sentence.to_string()
    };
    title.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use mockito::Matcher;
    use std::sync::atomic::{AtomicI64, Ordering};

    const SITE: &str = "https://en.wikipedia.org";
    const PAGE: &str = "Portal:Current_events/2024_March_5";

    fn portal_html() -> String {
        let long_story = "Scientists announce a record breaking discovery. ".repeat(10);
        format!(
            r#"
<div class="current-events-main vevent">
  <div class="current-events-heading">Outside content bullets</div>
  <ul><li>This bullet sits outside the content container entirely.</li></ul>
  <div class="current-events-content description">
    <p><b>Armed conflicts and attacks</b></p>
    <ul>
      <li><a href="/wiki/Russian_invasion_of_Ukraine" title="Russian invasion of Ukraine">Russian invasion of Ukraine</a>
        <ul>
          <li>Drones are shot down over <a href="/wiki/Kharkiv_Oblast">Kharkiv Oblast</a>. <a class="external text" href="https://example.com">(Reuters)</a></li>
        </ul>
      </li>
      <li><a href="/w/index.php?title=Obscure_Town&amp;action=edit&amp;redlink=1" class="new">Obscure Town</a> holds its first election in a decade. (AP)</li>
      <li>Too short (AP)</li>
    </ul>
    <p><b>Science and technology</b></p>
    <ul>
      <li><a href="/wiki/Missing_Page?redlink=1">Missing page</a> and then <a href="/wiki/Lunar_lander">a lunar lander</a> touches down near the pole.</li>
      <li>{long_story}</li>
      <li>.Leading period bullet without any article links at all</li>
    </ul>
    <ol><li>Ordered list bullets are not portal entries at all.</li></ol>
  </div>
</div>"#
        )
    }

    fn site() -> Url {
        Url::parse(SITE).unwrap()
    }

    fn settings_for(server_url: &str) -> Settings {
        Settings {
            api_url: format!("{}/w/api.php", server_url),
            site_url: SITE.to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_extracts_only_top_level_bullets() {
        let items = extract_events(&portal_html(), PAGE, &site(), "2024-03-05").unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Russian invasion of Ukraine",
                "Obscure Town holds its first election in a decade",
                "a lunar lander",
                "Scientists announce a record breaking discovery",
                ".Leading period bullet without any article links at all",
            ]
        );
        assert!(items.iter().all(|i| i.date == "2024-03-05"));
    }

    #[test]
    fn test_parent_bullet_text_includes_sub_bullets() {
        let items = extract_events(&portal_html(), PAGE, &site(), "2024-03-05").unwrap();
        assert_eq!(
            items[0].summary,
            "Russian invasion of Ukraine Drones are shot down over Kharkiv Oblast. (Reuters)"
        );
        assert_eq!(
            items[0].url,
            "https://en.wikipedia.org/wiki/Russian_invasion_of_Ukraine"
        );
    }

    #[test]
    fn test_redlinks_fall_back_to_page_url() {
        let items = extract_events(&portal_html(), PAGE, &site(), "2024-03-05").unwrap();
        assert_eq!(
            items[1].url,
            "https://en.wikipedia.org/wiki/Portal%3ACurrent_events%2F2024_March_5"
        );
        assert_eq!(items[2].url, "https://en.wikipedia.org/wiki/Lunar_lander");
    }

    #[test]
    fn test_summary_is_bounded() {
        let items = extract_events(&portal_html(), PAGE, &site(), "2024-03-05").unwrap();
        assert!(items.iter().all(|i| i.summary.chars().count() <= SUMMARY_MAX_CHARS));
        assert_eq!(items[3].summary.chars().count(), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn test_short_bullets_are_dropped() {
        let items = extract_events(&portal_html(), PAGE, &site(), "2024-03-05").unwrap();
        assert!(items.iter().all(|i| i.summary.chars().count() > MIN_ITEM_CHARS));
        assert!(!items.iter().any(|i| i.summary.contains("Too short")));

        // Exactly 20 characters is still too short; 21 is kept.
        let html = r#"<div class="current-events-content"><ul>
            <li>aaaaaaaaaaaaaaaaaaaa</li>
            <li>bbbbbbbbbbbbbbbbbbbbb</li>
        </ul></div>"#;
        let items = extract_events(html, PAGE, &site(), "2024-03-05").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].summary, "bbbbbbbbbbbbbbbbbbbbb");
    }

    #[test]
    fn test_deeply_nested_bullets_are_excluded() {
        let html = r#"<div class="current-events-content"><ul>
            <li>Topic heading bullet with a long enough label
              <ul><li>Second level bullet that is long enough
                <ul><li>Third level bullet that is long enough</li></ul>
              </li></ul>
            </li>
        </ul></div>"#;
        let items = extract_events(html, PAGE, &site(), "2024-03-05").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Topic heading bullet with a long enough label Second level bullet that is long enough Third level bullet that is long enough");
    }

    #[test]
    fn test_empty_html_yields_no_items() {
        let items = extract_events("", PAGE, &site(), "2024-03-05").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_blank_link_text_falls_back_to_first_sentence() {
        let html = r#"<div class="current-events-content"><ul>
            <li><a href="/wiki/Harbor_Bridge"> </a> Officials confirm the bridge reopening. Traffic resumes.</li>
        </ul></div>"#;
        let items = extract_events(html, PAGE, &site(), "2024-03-05").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Officials confirm the bridge reopening");
        assert_eq!(items[0].url, "https://en.wikipedia.org/wiki/Harbor_Bridge");
    }

    #[test]
    fn test_new_class_link_is_treated_as_redlink() {
        let html = r#"<div class="current-events-content"><ul>
            <li><a class="new" href="/wiki/Unwritten_Summit">Unwritten Summit</a> hosts talks on river trade routes.</li>
        </ul></div>"#;
        let items = extract_events(html, PAGE, &site(), "2024-03-05").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].title,
            "Unwritten Summit hosts talks on river trade routes"
        );
        assert_eq!(
            items[0].url,
            "https://en.wikipedia.org/wiki/Portal%3ACurrent_events%2F2024_March_5"
        );
    }

    #[test]
    fn test_fallback_title() {
        assert_eq!(fallback_title("First sentence. Second one."), "First sentence");
        assert_eq!(fallback_title(&format!(".{}", "x".repeat(150))).len(), 100);
        assert_eq!(fallback_title("No period here"), "No period here");
    }

    #[tokio::test]
    async fn test_current_events_fetches_parse_api() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({ "parse": { "title": PAGE, "text": portal_html() } });
        let mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("action".into(), "parse".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("formatversion".into(), "2".into()),
                Matcher::UrlEncoded("prop".into(), "text".into()),
                Matcher::UrlEncoded("page".into(), PAGE.into()),
                Matcher::UrlEncoded("origin".into(), "*".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = PortalClient::new(&settings_for(&server.url())).unwrap();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        let response = client
            .current_events(Some("2024-03-05"), 2, &clock)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.date.as_deref(), Some("2024-03-05"));
        assert_eq!(response.page, PAGE);
        assert_eq!(response.count, 2);
        assert_eq!(response.items.len(), 2);
    }

    /// Advances one day on every read.
    #[derive(Debug)]
    struct AdvancingClock(AtomicI64);

    impl Clock for AdvancingClock {
        fn today(&self) -> NaiveDate {
            let offset = self.0.fetch_add(1, Ordering::SeqCst);
            NaiveDate::from_ymd_opt(2025, 7, 4).unwrap() + chrono::Duration::days(offset)
        }
    }

    #[tokio::test]
    async fn test_page_and_item_dates_share_one_clock_read() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded(
                "page".into(),
                "Portal:Current_events/2025_July_4".into(),
            ))
            .with_status(200)
            .with_body(r#"{"parse": {"text": "<div class=\"current-events-content\"><ul><li>Fireworks light up the sky over the capital.</li></ul></div>"}}"#)
            .create_async()
            .await;

        let client = PortalClient::new(&settings_for(&server.url())).unwrap();
        let clock = AdvancingClock(AtomicI64::new(0));
        let response = client.current_events(None, 10, &clock).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.page, "Portal:Current_events/2025_July_4");
        assert_eq!(response.items[0].date, "2025-07-04");
    }

    #[tokio::test]
    async fn test_current_events_accepts_datetime_without_offset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded("page".into(), PAGE.into()))
            .with_status(200)
            .with_body(r#"{"parse": {"text": ""}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = PortalClient::new(&settings_for(&server.url())).unwrap();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        for raw in ["2024-03-05T10:00:00", "2024-03-05T10:00"] {
            let response = client.current_events(Some(raw), 10, &clock).await.unwrap();
            assert_eq!(response.page, PAGE);
            assert_eq!(response.date.as_deref(), Some(raw));
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_current_events_uses_clock_when_no_date() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded(
                "page".into(),
                "Portal:Current_events/2025_July_4".into(),
            ))
            .with_status(200)
            .with_body(r#"{"parse": {"text": "<div class=\"current-events-content\"><ul><li>Fireworks light up the sky over the capital.</li></ul></div>"}}"#)
            .create_async()
            .await;

        let client = PortalClient::new(&settings_for(&server.url())).unwrap();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
        let response = client.current_events(Some(""), 10, &clock).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.date, None);
        assert_eq!(response.count, 1);
        assert_eq!(response.items[0].date, "2025-07-04");
        assert_eq!(response.items[0].title, "Fireworks light up the sky over the capital");
    }

    #[tokio::test]
    async fn test_missing_parse_text_yields_no_items() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error": {"code": "missingtitle"}}"#)
            .create_async()
            .await;

        let client = PortalClient::new(&settings_for(&server.url())).unwrap();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
        let response = client.current_events(None, 10, &clock).await.unwrap();
        assert_eq!(response.count, 0);
        assert!(response.items.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failures_propagate() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = PortalClient::new(&settings_for(&server.url())).unwrap();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
        let err = client.current_events(None, 10, &clock).await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_malformed_json_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = PortalClient::new(&settings_for(&server.url())).unwrap();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
        let err = client.current_events(None, 10, &clock).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_invalid_date_is_rejected_before_fetch() {
        let client = PortalClient::new(&settings_for("http://127.0.0.1:9")).unwrap();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
        let err = client
            .current_events(Some("next tuesday"), 10, &clock)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidDate(ref d) if d == "next tuesday"));
    }
}
