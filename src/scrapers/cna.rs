//! Channel NewsAsia scraper.
//!
//! Walks the paginated Singapore-politics topic listing, collects article
//! links, then fetches and extracts each article sequentially with a polite
//! pause between requests.
//!
//! Listing pages are addressed by rewriting the `page` query parameter on the
//! start URL, counting up from 0. The listing's own `rel="next"` link is
//! parsed and logged but never followed; the page counter alone bounds the
//! crawl, so a looping or malformed next link can't trap the run.
//!
//! Article extraction never fails: every field falls back through a chain of
//! selector rules and bottoms out at the empty string.

use std::error::Error;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::fetch::{FetchAsync, FetchError};
use crate::models::{ArticleRef, HarvestedArticle};

/// Site origin prepended to the root-relative hrefs the listing markup uses.
const ORIGIN: &str = "https://www.channelnewsasia.com";

/// Default topic listing, newest first, opened at page 0.
pub const DEFAULT_LISTING_URL: &str = "https://www.channelnewsasia.com/topic/singapore-politics?type%5Barticle%5D=article&sort_by=field_release_date_value&sort_order=DESC&page=0";

/* -------------------- LISTING -------------------- */

/// Pull article links out of one listing page.
///
/// An entry contributes a link only when it carries both a heading link and a
/// category tag, and the href is root-relative; anything else is dropped.
/// Also returns the listing's `rel="next"` href (origin-qualified) when one
/// is present, for logging only.
pub fn parse_listing(document: &Html) -> (Vec<ArticleRef>, Option<String>) {
    let item_sel = Selector::parse(".list-object, .list-object--video").unwrap();
    let heading_sel = Selector::parse("a.h6__link.list-object__heading-link").unwrap();
    let tag_sel = Selector::parse("p.list-object__category.category a").unwrap();

    let mut refs = Vec::new();
    for item in document.select(&item_sel) {
        let Some(link) = item.select(&heading_sel).next() else {
            continue;
        };
        let Some(tag_node) = item.select(&tag_sel).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.starts_with('/') {
            continue;
        }
        let tag = tag_node.text().collect::<Vec<_>>().join(" ").trim().to_string();
        refs.push(ArticleRef {
            url: format!("{ORIGIN}{href}"),
            tag,
        });
    }

    let next_sel = Selector::parse(r#"a[rel="next"]"#).unwrap();
    let next_page = document
        .select(&next_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .filter(|href| href.starts_with('/'))
        .map(|href| format!("{ORIGIN}{href}"));

    (refs, next_page)
}

/* -------------------- ARTICLE -------------------- */

/// Extract one article page into a record.
///
/// Field rules, first non-empty match wins (whitespace-only counts as a
/// miss):
/// - title: first `<h1>`
/// - author: `cXenseParse:author` meta, then the first `/author/` byline link
/// - created: `article:published_time` meta, then `cXenseParse:recs:publishtime`
/// - updated: `article:modified_time` meta, then `cXenseParse:recs:mdc-changedtime`
/// - content: every `p`/`h2`..`h6` inside the `div.text-long` containers, in
///   document order, joined with blank lines
pub fn parse_article(document: &Html, url: &str) -> HarvestedArticle {
    let title = text_of_first(document, "h1").unwrap_or_default();

    let author = meta_content(document, r#"meta[name="cXenseParse:author"]"#, "content")
        .or_else(|| text_of_first(document, r#"a[href^="/author/"]"#))
        .unwrap_or_default();

    let created = meta_content(document, r#"meta[property="article:published_time"]"#, "content")
        .or_else(|| meta_content(document, r#"meta[name="cXenseParse:recs:publishtime"]"#, "content"))
        .unwrap_or_default();

    let updated = meta_content(document, r#"meta[property="article:modified_time"]"#, "content")
        .or_else(|| {
            meta_content(document, r#"meta[name="cXenseParse:recs:mdc-changedtime"]"#, "content")
        })
        .unwrap_or_default();

    let container_sel = Selector::parse("div.text-long").unwrap();
    let block_sel = Selector::parse("p, h2, h3, h4, h5, h6").unwrap();
    let content = document
        .select(&container_sel)
        .flat_map(|container| container.select(&block_sel))
        .map(|block| block.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .join("\n\n");

    HarvestedArticle {
        url: url.to_string(),
        title,
        author,
        created,
        updated,
        content,
    }
}

/// Fetch one article page and run the field extractors over it.
async fn fetch_article<F: FetchAsync>(
    fetcher: &F,
    article_ref: &ArticleRef,
) -> Result<HarvestedArticle, FetchError> {
    let document = fetcher.fetch(&article_ref.url).await?;
    Ok(parse_article(&document, &article_ref.url))
}

/* -------------------- TRAVERSAL -------------------- */

/// Address listing page `page` by rewriting the `page` query parameter on the
/// start URL, leaving every other parameter in place.
fn page_url(start_url: &Url, page: u32) -> Url {
    let pairs: Vec<(String, String)> = start_url
        .query_pairs()
        .map(|(k, v)| {
            if k == "page" {
                (k.into_owned(), page.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    let mut rewritten = start_url.clone();
    rewritten.query_pairs_mut().clear().extend_pairs(pairs);
    rewritten
}

/// Harvest up to `max_pages` listing pages starting from `start_url`.
///
/// A listing page that fails to fetch aborts the run; a single article that
/// fails is logged and skipped. Sleeps for `delay` after every article
/// attempt and again after each listing page's batch.
#[instrument(level = "info", skip_all, fields(max_pages = max_pages, delay_secs = delay.as_secs_f64()))]
pub async fn harvest<F: FetchAsync>(
    fetcher: &F,
    start_url: &Url,
    max_pages: u32,
    delay: Duration,
) -> Result<Vec<HarvestedArticle>, Box<dyn Error>> {
    let mut harvested = Vec::new();

    for page in 0..max_pages {
        let listing_url = page_url(start_url, page);
        info!(url = %listing_url, page, "Fetching listing page");

        let (refs, next_page) = {
            let document = fetcher.fetch(listing_url.as_str()).await?;
            parse_listing(&document)
        };
        info!(count = refs.len(), page, "Collected article links");
        if let Some(next) = next_page {
            debug!(next = %next, "Listing advertises a next page");
        }

        let page_articles: Vec<HarvestedArticle> = stream::iter(refs)
            .then(|article_ref| async move {
                let result = fetch_article(fetcher, &article_ref).await;
                tokio::time::sleep(delay).await;
                (article_ref, result)
            })
            .filter_map(|(article_ref, result)| async move {
                match result {
                    Ok(article) => {
                        debug!(url = %article_ref.url, tag = %article_ref.tag, "Harvested article");
                        Some(article)
                    }
                    Err(e) => {
                        error!(error = %e, url = %article_ref.url, "Failed to fetch article, skipping");
                        None
                    }
                }
            })
            .collect()
            .await;
        harvested.extend(page_articles);

        tokio::time::sleep(delay).await;
    }

    info!(count = harvested.len(), "Harvest complete");
    Ok(harvested)
}

/* -------------------- EXTRACTION HELPERS -------------------- */

/// Trimmed text of the first element matching `css`, with empty as a miss.
fn text_of_first(document: &Html, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    let node = document.select(&sel).next()?;
    let text = node.text().collect::<Vec<_>>().join(" ").trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Trimmed attribute value of the first element matching `css`, with empty
/// as a miss.
fn meta_content(document: &Html, css: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    let node = document.select(&sel).next()?;
    let value = node.value().attr(attr)?.trim().to_string();
    (!value.is_empty()).then_some(value)
}
