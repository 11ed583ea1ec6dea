use crate::error::SourceError;
use crate::models::{Coordinate, RawListing};
use crate::sources::traits::{ListingResult, ListingSource};
use crate::sources::types::{SearchQuery, SortOrder};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A search-result row, before the detail page has been fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub id: String,
    pub url: String,
    pub title: String,
    pub price: Option<String>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub posted_at: String,
}

/// Fields only present on a listing's own page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDetail {
    pub body: String,
    pub coordinate: Option<Coordinate>,
    pub pet_text: Option<String>,
    pub posted_at: Option<String>,
}

/// Craigslist housing scraper
pub struct CraigslistSource {
    client: Client,
}

impl CraigslistSource {
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()?;

        Ok(Self { client })
    }

    pub fn search_url(query: &SearchQuery) -> String {
        format!(
            "https://{}.craigslist.org/search/{}/{}",
            query.site, query.area, query.category
        )
    }

    fn search_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("sort", query.sort.as_param().to_string())];
        if let Some(min) = query.min_price {
            params.push(("min_price", min.to_string()));
        }
        if let Some(max) = query.max_price {
            params.push(("max_price", max.to_string()));
        }
        if let Some(size) = query.min_size {
            params.push(("minSqft", size.to_string()));
        }
        if query.posted_today {
            params.push(("postedToday", "1".to_string()));
        }
        params
    }

    async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String, SourceError> {
        debug!("Fetching URL: {}", url);
        let response = self.client.get(url).query(params).send().await?;

        if !response.status().is_success() {
            warn!("Craigslist returned status: {}", response.status());
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    async fn fetch_listing(&self, row: ResultRow) -> ListingResult {
        let html = self.get_text(&row.url, &[]).await?;
        let detail = parse_detail(&html)?;
        Ok(RawListing {
            id: row.id,
            url: row.url,
            title: row.title,
            price: row.price,
            body: detail.body,
            location: row.location,
            coordinate: detail.coordinate,
            area: row.area,
            posted_at: detail.posted_at.unwrap_or(row.posted_at),
            pet_text: detail.pet_text,
        })
    }
}

#[async_trait]
impl ListingSource for CraigslistSource {
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<ListingResult>, SourceError> {
        let url = Self::search_url(query);
        let html = self.get_text(&url, &Self::search_params(query)).await?;
        debug!("Downloaded {} bytes of HTML", html.len());

        let (mut rows, failures): (Vec<_>, Vec<_>) = parse_search_results(&html)?
            .into_iter()
            .partition(|r| r.is_ok());

        // Timestamps are "YYYY-MM-DD HH:MM", so string order is time order.
        // Price orders are left as the site returned them.
        if query.sort == SortOrder::Newest {
            rows.sort_by(|a, b| match (a, b) {
                (Ok(a), Ok(b)) => b.posted_at.cmp(&a.posted_at),
                _ => std::cmp::Ordering::Equal,
            });
        }
        rows.truncate(query.limit);
        info!("Found {} result rows in {}", rows.len(), query.area);

        let mut listings = Vec::with_capacity(rows.len() + failures.len());
        for row in rows.into_iter().flatten() {
            listings.push(self.fetch_listing(row).await);
        }
        listings.extend(failures.into_iter().filter_map(Result::err).map(Err));
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "Craigslist"
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse {
        reason: format!("bad selector {css}: {e:?}"),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parse result rows out of a search page.
///
/// Handles both the classic `li.result-row` markup and the static
/// `li.cl-static-search-result` markup served to non-JS clients. A row without a
/// usable link becomes an error entry rather than aborting the page.
pub fn parse_search_results(html: &str) -> Result<Vec<Result<ResultRow, SourceError>>, SourceError> {
    let document = Html::parse_document(html);
    let row_sel = selector("li.result-row, li.cl-static-search-result")?;
    let link_sel = selector("a.result-title, a")?;
    let title_sel = selector(".result-title, .title")?;
    let price_sel = selector(".result-price, .price")?;
    let hood_sel = selector(".result-hood, .location")?;
    let housing_sel = selector(".housing")?;
    let time_sel = selector("time")?;

    let rows = document
        .select(&row_sel)
        .enumerate()
        .map(|(idx, row)| -> Result<ResultRow, SourceError> {
            let url = row
                .select(&link_sel)
                .find_map(|a| a.value().attr("href"))
                .map(str::to_string)
                .ok_or_else(|| SourceError::Parse {
                    reason: format!("result row {idx} has no link"),
                })?;

            let id = row
                .value()
                .attr("data-pid")
                .map(str::to_string)
                .or_else(|| id_from_url(&url))
                .ok_or_else(|| SourceError::Parse {
                    reason: format!("no posting id in {url}"),
                })?;

            let title = row
                .select(&title_sel)
                .next()
                .map(text_of)
                .or_else(|| row.value().attr("title").map(str::to_string))
                .unwrap_or_default();

            let price = row.select(&price_sel).next().map(text_of);

            let location = row
                .select(&hood_sel)
                .next()
                .map(|el| clean_hood(&text_of(el)))
                .filter(|s| !s.is_empty());

            let area = row
                .select(&housing_sel)
                .next()
                .and_then(|el| size_token(&text_of(el)));

            let posted_at = row
                .select(&time_sel)
                .next()
                .and_then(|t| t.value().attr("datetime"))
                .unwrap_or_default()
                .to_string();

            Ok(ResultRow {
                id,
                url,
                title,
                price,
                location,
                area,
                posted_at,
            })
        })
        .collect();

    Ok(rows)
}

/// Parse the body, map pin and attribute labels from a listing page.
pub fn parse_detail(html: &str) -> Result<ListingDetail, SourceError> {
    let document = Html::parse_document(html);
    let body_sel = selector("#postingbody")?;
    let map_sel = selector("#map")?;
    let attr_sel = selector(".attrgroup span")?;
    let time_sel = selector("time.date, time.timeago")?;

    let body = document
        .select(&body_sel)
        .next()
        .map(text_of)
        .unwrap_or_default()
        .replace("QR Code Link to This Post", "")
        .trim()
        .to_string();

    let coordinate = document.select(&map_sel).next().and_then(|map| {
        let lat = map.value().attr("data-latitude")?.parse::<f64>().ok()?;
        let lon = map.value().attr("data-longitude")?.parse::<f64>().ok()?;
        Some(Coordinate::new(lat, lon))
    });

    let attributes: Vec<String> = document
        .select(&attr_sel)
        .map(text_of)
        .filter(|s| !s.is_empty())
        .collect();
    let pet_text = if attributes.is_empty() {
        None
    } else {
        Some(attributes.join("; "))
    };

    let posted_at = document
        .select(&time_sel)
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .map(str::to_string);

    Ok(ListingDetail {
        body,
        coordinate,
        pet_text,
        posted_at,
    })
}

/// ".../d/sunnyvale-nice-2br/7712345678.html" -> "7712345678"
fn id_from_url(url: &str) -> Option<String> {
    let last = url.trim_end_matches('/').rsplit('/').next()?;
    let id = last.trim_end_matches(".html");
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

fn clean_hood(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim()
        .to_string()
}

/// "2br - 750ft2 -" -> "750ft2"
fn size_token(housing: &str) -> Option<String> {
    housing
        .split(|c: char| c.is_whitespace() || c == '-' || c == '/')
        .find(|tok| tok.ends_with("ft2") && tok.len() > 3)
        .map(str::to_string)
}
