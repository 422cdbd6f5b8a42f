//! One-shot scraper producing the catalog CSV the API consumes.
//!
//! Walks the paginated product-catalog listing, then visits each product page
//! for its description and completion time. Output columns are the contract
//! shared with `recommender_api::catalog::AssessmentRecord`.
//!
//! Run: `cargo run --bin scrape-catalog [output.csv]`

use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use recommender_api::catalog::AssessmentRecord;

const CATALOG_BASE: &str = "https://www.shl.com/solutions/products/product-catalog/";
const SITE_ROOT: &str = "https://www.shl.com";
const PAGE_SIZE: usize = 12;
const PAGE_COUNT: usize = 12;
/// Pause between product-page fetches, to stay polite.
const FETCH_PAUSE: Duration = Duration::from_millis(500);

/// Maps a catalog type-key letter to its skill label.
fn skill_label(key: char) -> Option<&'static str> {
    Some(match key {
        'A' => "Ability & Aptitude",
        'B' => "Biodata and Situational Judgement",
        'C' => "Competencies",
        'D' => "Development & 360",
        'E' => "Assessment Exercises",
        'K' => "Knowledge and Skills",
        'P' => "Personality and Behaviour",
        'S' => "Simulations",
        _ => return None,
    })
}

struct Selectors {
    row: Selector,
    title_link: Selector,
    general_cell: Selector,
    yes_marker: Selector,
    type_key: Selector,
    description_paragraph: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            row: Selector::parse("tr[data-course-id]").expect("row selector"),
            title_link: Selector::parse("td.custom__table-heading__title a")
                .expect("title selector"),
            general_cell: Selector::parse("td.custom__table-heading__general")
                .expect("general cell selector"),
            yes_marker: Selector::parse(r#"span.catalogue__circle[class~="-yes"]"#)
                .expect("yes marker selector"),
            type_key: Selector::parse("td.product-catalogue__keys span.product-catalogue__key")
                .expect("type key selector"),
            description_paragraph: Selector::parse(
                "div.product-catalogue-training-calendar__row.typ p",
            )
            .expect("description selector"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ListingRow {
    name: String,
    url: String,
    remote_testing: String,
    adaptive_support: String,
    type_string: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "assessments_catalog.csv".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let selectors = Selectors::new();

    let mut records = Vec::new();
    for page in 0..PAGE_COUNT {
        let url = format!("{CATALOG_BASE}?start={}&type=2&type=2", page * PAGE_SIZE);
        info!("fetching listing page {url}");
        let body = client
            .get(&url)
            .send()
            .await?
            .text()
            .await
            .with_context(|| format!("reading listing page {url}"))?;

        for row in parse_listing(&body, &selectors) {
            let (description, duration) =
                match fetch_product_details(&client, &selectors, &row.url).await {
                    Ok(details) => details,
                    Err(e) => {
                        warn!("product page {} failed: {e}", row.url);
                        ("Error fetching description".to_string(), String::new())
                    }
                };

            let skills = row
                .type_string
                .chars()
                .filter_map(skill_label)
                .collect::<Vec<_>>()
                .join(", ");

            records.push(AssessmentRecord {
                name: row.name,
                url: row.url,
                remote_testing: row.remote_testing,
                adaptive_support: row.adaptive_support,
                assessment_type: row.type_string,
                skills,
                description,
                duration,
            });
            tokio::time::sleep(FETCH_PAUSE).await;
        }
    }

    let mut writer =
        csv::Writer::from_path(&output).with_context(|| format!("creating {output}"))?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("{} assessments written to {output}", records.len());
    Ok(())
}

fn parse_listing(body: &str, selectors: &Selectors) -> Vec<ListingRow> {
    let document = Html::parse_document(body);
    let mut rows = Vec::new();

    for row in document.select(&selectors.row) {
        let (name, url) = match row.select(&selectors.title_link).next() {
            Some(link) => {
                let name = link.text().collect::<String>().trim().to_string();
                let href = link.value().attr("href").unwrap_or("#");
                let url = if href.starts_with("http") {
                    href.to_string()
                } else {
                    format!("{SITE_ROOT}{href}")
                };
                (if name.is_empty() { "N/A".to_string() } else { name }, url)
            }
            None => ("N/A".to_string(), "#".to_string()),
        };

        let mut general = row.select(&selectors.general_cell);
        let remote_testing = yes_no(general.next(), &selectors.yes_marker);
        let adaptive_support = yes_no(general.next(), &selectors.yes_marker);

        let type_string = row
            .select(&selectors.type_key)
            .flat_map(|key| key.text())
            .collect::<String>()
            .trim()
            .to_uppercase();

        rows.push(ListingRow {
            name,
            url,
            remote_testing,
            adaptive_support,
            type_string,
        });
    }
    rows
}

fn yes_no(cell: Option<ElementRef<'_>>, yes_marker: &Selector) -> String {
    match cell {
        Some(cell) if cell.select(yes_marker).next().is_some() => "Yes",
        _ => "No",
    }
    .to_string()
}

async fn fetch_product_details(
    client: &reqwest::Client,
    selectors: &Selectors,
    url: &str,
) -> Result<(String, String)> {
    let body = client.get(url).send().await?.text().await?;
    Ok(parse_product(&body, selectors))
}

fn parse_product(body: &str, selectors: &Selectors) -> (String, String) {
    let document = Html::parse_document(body);
    match document.select(&selectors.description_paragraph).next() {
        Some(paragraph) => {
            let description = paragraph.text().collect::<String>().trim().to_string();
            let duration = parse_duration(&description).unwrap_or_default();
            (description, duration)
        }
        None => (String::new(), String::new()),
    }
}

/// Pulls N out of "Approximate Completion Time in minutes = N".
fn parse_duration(text: &str) -> Option<String> {
    let marker = "Approximate Completion Time in minutes";
    let rest = &text[text.find(marker)? + marker.len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}
