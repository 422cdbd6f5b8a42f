//! Query sources — turning a job-posting URL into query text.

use std::time::Duration;

use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Network budget for fetching a job posting. The model call carries no
/// timeout; this path does.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches `url` and returns its visible text. Failures come back as
/// human-readable strings rather than errors: whatever this returns is fed
/// to the recommendation engine as query text.
pub async fn extract_text_from_url(client: &reqwest::Client, url: &str) -> String {
    let response = match client.get(url).timeout(FETCH_TIMEOUT).send().await {
        Ok(response) => response,
        Err(e) => return format!("Error processing URL: {e}"),
    };
    let status = response.status();
    if !status.is_success() {
        return format!("Failed to retrieve content from URL: {}", status.as_u16());
    }
    match response.text().await {
        Ok(body) => visible_text(&body),
        Err(e) => format!("Error processing URL: {e}"),
    }
}

/// Extracts human-visible text from an HTML document: drops `<script>` and
/// `<style>` subtrees, trims every line, treats a double space as a phrase
/// boundary, and joins the non-empty chunks with newlines.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.tree.root(), &mut raw);

    raw.lines()
        .flat_map(|line| line.trim().split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Element(element) if matches!(element.name(), "script" | "style") => {}
            Node::Text(text) => out.push_str(&text.text),
            _ => collect_text(child, out),
        }
    }
}
