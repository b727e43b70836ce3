//! Markdown rendering of a [`Dashboard`].
//!
//! One section per feed: headline metrics, the top words, the category
//! distribution when the feed has one, and the items themselves. Feeds that
//! produced nothing say so explicitly instead of rendering empty tables.

use crate::models::{NormalizedItem, NOT_AVAILABLE};
use crate::report::{Count, Dashboard, FeedReport, FeedStatus};
use crate::utils::snapshot_stamp;
use std::error::Error;
use std::fmt::Write as _;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Escape a value for use inside a Markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

fn link_cell(link: &str) -> String {
    if link.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        format!("<{link}>")
    }
}

fn counts_table(md: &mut String, heading: &str, column: &str, counts: &[Count]) {
    let _ = writeln!(md, "### {heading}\n");
    let _ = writeln!(md, "| {column} | Count |");
    md.push_str("|---|---:|\n");
    for c in counts {
        let _ = writeln!(md, "| {} | {} |", cell(&c.value), c.count);
    }
    md.push('\n');
}

fn items_table(md: &mut String, report: &FeedReport) {
    let items = &report.result.items;
    let with_category = items
        .iter()
        .any(|item| matches!(item, NormalizedItem::Popular(_)));
    let text_column = match items.first() {
        Some(NormalizedItem::Topic(_)) => "Topic",
        _ => "Title",
    };

    md.push_str("### Items\n\n");
    if with_category {
        let _ = writeln!(md, "| # | {text_column} | Category | Link |");
        md.push_str("|---:|---|---|---|\n");
    } else {
        let _ = writeln!(md, "| # | {text_column} | Link |");
        md.push_str("|---:|---|---|\n");
    }

    for (i, item) in items.iter().enumerate() {
        let text = cell(or_na(item.text()));
        let link = link_cell(item.link());
        if with_category {
            let category = cell(or_na(item.category()));
            let _ = writeln!(md, "| {} | {text} | {category} | {link} |", i + 1);
        } else {
            let _ = writeln!(md, "| {} | {text} | {link} |", i + 1);
        }
    }
    md.push('\n');
}

fn feed_section(md: &mut String, report: &FeedReport) {
    let result = &report.result;
    let summary = &report.summary;

    let _ = writeln!(md, "## {} / {}\n", result.site_id, result.feed_id);
    let status = match summary.status {
        FeedStatus::Ok => "ok",
        FeedStatus::Empty => "empty",
        FeedStatus::Failed => "failed",
    };
    let _ = writeln!(md, "- **Status:** {status}");
    let _ = writeln!(md, "- **Items:** {}", summary.item_count);
    let _ = writeln!(
        md,
        "- **Fetched at:** {}",
        result.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if result.diagnostics.records_dropped > 0 {
        let _ = writeln!(md, "- **Dropped records:** {}", result.diagnostics.records_dropped);
    }
    if result.diagnostics.fields_missing > 0 {
        let _ = writeln!(md, "- **Missing fields:** {}", result.diagnostics.fields_missing);
    }
    md.push('\n');

    match summary.status {
        FeedStatus::Failed => {
            let reason = result.error.as_deref().unwrap_or("unknown error");
            let _ = writeln!(md, "> No data: retrieval failed ({}).\n", cell(reason));
            return;
        }
        FeedStatus::Empty => {
            match result.diagnostics.gap {
                Some(gap) => {
                    let _ = writeln!(md, "> No data: the page was fetched but {gap}.\n");
                }
                None => md.push_str("> No data: the page was fetched but listed no items.\n\n"),
            }
            return;
        }
        FeedStatus::Ok => {}
    }

    if !summary.top_words.is_empty() {
        counts_table(md, "Top words", "Word", &summary.top_words);
    }
    if !summary.categories.is_empty() {
        counts_table(md, "Categories", "Category", &summary.categories);
    }
    items_table(md, report);
}

/// Render a [`Dashboard`] as a Markdown document.
pub fn dashboard_to_markdown(dashboard: &Dashboard) -> String {
    let mut md = String::new();
    let _ = writeln!(
        md,
        "# Trending News\n\n_Generated {}_\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let failed = dashboard
        .feeds
        .iter()
        .filter(|f| f.summary.status == FeedStatus::Failed)
        .count();
    let items: usize = dashboard.feeds.iter().map(|f| f.summary.item_count).sum();
    let _ = writeln!(
        md,
        "**Feeds:** {} · **Items:** {} · **Failed:** {}\n",
        dashboard.feeds.len(),
        items,
        failed
    );

    for report in &dashboard.feeds {
        feed_section(&mut md, report);
    }
    md
}

/// Write the rendered dashboard to `{markdown_output_dir}/{date}/{HH-MM-SS}.md`.
///
/// # Errors
///
/// Returns an error if directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(markdown_output_dir = %markdown_output_dir))]
pub async fn write_markdown(
    dashboard: &Dashboard,
    markdown_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let md = dashboard_to_markdown(dashboard);

    let (date, time) = snapshot_stamp(dashboard.generated_at);
    let dir = PathBuf::from(markdown_output_dir).join(date);
    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create Markdown dir");
        return Err(e.into());
    }

    let path = dir.join(format!("{time}.md"));
    fs::write(&path, md).await?;
    info!(path = %path.display(), "Wrote Markdown report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ExtractionGap, FeedDiagnostics, FeedKey, FeedResult, PopularNewsItem, TopicItem,
    };
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 8, 0, 0).unwrap()
    }

    fn result(site: &str, feed: &str, items: Vec<NormalizedItem>) -> FeedResult {
        FeedResult {
            site_id: site.to_string(),
            feed_id: feed.to_string(),
            items,
            fetched_at: at(),
            stale: false,
            error: None,
            diagnostics: FeedDiagnostics::default(),
        }
    }

    fn render(results: Vec<FeedResult>) -> String {
        let dashboard = Dashboard::build(
            results.into_iter().map(Arc::new).collect(),
            &HashSet::new(),
            10,
            at(),
        );
        dashboard_to_markdown(&dashboard)
    }

    #[test]
    fn test_popular_feed_renders_tables() {
        let md = render(vec![result(
            "kompas",
            "popular-articles",
            vec![
                NormalizedItem::Popular(PopularNewsItem {
                    title: Some("Timnas menang | telak".to_string()),
                    category: Some("Bola".to_string()),
                    link: "https://www.kompas.com/bola/1".to_string(),
                }),
                NormalizedItem::Popular(PopularNewsItem {
                    title: None,
                    category: None,
                    link: String::new(),
                }),
            ],
        )]);

        assert!(md.contains("## kompas / popular-articles"));
        assert!(md.contains("- **Status:** ok"));
        assert!(md.contains("### Top words"));
        assert!(md.contains("| timnas | 1 |"));
        assert!(md.contains("### Categories"));
        assert!(md.contains("| Bola | 1 |"));
        assert!(md.contains("| N/A | 1 |"));
        assert!(md.contains(
            "| 1 | Timnas menang \\| telak | Bola | <https://www.kompas.com/bola/1> |"
        ));
        assert!(md.contains("| 2 | N/A | N/A | N/A |"));
    }

    #[test]
    fn test_topic_feed_uses_topic_column() {
        let md = render(vec![result(
            "tempo",
            "trending-topics",
            vec![NormalizedItem::Topic(TopicItem {
                topic: Some("#Pemilu".to_string()),
                link: "https://www.tempo.co/tag/pemilu".to_string(),
            })],
        )]);
        assert!(md.contains("| # | Topic | Link |"));
        assert!(md.contains("| 1 | #Pemilu | <https://www.tempo.co/tag/pemilu> |"));
        assert!(!md.contains("### Categories"));
    }

    #[test]
    fn test_failed_and_empty_feeds_say_so() {
        let failed = FeedResult::failed(
            &FeedKey::new("tempo", "trending-articles"),
            at(),
            "timeout: request timed out",
        );
        let mut empty = result("tempo", "trending-topics", Vec::new());
        empty.diagnostics.gap = Some(ExtractionGap::AnchorNotFound);

        let md = render(vec![failed, empty]);
        assert!(md.contains("**Feeds:** 2 · **Items:** 0 · **Failed:** 1"));
        assert!(md.contains("> No data: retrieval failed (timeout: request timed out)."));
        assert!(md.contains(&format!(
            "> No data: the page was fetched but {}.",
            ExtractionGap::AnchorNotFound
        )));
        assert!(!md.contains("### Items"));
    }

    #[tokio::test]
    async fn test_write_markdown_path() {
        let dashboard = Dashboard::build(Vec::new(), &HashSet::new(), 5, at());
        let dir = std::env::temp_dir().join(format!("trending_news_md_{}", std::process::id()));
        let path = write_markdown(&dashboard, &dir.to_string_lossy())
            .await
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(path, dir.join("2025-05-06").join("08-00-00.md"));
        assert!(content.starts_with("# Trending News"));
    }
}
