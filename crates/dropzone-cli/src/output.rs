//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use dropzone_catalog::{
    BookmarksProjection, DashboardProjection, DetailProjection, DropCard, Freshness,
};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Render `value` as pretty JSON or with the given table renderer.
pub(crate) fn render<T: Serialize>(
    value: &T,
    format: OutputFormat,
    table: impl FnOnce(&T) -> String,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}"))),
        OutputFormat::Table => Ok(table(value)),
    }
}

pub(crate) fn dashboard_table(projection: &DashboardProjection) -> String {
    let mut lines = Vec::new();
    push_freshness(&mut lines, projection.freshness);

    lines.push(format!("Released ({})", projection.released.len()));
    push_cards(&mut lines, &projection.released, "No drops released yet.");

    lines.push(String::new());
    lines.push(format!(
        "Bookmarks (showing {} of {})",
        projection.bookmark_preview.len(),
        projection.bookmark_count
    ));
    push_cards(
        &mut lines,
        &projection.bookmark_preview,
        "No bookmarks yet.",
    );

    lines.push(String::new());
    lines.push(format!("Upcoming ({})", projection.upcoming.len()));
    if projection.upcoming.is_empty() {
        lines.push("  No upcoming drops.".into());
    }
    for card in &projection.upcoming {
        lines.push(format!(
            "  {:<8} {:<40} releases {}",
            card.id,
            truncate(&card.title, 40),
            format_time(card.release_time)
        ));
    }
    lines.join("\n")
}

pub(crate) fn bookmarks_table(projection: &BookmarksProjection) -> String {
    let mut lines = Vec::new();
    push_freshness(&mut lines, projection.freshness);
    lines.push(format!("Bookmarks ({})", projection.bookmarks.len()));
    push_cards(&mut lines, &projection.bookmarks, "No bookmarks yet.");
    lines.join("\n")
}

pub(crate) fn detail_table(projection: &DetailProjection) -> String {
    let mut lines = Vec::new();
    push_freshness(&mut lines, projection.freshness);
    let Some(card) = &projection.card else {
        lines.push("Drop not loaded.".into());
        return lines.join("\n");
    };
    lines.push(format!("id: {}", card.id));
    lines.push(format!("title: {}", card.title));
    lines.push(format!("type: {} {}", card.icon, card.label));
    lines.push(format!("access: {}", card.entitlement));
    lines.push(format!(
        "release: {} ({})",
        format_time(card.release_time),
        release_label(card)
    ));
    lines.push(format!("bookmarked: {}", yes_no(card.bookmarked)));
    if let Some(description) = &card.description {
        lines.push(format!("description: {description}"));
    }
    if let Some(link) = &card.link {
        lines.push(format!("link: {link}"));
    }
    lines.push(format!("actions: {}", actions(card)));
    if card.downloading {
        lines.push("download in progress".into());
    }
    lines.join("\n")
}

fn push_cards(lines: &mut Vec<String>, cards: &[DropCard], empty: &str) {
    if cards.is_empty() {
        lines.push(format!("  {empty}"));
        return;
    }
    for card in cards {
        lines.push(format!(
            "  {:<8} {} {:<40} {:<18} {:<8} {}",
            card.id,
            card.icon,
            truncate(&card.title, 40),
            card.label,
            card.entitlement,
            if card.bookmarked { "★" } else { "☆" }
        ));
    }
}

fn push_freshness(lines: &mut Vec<String>, freshness: Freshness) {
    if let Freshness::Stale { collection, .. } = freshness {
        lines.push(format!(
            "warning: showing stale data (failed to load {collection} drops)"
        ));
    }
}

fn release_label(card: &DropCard) -> &'static str {
    match card.release {
        dropzone_core::Release::Released => "released",
        dropzone_core::Release::Upcoming => "upcoming",
    }
}

fn actions(card: &DropCard) -> String {
    let mut permitted = Vec::new();
    if card.can_download {
        permitted.push("download");
    }
    if card.can_open {
        permitted.push("open");
    }
    if permitted.is_empty() {
        "none".into()
    } else {
        permitted.join(", ")
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[must_use]
pub(crate) fn format_time(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[must_use]
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    let value = bytes_to_f64(bytes);
    if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}

fn bytes_to_f64(value: u64) -> f64 {
    let high = u32::try_from(value >> 32).unwrap_or(u32::MAX);
    let low = u32::try_from(value & 0xFFFF_FFFF).unwrap_or(u32::MAX);
    f64::from(high) * 4_294_967_296.0 + f64::from(low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dropzone_core::{DropId, Release};

    fn card(id: &str, title: &str) -> DropCard {
        DropCard {
            id: DropId::from(id),
            title: title.into(),
            description: Some("Handy notes".into()),
            icon: "📋",
            label: "Cheat Sheet",
            entitlement: "Free",
            release_time: Utc
                .with_ymd_and_hms(2025, 5, 1, 9, 30, 0)
                .single()
                .expect("valid time"),
            release: Release::Released,
            bookmarked: true,
            can_download: true,
            can_open: false,
            link: None,
            downloading: false,
        }
    }

    #[test]
    fn format_bytes_displays_expected_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GiB");
    }

    #[test]
    fn dashboard_table_lists_sections_and_counts() {
        let projection = DashboardProjection {
            released: vec![card("1", "Rust cheats")],
            bookmark_preview: vec![card("1", "Rust cheats")],
            bookmark_count: 6,
            upcoming: Vec::new(),
            freshness: Freshness::Empty,
        };
        let table = dashboard_table(&projection);
        assert!(table.contains("Released (1)"));
        assert!(table.contains("Bookmarks (showing 1 of 6)"));
        assert!(table.contains("No upcoming drops."));
        assert!(table.contains("★"));
    }

    #[test]
    fn stale_views_carry_a_warning() {
        let projection = BookmarksProjection {
            bookmarks: Vec::new(),
            freshness: Freshness::Stale {
                fetched_at: None,
                collection: dropzone_core::Collection::Bookmarked,
            },
        };
        let table = bookmarks_table(&projection);
        assert!(table.starts_with("warning: showing stale data (failed to load bookmarked drops)"));
    }

    #[test]
    fn detail_table_lists_actions() {
        let projection = DetailProjection {
            card: Some(card("5", "Rust cheats")),
            freshness: Freshness::Empty,
        };
        let table = detail_table(&projection);
        assert!(table.contains("type: 📋 Cheat Sheet"));
        assert!(table.contains("release: 2025-05-01 09:30 UTC (released)"));
        assert!(table.contains("actions: download"));
    }

    #[test]
    fn long_titles_are_truncated() {
        let title = "x".repeat(50);
        assert_eq!(truncate(&title, 10).chars().count(), 10);
        assert_eq!(truncate("short", 10), "short");
    }
}
