//! Bulk import of saved-places exports.
//!
//! Consumes a forward-only stream of raw export rows, turns each
//! place-shaped row into a Place plus resolved tag memberships, and
//! reports per-row outcomes. Rows are independent units: one bad row
//! never blocks the rest of the export, and a committed row is never
//! rolled back by a later failure.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::db::{self, DbPool};
use crate::models::CreatePlace;
use crate::services::TagResolver;
use crate::Result;

/// Separator between the note and comment fields when both are present.
const NOTES_SEPARATOR: &str = " | ";

/// Pattern of the place identifier embedded in map-provider URLs.
static PLACE_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn place_id_pattern() -> &'static Regex {
    PLACE_ID_PATTERN.get_or_init(|| Regex::new(r"1s0x[0-9a-f]+:0x[0-9a-f]+").unwrap())
}

/// One raw row from an export, as produced by the row-source boundary.
///
/// All fields are optional free text; the pipeline decides whether the
/// row is place-shaped at all. The CSV/HTTP parsing that produces rows
/// lives outside this crate.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub title: Option<String>,
    pub note: Option<String>,
    pub url: Option<String>,
    pub tags: Option<String>,
    pub comment: Option<String>,
}

/// A lazy, finite, forward-only source of export rows.
///
/// `next_row` returns `Ok(None)` once the source is exhausted. Any `Err`
/// is a stream-level failure: row boundaries past that point are not
/// trustworthy, so the pipeline aborts the whole import. Implementations
/// that spool the export (e.g. to a temp file) should release it on
/// drop; the pipeline owns the source and drops it on every exit path.
#[async_trait]
pub trait RowSource: Send {
    async fn next_row(&mut self) -> Result<Option<RawRow>>;
}

/// In-memory row source for tests and pre-parsed uploads.
pub struct BufferedRowSource {
    rows: std::vec::IntoIter<RawRow>,
}

impl BufferedRowSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows: rows.into_iter() }
    }
}

#[async_trait]
impl RowSource for BufferedRowSource {
    async fn next_row(&mut self) -> Result<Option<RawRow>> {
        Ok(self.rows.next())
    }
}

/// Terminal state of one processed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Place persisted and all tags linked.
    Committed,
    /// Not place-shaped (no recognizable map-provider URL); not an error.
    Skipped,
    /// Looked like a place but could not be committed.
    Failed(String),
}

/// A per-row failure, identified by the row's title or its 1-based
/// position when the title is absent.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RowError {
    pub row: String,
    pub reason: String,
}

/// Outcome summary of one import run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

/// Service for importing saved-places exports.
#[derive(Clone)]
pub struct ImportService {
    db: DbPool,
    tags: TagResolver,
}

impl ImportService {
    pub fn new(db: DbPool) -> Self {
        let tags = TagResolver::new(db.clone());
        Self { db, tags }
    }

    /// Create an import service sharing an existing resolver.
    pub fn with_resolver(db: DbPool, tags: TagResolver) -> Self {
        Self { db, tags }
    }

    /// Import an export for one user, processing rows strictly in stream
    /// order, one at a time.
    ///
    /// Row-level problems are collected into the report. Only two
    /// conditions abort the whole import with a top-level error: the row
    /// source failing mid-stream, and the record store becoming
    /// unreachable. Rows committed before an abort stay committed;
    /// cancellation (dropping the returned future) likewise leaves
    /// committed rows in place.
    pub async fn import<S: RowSource>(&self, user_id: &str, mut source: S) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        let mut index = 0usize;

        loop {
            let row = match source.next_row().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(err) => {
                    warn!(
                        "Import aborted by row source after {} committed rows: {}",
                        report.imported, err
                    );
                    return Err(err);
                }
            };
            index += 1;

            match self.process_row(user_id, &row).await {
                Ok(RowOutcome::Committed) => report.imported += 1,
                Ok(RowOutcome::Skipped) => report.skipped += 1,
                Ok(RowOutcome::Failed(reason)) => {
                    debug!("Row {} failed: {}", index, reason);
                    report.errors.push(RowError {
                        row: row_label(&row, index),
                        reason,
                    });
                }
                Err(err) => {
                    // Committed rows stay committed; only the remainder of
                    // the stream is lost.
                    warn!(
                        "Import aborted, record store unavailable after {} committed rows: {}",
                        report.imported, err
                    );
                    return Err(err);
                }
            }
        }

        info!(
            "Import finished: {} imported, {} skipped, {} failed",
            report.imported,
            report.skipped,
            report.errors.len()
        );

        Ok(report)
    }

    /// Run one row through the state machine.
    ///
    /// Returns `Err` only when the store itself is unreachable; every
    /// other problem is a terminal `RowOutcome` for this row alone.
    async fn process_row(&self, user_id: &str, row: &RawRow) -> Result<RowOutcome> {
        // Shape check: without a recognizable map-provider place URL the
        // row is not a place (exports mix in headers and other entities).
        let url = match row.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() && is_place_url(url) => url,
            _ => return Ok(RowOutcome::Skipped),
        };

        // A place-shaped row without a title cannot become a Place.
        let title = match row.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title,
            _ => return Ok(RowOutcome::Failed("missing title".to_string())),
        };

        // Coordinates are not derivable from this export format; they
        // stay at the 0.0 sentinel rather than being guessed.
        let create = CreatePlace {
            name: title.to_string(),
            address: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            external_place_id: extract_place_id(url),
            url: Some(url.to_string()),
            notes: merge_notes(row.note.as_deref(), row.comment.as_deref()),
            rating: None,
            collection_id: None,
        };

        let place = match db::create_place(&self.db, user_id, create).await {
            Ok(place) => place,
            Err(err) if err.is_unavailable() => return Err(err),
            Err(err) => {
                return Ok(RowOutcome::Failed(format!("failed to persist place: {}", err)))
            }
        };

        for name in split_tag_names(row.tags.as_deref()) {
            let tag = match self.tags.resolve(user_id, &name).await {
                Ok(tag) => tag,
                Err(err) if err.is_unavailable() => return Err(err),
                Err(err) => {
                    return Ok(RowOutcome::Failed(format!(
                        "failed to resolve tag '{}': {}",
                        name, err
                    )))
                }
            };

            match db::link_tag(&self.db, user_id, &place.id, &tag.id).await {
                Ok(()) => {}
                Err(err) if err.is_unavailable() => return Err(err),
                Err(err) => {
                    return Ok(RowOutcome::Failed(format!(
                        "failed to link tag '{}': {}",
                        name, err
                    )))
                }
            }
        }

        Ok(RowOutcome::Committed)
    }
}

/// Whether a URL points at a map-provider place page.
fn is_place_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host_matches = host == "google.com" || host.ends_with(".google.com");
    host_matches && parsed.path().starts_with("/maps/place/")
}

/// Extract the opaque place identifier embedded in a map-provider URL.
/// Absence of the pattern is normal, not an error.
fn extract_place_id(url: &str) -> Option<String> {
    place_id_pattern().find(url).map(|m| m.as_str().to_string())
}

/// Combine the export's note and comment fields into the notes value:
/// the comment is appended after a separator only when both are present.
fn merge_notes(note: Option<&str>, comment: Option<&str>) -> Option<String> {
    let note = note.map(str::trim).filter(|s| !s.is_empty());
    let comment = comment.map(str::trim).filter(|s| !s.is_empty());

    match (note, comment) {
        (Some(note), Some(comment)) => Some(format!("{}{}{}", note, NOTES_SEPARATOR, comment)),
        (Some(note), None) => Some(note.to_string()),
        (None, Some(comment)) => Some(comment.to_string()),
        (None, None) => None,
    }
}

/// Split a raw comma-separated tag list into usable names.
fn split_tag_names(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn row_label(row: &RawRow, index: usize) -> String {
    match row.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => format!("row {}", index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PLACE_URL: &str =
        "https://www.google.com/maps/place/Borough+Market/@51.5,-0.09,17z/data=!1s0x89c259a9b3117469:0x40ef0a73d21bb88f!8m2";

    #[test]
    fn test_extract_place_id_present() {
        let url = "https://www.google.com/maps/place/X/@1s0x89c259a9b3117469:0x40ef0a73d21bb88f,17z";
        assert_eq!(
            extract_place_id(url).as_deref(),
            Some("1s0x89c259a9b3117469:0x40ef0a73d21bb88f")
        );
    }

    #[test]
    fn test_extract_place_id_absent() {
        assert_eq!(extract_place_id("https://www.google.com/maps/place/X"), None);
    }

    #[rstest]
    #[case(PLACE_URL, true)]
    #[case("https://google.com/maps/place/X", true)]
    #[case("https://maps.google.com/maps/place/X", true)]
    #[case("https://www.google.com/search?q=coffee", false)]
    #[case("https://example.com/maps/place/X", false)]
    #[case("https://evil-google.com/maps/place/X", false)]
    #[case("not a url", false)]
    fn test_is_place_url(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_place_url(url), expected);
    }

    #[test]
    fn test_merge_notes() {
        assert_eq!(
            merge_notes(Some("great espresso"), Some("go early")).as_deref(),
            Some("great espresso | go early")
        );
        assert_eq!(merge_notes(Some("great espresso"), None).as_deref(), Some("great espresso"));
        assert_eq!(merge_notes(None, Some("go early")).as_deref(), Some("go early"));
        assert_eq!(merge_notes(Some("  "), None), None);
        assert_eq!(merge_notes(None, None), None);
    }

    #[test]
    fn test_split_tag_names() {
        assert_eq!(split_tag_names(Some("Coffee, Brunch , ,Park")), vec!["Coffee", "Brunch", "Park"]);
        assert!(split_tag_names(Some("  ,  ")).is_empty());
        assert!(split_tag_names(None).is_empty());
    }

    #[test]
    fn test_row_label_falls_back_to_position() {
        let row = RawRow { title: Some("Cafe".to_string()), ..Default::default() };
        assert_eq!(row_label(&row, 3), "Cafe");

        let untitled = RawRow::default();
        assert_eq!(row_label(&untitled, 3), "row 3");
    }
}
