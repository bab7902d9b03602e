use creatorgraph_common::{CreatorGraphError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{Record, SubscriberCount};

/// JSON object as found in scraped data; every field optional so that
/// validation can name the offending row instead of failing in serde.
///
/// Scraper generations disagree on key names, so each legacy key is read
/// separately; when both spellings are present the canonical one wins.
#[derive(Debug, Deserialize)]
struct RawJsonRecord {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    rich_text: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    external_link: Option<String>,
    #[serde(default)]
    youtube_url: Option<String>,
    #[serde(default)]
    subscribers: Option<SubscriberCount>,
    #[serde(default)]
    subscriber_count: Option<SubscriberCount>,
}

/// First value that is present and not blank
fn prefer(canonical: Option<String>, legacy: Option<String>) -> Option<String> {
    canonical
        .filter(|v| !v.trim().is_empty())
        .or(legacy)
}

/// CSV row: `id,title,description,thumbnail,youtube_url[,subscribers]`
#[derive(Debug, Deserialize)]
struct RawCsvRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    youtube_url: String,
    #[serde(default)]
    subscribers: String,
}

/// Load records, picking the format from the file extension
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => load_records_json(path),
        Some("csv") => load_records_csv(path),
        _ => Err(CreatorGraphError::load(format!(
            "Unsupported input format (expected .json or .csv): {}",
            path.display()
        ))),
    }
}

/// Load a JSON array of record objects
pub fn load_records_json(path: &Path) -> Result<Vec<Record>> {
    let data = read_input(path)?;
    let records = parse_records_json(&data)
        .map_err(|e| CreatorGraphError::load(format!("{}: {}", path.display(), e)))?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse and validate a JSON array of record objects
pub fn parse_records_json(data: &str) -> Result<Vec<Record>> {
    let raw: Vec<RawJsonRecord> = serde_json::from_str(data)
        .map_err(|e| CreatorGraphError::load(format!("Malformed JSON input: {}", e)))?;

    let records = raw
        .into_iter()
        .enumerate()
        .map(|(row, r)| {
            let id = match r.id {
                Some(serde_json::Value::String(s)) => s,
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            validate(
                row,
                Record {
                    id,
                    title: r.title.unwrap_or_default(),
                    description: prefer(r.description, r.text).unwrap_or_default(),
                    rich_text: r.rich_text,
                    thumbnail: r.thumbnail,
                    external_link: prefer(r.external_link, r.youtube_url),
                    subscribers: match (r.subscribers, r.subscriber_count) {
                        (Some(SubscriberCount::Count(n)), _) => SubscriberCount::Count(n),
                        (first, second) => second.or(first).unwrap_or_default(),
                    },
                },
            )
        })
        .collect::<Result<Vec<_>>>()?;

    reject_duplicates(&records)?;
    Ok(records)
}

/// Load CSV rows; optional columns default to empty
pub fn load_records_csv(path: &Path) -> Result<Vec<Record>> {
    let data = read_input(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CreatorGraphError::load(format!("{}: {}", path.display(), e)))?
        .clone();
    for required in ["id", "title"] {
        if !headers.iter().any(|h| h == required) {
            return Err(CreatorGraphError::load(format!(
                "{}: missing required column '{}'",
                path.display(),
                required
            )));
        }
    }

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<RawCsvRecord>().enumerate() {
        let raw = result.map_err(|e| {
            CreatorGraphError::load(format!("{}: row {}: {}", path.display(), row, e))
        })?;
        records.push(validate(
            row,
            Record {
                id: raw.id,
                title: raw.title,
                description: raw.description,
                rich_text: None,
                thumbnail: non_empty(raw.thumbnail),
                external_link: non_empty(raw.youtube_url),
                subscribers: SubscriberCount::parse(&raw.subscribers),
            },
        )?);
    }

    reject_duplicates(&records)?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        CreatorGraphError::load(format!("Failed to read {}: {}", path.display(), e))
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Required fields: id, title, and a text source
fn validate(row: usize, mut record: Record) -> Result<Record> {
    record.id = record.id.trim().to_string();
    record.title = record.title.trim().to_string();

    if record.id.is_empty() {
        return Err(CreatorGraphError::load(format!(
            "Row {}: missing required field 'id'",
            row
        )));
    }
    if record.title.is_empty() {
        return Err(CreatorGraphError::load(format!(
            "Row {} (id '{}'): missing required field 'title'",
            row, record.id
        )));
    }

    let has_rich_text = record
        .rich_text
        .as_deref()
        .map(|t| !t.trim().is_empty())
        .unwrap_or(false);
    if record.description.trim().is_empty() && !has_rich_text {
        return Err(CreatorGraphError::load(format!(
            "Row {} (id '{}'): missing text ('description' or 'rich_text')",
            row, record.id
        )));
    }

    record.thumbnail = record.thumbnail.and_then(non_empty);
    record.external_link = record.external_link.and_then(non_empty);

    debug!("Validated record {} ({})", record.id, record.title);
    Ok(record)
}

fn reject_duplicates(records: &[Record]) -> Result<()> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        if let Some(first) = seen.insert(record.id.as_str(), row) {
            return Err(CreatorGraphError::load(format!(
                "Duplicate id '{}' at rows {} and {}",
                record.id, first, row
            )));
        }
    }
    Ok(())
}
