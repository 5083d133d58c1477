use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::episode::{Catalog, RawRecord, convert_records};

/// The two ways a load attempt can fail. Both are terminal for the attempt.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to fetch {source_name}: {reason}")]
  Fetch { source_name: String, reason: String },
  #[error("failed to parse {source_name}: {reason}")]
  Parse { source_name: String, reason: String },
}

fn is_url(source: &str) -> bool {
  source.starts_with("http://") || source.starts_with("https://")
}

/// Fetch the raw CSV text from a URL or a filesystem path.
pub async fn fetch_text(client: &Client, source: &str) -> Result<String, LoadError> {
  let fetch_err = |reason: String| LoadError::Fetch { source_name: source.to_string(), reason };

  if is_url(source) {
    let response = client.get(source).send().await.map_err(|e| fetch_err(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
      return Err(fetch_err(format!("HTTP {}", status)));
    }
    let bytes = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
    String::from_utf8(bytes.to_vec())
      .map_err(|e| LoadError::Parse { source_name: source.to_string(), reason: e.to_string() })
  } else {
    let bytes = tokio::fs::read(source).await.map_err(|e| fetch_err(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| LoadError::Parse { source_name: source.to_string(), reason: e.to_string() })
  }
}

/// Parse CSV text using the first row as field names. Empty lines are skipped
/// by the reader; a row of empty fields is kept. Short rows simply lack the
/// missing columns.
pub fn parse_csv(source: &str, text: &str) -> Result<Vec<RawRecord>, LoadError> {
  let parse_err = |e: csv::Error| LoadError::Parse { source_name: source.to_string(), reason: e.to_string() };

  let mut reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(text.as_bytes());
  let headers = reader.headers().map_err(parse_err)?.clone();

  let mut records = Vec::new();
  for result in reader.records() {
    let row = result.map_err(parse_err)?;
    let record: RawRecord = headers.iter().zip(row.iter()).map(|(h, v)| (h.to_string(), v.to_string())).collect();
    records.push(record);
  }
  debug!(rows = records.len(), columns = headers.len(), "loader: parsed csv");
  Ok(records)
}

/// Fetch, parse and convert the catalogue in one go.
pub async fn load_catalog(client: &Client, source: &str) -> Result<Catalog, LoadError> {
  info!(source = %source, "loader: fetching episodes");
  let text = fetch_text(client, source).await?;
  let raw = parse_csv(source, &text)?;
  let catalog = convert_records(&raw);
  info!(episodes = catalog.episodes.len(), issues = catalog.issues.len(), "loader: catalogue ready");
  Ok(catalog)
}
