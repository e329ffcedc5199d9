use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{AnalystError, ArchiveError, Result};
use crate::models::{
    Dataset, HeaderRecord, ItemRecord, JoinedRecord, HEADER_COLUMNS, ITEM_COLUMNS,
};

pub const HEADER_MEMBER: &str = "202401_NFs_Cabecalho.csv";
pub const ITEMS_MEMBER: &str = "202401_NFs_Itens.csv";

/// Receives load progress as a percentage. Purely advisory.
pub trait Progress {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> Progress for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// No-op observer for callers that do not display progress.
#[cfg(test)]
pub struct Silent;

#[cfg(test)]
impl Progress for Silent {
    fn report(&mut self, _percent: u8) {}
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn require_member<R: Read + std::io::Seek>(zip: &zip::ZipArchive<R>, name: &str) -> Result<()> {
    if zip.file_names().any(|n| n == name) {
        Ok(())
    } else {
        Err(ArchiveError::MissingMember(name.to_string()).into())
    }
}

fn read_member<R: Read + std::io::Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut file = zip.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => ArchiveError::MissingMember(name.to_string()),
        other => ArchiveError::Corrupt(other),
    })?;
    let mut buf = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut buf).map_err(|e| ArchiveError::Corrupt(e.into()))?;
    Ok(buf)
}

/// Parse a CSV member into typed records. The header row is checked against
/// `required` so a missing column names itself instead of surfacing as a
/// generic deserialize failure.
pub fn parse_csv<T: DeserializeOwned>(member: &str, data: &[u8], required: &[&str]) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b',')
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = rdr
        .headers()
        .map_err(|e| AnalystError::parse(member, e.to_string()))?
        .clone();
    if let Some(missing) = required.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(AnalystError::parse(member, format!("missing column '{missing}'")));
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<T>().enumerate() {
        let record = result
            .map_err(|e| AnalystError::parse(member, format!("data row {}: {e}", i + 1)))?;
        rows.push(record);
    }
    Ok(rows)
}

/// Left outer join of headers and items on access key. Headers keep file
/// order; each header's items follow in file order.
pub fn join(headers: &[HeaderRecord], items: &[ItemRecord]) -> Vec<JoinedRecord> {
    let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        by_key.entry(item.access_key.as_str()).or_default().push(i);
    }

    let mut joined = Vec::with_capacity(headers.len().max(items.len()));
    for (h, header) in headers.iter().enumerate() {
        match by_key.get(header.access_key.as_str()) {
            Some(matches) => joined.extend(matches.iter().map(|&i| JoinedRecord {
                header: h,
                item: Some(i),
            })),
            None => joined.push(JoinedRecord { header: h, item: None }),
        }
    }
    joined
}

// ---------------------------------------------------------------------------
// load_archive
// ---------------------------------------------------------------------------

pub fn load_archive(path: &Path, progress: &mut dyn Progress) -> Result<Dataset> {
    progress.report(0);
    info!(path = %path.display(), "loading archive");

    let data = std::fs::read(path).map_err(ArchiveError::Open)?;
    let checksum = compute_checksum(&data);
    let mut zip = zip::ZipArchive::new(Cursor::new(data)).map_err(ArchiveError::Corrupt)?;
    require_member(&zip, HEADER_MEMBER)?;
    require_member(&zip, ITEMS_MEMBER)?;
    progress.report(10);

    let header_data = read_member(&mut zip, HEADER_MEMBER)?;
    let headers: Vec<HeaderRecord> = parse_csv(HEADER_MEMBER, &header_data, HEADER_COLUMNS)?;
    debug!(rows = headers.len(), "parsed {HEADER_MEMBER}");
    progress.report(40);

    let item_data = read_member(&mut zip, ITEMS_MEMBER)?;
    let items: Vec<ItemRecord> = parse_csv(ITEMS_MEMBER, &item_data, ITEM_COLUMNS)?;
    debug!(rows = items.len(), "parsed {ITEMS_MEMBER}");
    progress.report(70);

    let joined = join(&headers, &items);
    progress.report(100);
    info!(
        headers = headers.len(),
        items = items.len(),
        joined = joined.len(),
        "archive loaded"
    );

    Ok(Dataset {
        source: path.to_path_buf(),
        checksum,
        headers,
        items,
        joined,
    })
}
