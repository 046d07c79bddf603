//! CSV input tables and result export.
//!
//! Every loader resolves its column mapping against the header row once and
//! then reads rows by index. Tables without usable rows are rejected before
//! any processing starts.

use std::io::{Read, Write};
use std::path::Path;

use anchorsmith_core::schema::{LinkColumns, OpportunityColumns, ReferenceColumns};
use anchorsmith_core::{Error, LinkRow, Opportunity, ReferenceLink, Result, DEFAULT_LANGUAGE};
use csv::StringRecord;
use serde::Serialize;
use tracing::{debug, info};

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn csv_error(e: csv::Error) -> Error {
    Error::Input(format!("malformed CSV: {}", e))
}

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path)
        .map_err(|e| Error::Config(format!("cannot open {}: {}", path.display(), e)))
}

fn header_names<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<String>> {
    let headers = rdr.headers().map_err(csv_error)?;
    if headers.is_empty() {
        return Err(Error::Input("table has no header row".into()));
    }
    Ok(headers.iter().map(|h| h.to_string()).collect())
}

fn field(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").trim().to_string()
}

/// Column names of a CSV table.
pub fn read_headers<R: Read>(input: R) -> Result<Vec<String>> {
    header_names(&mut reader(input))
}

/// Read reference links. Rows with a blank topic or URL are dropped.
pub fn read_references<R: Read>(
    input: R,
    columns: &ReferenceColumns,
) -> Result<Vec<ReferenceLink>> {
    let mut rdr = reader(input);
    let cols = columns.resolve(&header_names(&mut rdr)?)?;

    let mut links = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.records() {
        let record = record.map_err(csv_error)?;
        let language = cols
            .language
            .map(|idx| field(&record, idx))
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let link = ReferenceLink {
            topic: field(&record, cols.topic),
            url: field(&record, cols.url),
            language,
        };
        if link.is_valid() {
            links.push(link);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        debug!("Skipped {} reference rows with missing topic or URL", skipped);
    }
    if links.is_empty() {
        return Err(Error::Input(
            "reference table has no rows with both topic and URL".into(),
        ));
    }
    info!("Loaded {} reference links", links.len());
    Ok(links)
}

pub fn load_references(path: &Path, columns: &ReferenceColumns) -> Result<Vec<ReferenceLink>> {
    read_references(open(path)?, columns)
}

/// Read opportunity rows. Rows with neither URL nor anchor are dropped.
pub fn read_opportunities<R: Read>(
    input: R,
    columns: &OpportunityColumns,
) -> Result<Vec<Opportunity>> {
    let mut rdr = reader(input);
    let cols = columns.resolve(&header_names(&mut rdr)?)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_error)?;
        let opportunity = Opportunity {
            source_url: field(&record, cols.source_url),
            original_anchor: field(&record, cols.anchor),
            raw_text: cols.text.map(|idx| field(&record, idx)).unwrap_or_default(),
        };
        if opportunity.source_url.is_empty() && opportunity.original_anchor.is_empty() {
            continue;
        }
        rows.push(opportunity);
    }

    if rows.is_empty() {
        return Err(Error::Input("opportunity table has no rows".into()));
    }
    info!("Loaded {} opportunities", rows.len());
    Ok(rows)
}

pub fn load_opportunities(path: &Path, columns: &OpportunityColumns) -> Result<Vec<Opportunity>> {
    read_opportunities(open(path)?, columns)
}

/// Read a live-link table for topic search.
pub fn read_link_rows<R: Read>(input: R, columns: &LinkColumns) -> Result<Vec<LinkRow>> {
    let mut rdr = reader(input);
    let cols = columns.resolve(&header_names(&mut rdr)?)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_error)?;
        rows.push(LinkRow {
            topic: field(&record, cols.topic),
            url: field(&record, cols.url),
            anchor: field(&record, cols.anchor),
        });
    }
    if rows.is_empty() {
        return Err(Error::Input("link table has no rows".into()));
    }
    Ok(rows)
}

pub fn load_link_rows(path: &Path, columns: &LinkColumns) -> Result<Vec<LinkRow>> {
    read_link_rows(open(path)?, columns)
}

/// Write serializable records as CSV with a header row.
pub fn write_records<W: Write, T: Serialize>(output: W, records: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(output);
    for record in records {
        wtr.serialize(record)
            .map_err(|e| Error::Internal(format!("CSV write failed: {}", e)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render records as a CSV string.
pub fn records_to_csv<T: Serialize>(records: &[T]) -> Result<String> {
    let mut buf = Vec::new();
    write_records(&mut buf, records)?;
    String::from_utf8(buf).map_err(|e| Error::Internal(e.to_string()))
}
