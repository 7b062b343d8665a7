// 🗄️ Record Store - Flat-file persistence for every lot collection
//
// One file per collection, one record per line, fields separated by `|`.
// Loading is forgiving: a missing file is an empty collection, a declared
// count larger than the file stops early, a field that fails to parse keeps
// its default. Saving always rewrites the whole collection (temp file +
// rename), so the file on disk is exactly the in-memory state.

use crate::error::{LotError, LotResult};
use csv::{ByteRecord, QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

pub const DELIMITER: u8 = b'|';

/// Subdirectories created under the data directory on bootstrap.
pub const DATA_SUBDIRS: [&str; 5] = ["admin", "vehicles", "owners", "parking", "reports"];

// ============================================================================
// RECORD SHAPE
// ============================================================================

/// Whether a file starts with a record-count line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Leading count line, then one record per line
    Counted,
    /// One record per line, no count
    Plain,
}

/// A fixed-shape record stored as one delimited line.
///
/// `read_fields` starts from `Default` and overwrites whatever parses, so a
/// short or damaged line still yields a usable record.
pub trait FlatRecord: Default {
    /// Name used in log lines
    const KIND: &'static str;

    fn to_fields(&self) -> Vec<String>;

    fn read_fields(&mut self, fields: &StringRecord);
}

/// Copy field `index` into `target` if present.
pub fn read_string(fields: &StringRecord, index: usize, target: &mut String) {
    if let Some(value) = fields.get(index) {
        *target = value.trim().to_string();
    }
}

/// Parse field `index` into `target`; on a missing or bad value `target` is left alone.
pub fn read_parsed<T: FromStr>(fields: &StringRecord, index: usize, target: &mut T) {
    let Some(raw) = fields.get(index) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => debug!(field = index, value = raw, "unparseable field kept at default"),
    }
}

/// Flags are written as `1`/`0`; `true`/`false` are accepted on read.
pub fn read_flag(fields: &StringRecord, index: usize, target: &mut bool) {
    if let Some(raw) = fields.get(index) {
        match raw.trim() {
            "1" | "true" => *target = true,
            "0" | "false" => *target = false,
            other => debug!(field = index, value = other, "unparseable flag kept at default"),
        }
    }
}

pub fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// Fields that aren't valid UTF-8 get replacement characters instead of
/// ending the load.
fn decode(row: &ByteRecord) -> StringRecord {
    row.iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect::<Vec<String>>()
        .into()
}

fn sanitize(field: &str) -> String {
    field.replace(['|', '\n', '\r'], " ")
}

// ============================================================================
// LOAD / SAVE
// ============================================================================

/// Load all records of `T` from `path`.
pub fn load<T: FlatRecord>(path: &Path, layout: Layout) -> LotResult<Vec<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(kind = T::KIND, path = %path.display(), "no data file yet, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(LotError::io(path, e)),
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(file);
    let mut rows = reader.byte_records();

    let declared = match layout {
        Layout::Plain => None,
        Layout::Counted => {
            let count = match rows.next() {
                None => return Ok(Vec::new()),
                Some(Ok(row)) => decode(&row)
                    .get(0)
                    .and_then(|c| c.trim().parse::<usize>().ok()),
                Some(Err(e)) => {
                    warn!(kind = T::KIND, path = %path.display(), error = %e, "unreadable count line");
                    None
                }
            };
            match count {
                Some(count) => Some(count),
                None => {
                    warn!(kind = T::KIND, path = %path.display(), "missing record count, treating file as empty");
                    return Ok(Vec::new());
                }
            }
        }
    };

    let mut records = Vec::new();
    for row in rows {
        if declared.is_some_and(|count| records.len() >= count) {
            break;
        }
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(kind = T::KIND, path = %path.display(), error = %e, "stopping at unreadable line");
                break;
            }
        };
        let mut record = T::default();
        record.read_fields(&decode(&row));
        records.push(record);
    }

    if let Some(count) = declared {
        if records.len() < count {
            warn!(
                kind = T::KIND,
                path = %path.display(),
                declared = count,
                loaded = records.len(),
                "file shorter than its declared count, keeping partial collection"
            );
        }
    }

    debug!(kind = T::KIND, path = %path.display(), count = records.len(), "loaded records");
    Ok(records)
}

/// Replace the file at `path` with exactly `records`.
pub fn save<T: FlatRecord>(records: &[T], path: &Path, layout: Layout) -> LotResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| LotError::io(parent, e))?;
    }

    let tmp = path.with_extension("tmp");
    {
        let file = File::create(&tmp).map_err(|e| LotError::io(&tmp, e))?;
        let mut writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);

        if layout == Layout::Counted {
            writer.write_record([records.len().to_string()])?;
        }
        for record in records {
            writer.write_record(record.to_fields().iter().map(|f| sanitize(f)))?;
        }
        writer.flush().map_err(|e| LotError::io(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| LotError::io(path, e))?;

    debug!(kind = T::KIND, path = %path.display(), count = records.len(), "saved records");
    Ok(())
}

/// Create the data directory tree if it does not exist yet.
pub fn bootstrap(data_dir: &Path) -> LotResult<()> {
    for sub in DATA_SUBDIRS {
        let dir = data_dir.join(sub);
        fs::create_dir_all(&dir).map_err(|e| LotError::io(&dir, e))?;
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
