//! Snapshot index
//!
//! The index is a plain text file with one record per line:
//!
//! ```text
//! 0001 | 2026-10-19 08:30:05 | first
//! 0002 | 2026-10-19 08:31:12 |
//! ```
//!
//! Messages are escape-encoded (`\\`, `\|`, `\n`, `\r`) so a record always
//! stays on one line and the field separator never appears unescaped inside a
//! message written by this crate. Lines written by older tools with a bare `|`
//! in the message are still read back verbatim.
//!
//! Next to the index lives `last_id`, the highest id ever appended. Ids are
//! allocated above it, so deleting a snapshot never makes its number available
//! again.

use crate::error::{Result, SnapError};
use crate::types::{SnapshotId, SnapshotRecord, TIMESTAMP_FORMAT};
use crate::utils;
use chrono::NaiveDateTime;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Field separator between id, timestamp and message
const SEPARATOR: char = '|';

/// File name of the id high-water mark, next to the index
const LAST_ID_FILE: &str = "last_id";

/// Ordered log of snapshot records
#[derive(Debug, Clone)]
pub struct IndexStore {
    /// Index file
    path: PathBuf,
    /// High-water mark file
    last_id_path: PathBuf,
}

impl IndexStore {
    /// Index stored at `path`
    pub fn new(path: PathBuf) -> Self {
        let last_id_path = utils::parent_dir(&path).join(LAST_ID_FILE);
        Self { path, last_id_path }
    }

    /// Path of the index file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the index file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create an empty index, truncating any existing one
    pub fn create(&self) -> Result<()> {
        File::create(&self.path).map_err(|e| SnapError::environment("create index", e))?;
        debug!("Created index at {:?}", self.path);
        Ok(())
    }

    /// Append one record
    ///
    /// The line is written with a single `write_all` and the id high-water mark
    /// is raised afterwards.
    pub fn append(&self, record: &SnapshotRecord) -> Result<()> {
        let mut line = encode_record(record);
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SnapError::environment("open index", e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| SnapError::environment("append to index", e))?;

        if record.id.get() > self.last_id()? {
            utils::atomic_write(&self.last_id_path, format!("{}\n", record.id.get()).as_bytes())?;
        }

        debug!("Appended record {} to index", record.id);
        Ok(())
    }

    /// Iterate records in file order
    ///
    /// The file is reopened on every call, so each scan starts from the
    /// beginning. A missing index yields nothing.
    pub fn scan(&self) -> Result<Records> {
        let reader = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(SnapError::environment("open index", e)),
        };
        Ok(Records {
            reader,
            buf: Vec::new(),
            line_no: 0,
        })
    }

    /// Number of readable records
    pub fn count(&self) -> Result<usize> {
        let mut count = 0;
        for record in self.scan()? {
            record?;
            count += 1;
        }
        Ok(count)
    }

    /// Id for the next snapshot
    ///
    /// One above the larger of the recorded high-water mark and the largest id
    /// still in the index. Starts at 1 when neither exists.
    ///
    /// # Errors
    ///
    /// [`SnapError::IdsExhausted`] once the largest id has been handed out.
    pub fn next_id(&self) -> Result<SnapshotId> {
        let mut highest = self.last_id()?;
        for record in self.scan()? {
            highest = highest.max(record?.id.get());
        }
        match SnapshotId::new(highest) {
            None => Ok(SnapshotId::FIRST),
            Some(id) => id.next().ok_or(SnapError::IdsExhausted(id)),
        }
    }

    /// Remove the record for `id`
    ///
    /// Returns whether a line was dropped. See [`IndexStore::prepare_removal`].
    pub fn remove(&self, id: SnapshotId) -> Result<bool> {
        match self.prepare_removal(id)? {
            Some(rewrite) => {
                rewrite.commit()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Stage the index without the record for `id`
    ///
    /// Every other line, including lines that do not parse or are not UTF-8,
    /// is copied byte for byte into a temporary file in the store directory.
    /// Nothing under the index path changes until [`IndexRewrite::commit`]
    /// renames it into place. `None` when no line carries `id`.
    pub fn prepare_removal(&self, id: SnapshotId) -> Result<Option<IndexRewrite>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SnapError::environment("read index", e)),
        };

        let mut temp = NamedTempFile::new_in(utils::parent_dir(&self.path))
            .map_err(|e| SnapError::environment("create temp index", e))?;
        let mut removed = false;

        for line in content.split_inclusive(|&b| b == b'\n') {
            if record_id_field(&String::from_utf8_lossy(line)) == Some(id) {
                removed = true;
                continue;
            }
            temp.write_all(line)
                .map_err(|e| SnapError::environment("write temp index", e))?;
        }

        if !removed {
            return Ok(None);
        }

        temp.flush()
            .map_err(|e| SnapError::environment("write temp index", e))?;
        Ok(Some(IndexRewrite {
            temp,
            path: self.path.clone(),
            id,
        }))
    }

    /// Highest id ever appended, 0 if unknown
    fn last_id(&self) -> Result<u32> {
        match fs::read_to_string(&self.last_id_path) {
            Ok(text) => Ok(text.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring unreadable id high-water mark {:?}", self.last_id_path);
                0
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(SnapError::environment("read last id", e)),
        }
    }
}

/// Staged index without one record, applied by [`IndexRewrite::commit`]
///
/// Dropping it discards the temporary file and leaves the index as it was.
#[derive(Debug)]
pub struct IndexRewrite {
    temp: NamedTempFile,
    path: PathBuf,
    id: SnapshotId,
}

impl IndexRewrite {
    /// Replace the index with the staged copy in one rename
    pub fn commit(self) -> Result<()> {
        utils::persist(self.temp, &self.path)?;
        info!("Removed record {} from index", self.id);
        Ok(())
    }
}

/// Lazy sequence of index records
///
/// Lines that cannot be decoded, including lines that are not UTF-8, are
/// logged and skipped; read errors are yielded to the caller.
pub struct Records {
    reader: Option<BufReader<File>>,
    buf: Vec<u8>,
    line_no: usize,
}

impl Iterator for Records {
    type Item = Result<SnapshotRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        loop {
            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(SnapError::environment("read index", e))),
            }
            self.line_no += 1;

            let Ok(line) = std::str::from_utf8(&self.buf) else {
                warn!("Skipping index line {}: not valid UTF-8", self.line_no);
                continue;
            };
            let line = line.strip_suffix('\n').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }
            match decode_record(line) {
                Ok(record) => return Some(Ok(record)),
                Err(e) => warn!("Skipping index line {}: {}", self.line_no, e),
            }
        }
    }
}

/// Render a record as an index line, without the trailing newline
pub fn encode_record(record: &SnapshotRecord) -> String {
    format!(
        "{} {sep} {} {sep} {}",
        record.id,
        record.timestamp_string(),
        escape_message(&record.message),
        sep = SEPARATOR
    )
}

/// Parse one index line
///
/// Only the id is required. A missing or unparsable timestamp leaves the
/// record undated rather than hiding it.
pub fn decode_record(line: &str) -> Result<SnapshotRecord> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = line.splitn(3, SEPARATOR);

    let id = record_id_field(line)
        .ok_or_else(|| SnapError::MalformedRecord(format!("missing id in {:?}", line)))?;
    fields.next();

    let timestamp = fields.next().map(str::trim).and_then(|text| {
        let parsed = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).ok();
        if parsed.is_none() {
            debug!("Record {} has no readable timestamp: {:?}", id, text);
        }
        parsed
    });

    let message = fields.next().unwrap_or("");
    let message = message.strip_prefix(' ').unwrap_or(message);

    Ok(SnapshotRecord {
        id,
        timestamp,
        message: unescape_message(message),
    })
}

/// Id of an index line, if its first field parses
pub fn record_id_field(line: &str) -> Option<SnapshotId> {
    line.split(SEPARATOR).next()?.trim().parse().ok()
}

fn escape_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            SEPARATOR => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of `escape_message`; unknown escapes are kept as written
fn unescape_message(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('|') => out.push('|'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
