//! Line-file invoice store
//!
//! File layout: one encoded invoice per `\n`-terminated line, in save order
//! (see [`codec`](crate::codec)). Lines that fail to decode are invisible
//! to every operation: they are skipped by scans, kept by appends and
//! dropped by rewrites.
//!
//! Every operation runs under one lock and re-reads the file, so a
//! read-modify-write cycle never interleaves with another operation on the
//! same store. Inserts append a line; replacements and deletions write the
//! whole file to a sibling temporary file and rename it into place.

use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::codec;
use crate::database::{assign_id, InvoiceDatabase};
use crate::error::{Result, StorageError};
use crate::model::{Invoice, InvoiceField};

/// Suffix of the scratch file used by rewrites
const REWRITE_SUFFIX: &str = ".tmp";

/// Invoice store persisting one invoice per line of a text file
pub struct InFileDatabase {
    file: Mutex<LineFile>,
}

impl InFileDatabase {
    /// Open or create a store at the given file path
    ///
    /// # Arguments
    /// * `path` - Backing file; missing parent directories are created
    ///
    /// # Returns
    /// * `Result<InFileDatabase>` - Store handle
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = LineFile {
            path: path.as_ref().to_path_buf(),
        };
        file.ensure_exists().map_err(file.failed("open invoice file"))?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> PathBuf {
        self.file.lock().path.clone()
    }
}

impl InvoiceDatabase for InFileDatabase {
    fn save(&self, mut invoice: Invoice) -> Result<Invoice> {
        let file = self.file.lock();
        let mut snapshot = file
            .scan()
            .map_err(file.failed(format!("read invoices before saving {:?}", invoice.id)))?;

        assign_id(&mut invoice, snapshot.ids())?;
        let encoded = codec::encode(&invoice)?;

        match snapshot.position(&invoice.id) {
            Some(index) => {
                debug!(id = %invoice.id, line = index + 1, "replacing invoice");
                snapshot.lines[index].text = encoded;
                file.rewrite(&snapshot)
                    .map_err(file.failed(format!("replace invoice {:?}", invoice.id)))?;
            }
            None => {
                debug!(id = %invoice.id, "appending invoice");
                file.append(&encoded, snapshot.terminated)
                    .map_err(file.failed(format!("append invoice {:?}", invoice.id)))?;
            }
        }

        Ok(invoice)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        let file = self.file.lock();
        let snapshot = file.scan().map_err(file.failed(format!("find invoice {:?}", id)))?;

        Ok(snapshot
            .lines
            .into_iter()
            .find(|line| line.invoice.id == id)
            .map(|line| line.invoice))
    }

    fn exists_by_id(&self, id: &str) -> Result<bool> {
        let file = self.file.lock();
        let snapshot = file
            .scan()
            .map_err(file.failed(format!("check invoice {:?}", id)))?;

        Ok(snapshot.position(id).is_some())
    }

    fn find_all(&self) -> Result<Vec<Invoice>> {
        let file = self.file.lock();
        let snapshot = file.scan().map_err(file.failed("list invoices"))?;

        Ok(snapshot.into_invoices().collect())
    }

    fn find_all_by_field(&self, field: InvoiceField, value: &str) -> Result<Vec<Invoice>> {
        let file = self.file.lock();
        let snapshot = file
            .scan()
            .map_err(file.failed(format!("search invoices by {} {:?}", field, value)))?;

        Ok(snapshot
            .into_invoices()
            .filter(|invoice| invoice.field(field) == value)
            .collect())
    }

    fn count(&self) -> Result<u64> {
        let file = self.file.lock();
        let snapshot = file.scan().map_err(file.failed("count invoices"))?;

        Ok(snapshot.lines.len() as u64)
    }

    fn delete_by_id(&self, id: &str) -> Result<()> {
        let file = self.file.lock();
        let mut snapshot = file
            .scan()
            .map_err(file.failed(format!("read invoices before deleting {:?}", id)))?;

        let index = snapshot
            .position(id)
            .ok_or_else(|| StorageError::InvoiceNotFound(id.to_string()))?;
        debug!(id, line = index + 1, "deleting invoice");

        snapshot.lines.remove(index);
        file.rewrite(&snapshot)
            .map_err(file.failed(format!("delete invoice {:?}", id)))
    }

    fn delete_all(&self) -> Result<()> {
        let file = self.file.lock();
        file.truncate().map_err(file.failed("delete all invoices"))?;

        info!(path = %file.path.display(), "cleared invoice file");
        Ok(())
    }
}

/// Backing file. Only reachable through the store's lock.
struct LineFile {
    path: PathBuf,
}

/// Decodable line together with its text as found in the file
struct StoredLine {
    text: String,
    invoice: Invoice,
}

/// Logical view of the file at one point in time
struct Snapshot {
    /// Decodable lines in file order
    lines: Vec<StoredLine>,
    /// Whether the file is empty or ends with a newline
    terminated: bool,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            lines: Vec::new(),
            terminated: true,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.invoice.id == id)
    }

    fn ids(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.invoice.id.as_str())
    }

    fn into_invoices(self) -> impl Iterator<Item = Invoice> {
        self.lines.into_iter().map(|line| line.invoice)
    }
}

impl LineFile {
    /// Error mapper naming the operation and the file
    fn failed(&self, operation: impl Display) -> impl FnOnce(io::Error) -> StorageError {
        StorageError::io(format!("{} ({})", operation, self.path.display()))
    }

    fn ensure_exists(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let existed = self.path.exists();
        OpenOptions::new().create(true).append(true).open(&self.path)?;

        if existed {
            info!(path = %self.path.display(), "opened invoice file");
        } else {
            info!(path = %self.path.display(), "created invoice file");
        }
        Ok(())
    }

    /// Read and decode the whole file. A missing file reads as empty.
    fn scan(&self) -> io::Result<Snapshot> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::empty()),
            Err(e) => return Err(e),
        };
        if file.metadata()?.len() == 0 {
            return Ok(Snapshot::empty());
        }

        // SAFETY: the file is owned by this store within the process and
        // the store's lock is held until the map is dropped at the end of
        // this function, so no writer can truncate it underneath us.
        let map = unsafe { Mmap::map(&file)? };

        let mut snapshot = Snapshot {
            lines: Vec::new(),
            terminated: map.last() == Some(&b'\n'),
        };
        let mut skipped = 0usize;

        for (number, raw) in codec::split_lines(&map).into_iter().enumerate() {
            let decoded = std::str::from_utf8(raw)
                .ok()
                .and_then(|text| codec::decode(text).ok().map(|invoice| (text, invoice)));

            match decoded {
                Some((text, invoice)) => snapshot.lines.push(StoredLine {
                    text: text.to_string(),
                    invoice,
                }),
                None => {
                    trace!(line = number + 1, "skipping malformed invoice line");
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!(path = %self.path.display(), skipped, "ignoring malformed invoice lines");
        }
        Ok(snapshot)
    }

    /// Append one line, first closing an unterminated last line
    fn append(&self, line: &str, terminated: bool) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 2);
        if !terminated {
            buf.push(b'\n');
        }
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&buf)?;
        file.sync_data()
    }

    /// Replace the file with exactly the snapshot's lines
    fn rewrite(&self, snapshot: &Snapshot) -> io::Result<()> {
        let mut contents = String::with_capacity(
            snapshot.lines.iter().map(|line| line.text.len() + 1).sum(),
        );
        for line in &snapshot.lines {
            contents.push_str(&line.text);
            contents.push('\n');
        }

        let scratch = self.scratch_path();
        let mut file = File::create(&scratch)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&scratch, &self.path) {
            let _ = fs::remove_file(&scratch);
            return Err(e);
        }
        Ok(())
    }

    fn truncate(&self) -> io::Result<()> {
        File::create(&self.path)?.sync_all()
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(REWRITE_SUFFIX);
        self.path.with_file_name(name)
    }
}
