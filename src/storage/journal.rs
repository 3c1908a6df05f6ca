//! JSON and JSONL artifact I/O with write-then-rename.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Sibling temp path: `<dir>/.<file_name>.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

/// Write through a temp file and rename it over `path`.
fn write_atomic(path: &Path, fill: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let tmp = temp_path(path);
    let file = File::create(&tmp).map_err(|e| Error::storage(&tmp, e))?;
    let mut writer = BufWriter::new(file);
    fill(&mut writer)?;
    writer.flush().map_err(|e| Error::storage(&tmp, e))?;
    drop(writer);
    fs::rename(&tmp, path).map_err(|e| Error::storage(path, e))
}

/// Write `value` as indented JSON.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    write_atomic(path, |w| {
        serde_json::to_writer_pretty(w, value).map_err(|e| Error::storage(path, e))
    })
}

/// Read a whole JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::storage(path, e))
}

/// Write one JSON document per line.
pub(crate) fn write_lines<'a, T, I>(path: &Path, items: I) -> Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    write_atomic(path, |w| {
        for item in items {
            serde_json::to_writer(&mut *w, item).map_err(|e| Error::storage(path, e))?;
            w.write_all(b"\n").map_err(|e| Error::storage(path, e))?;
        }
        Ok(())
    })
}

/// Read one JSON document per line, skipping blank lines.
pub(crate) fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(open(path)?);
    let mut items = Vec::new();

    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::storage(path, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item = serde_json::from_str(line)
            .map_err(|e| Error::storage(path, format!("line {}: {e}", n + 1)))?;
        items.push(item);
    }

    Ok(items)
}

fn open(path: &Path) -> Result<File> {
    match File::open(path) {
        Ok(f) => Ok(f),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(Error::storage(path, e)),
    }
}
