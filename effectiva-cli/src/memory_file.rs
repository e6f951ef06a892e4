//! File-backed memory: one `<namespace>.toon` file per namespace.
//!
//! Each record starts with a `--- <kind>` header line followed by its TOON
//! payload. Records are appended, so the file reads oldest first.

use anyhow::{Context, Result, bail};
use effectiva_core::{MemoryRecord, MemorySink, Namespace, RecordKind};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

const HEADER: &str = "--- ";

pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn file(&self, namespace: Namespace) -> PathBuf {
        self.dir.join(format!("{}.toon", namespace.as_str()))
    }
}

impl MemorySink for FileSink {
    fn store(&mut self, record: MemoryRecord) -> Result<()> {
        let p = self.file(record.namespace);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&p)
            .with_context(|| format!("open {}", p.display()))?;
        let mut chunk = format!("{HEADER}{}\n{}", record.kind.as_str(), record.payload);
        if !chunk.ends_with('\n') {
            chunk.push('\n');
        }
        f.write_all(chunk.as_bytes())
            .with_context(|| format!("append {}", p.display()))?;
        Ok(())
    }

    fn records(&self, namespace: Namespace) -> Result<Vec<MemoryRecord>> {
        let p = self.file(namespace);
        if !p.exists() {
            return Ok(Vec::new());
        }
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        parse_records(namespace, &s).with_context(|| format!("parse {}", p.display()))
    }
}

fn parse_records(namespace: Namespace, text: &str) -> Result<Vec<MemoryRecord>> {
    let mut out = Vec::new();
    let mut current: Option<(RecordKind, Vec<&str>)> = None;

    for (n, line) in text.lines().enumerate() {
        if let Some(kind) = line.strip_prefix(HEADER) {
            let Some(kind) = RecordKind::parse(kind) else {
                bail!("line {}: unknown record kind {kind:?}", n + 1);
            };
            if let Some((k, lines)) = current.take() {
                out.push(record(namespace, k, &lines));
            }
            current = Some((kind, Vec::new()));
            continue;
        }
        match current.as_mut() {
            Some((_, lines)) => lines.push(line),
            None if line.trim().is_empty() => {}
            None => bail!("line {}: payload before any record header", n + 1),
        }
    }
    if let Some((k, lines)) = current {
        out.push(record(namespace, k, &lines));
    }
    Ok(out)
}

fn record(namespace: Namespace, kind: RecordKind, lines: &[&str]) -> MemoryRecord {
    MemoryRecord {
        namespace,
        kind,
        payload: lines.join("\n"),
    }
}
