use crate::model::Classroom;
use crate::store::{classroom_from_document, DataStore, STORAGE_KEY};
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DOCUMENT_ENTRY: &str = "data/database.json";
pub const BUNDLE_FORMAT_V1: &str = "classroom-backup-v1";
pub const RAW_JSON_FORMAT: &str = "raw-json";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

pub fn backup_file_name(date: chrono::NaiveDate) -> String {
    format!("LocalAttendance_Backup_{}.zip", date.format("%Y-%m-%d"))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_entry<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
) -> anyhow::Result<()> {
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, opts)
        .with_context(|| format!("failed to add {name} to bundle"))?;
    zip.write_all(bytes)
        .with_context(|| format!("failed to write {name}"))
}

fn read_entry<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> anyhow::Result<String> {
    let mut text = String::new();
    archive
        .by_name(name)
        .with_context(|| format!("bundle missing {name}"))?
        .read_to_string(&mut text)
        .with_context(|| format!("failed to read {name}"))?;
    Ok(text)
}

/// Writes the stored document, with `classroom` as its state, into a zip
/// bundle next to a manifest.
pub fn export_bundle(
    store: &DataStore,
    classroom: &Classroom,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let body = serde_json::to_string_pretty(&store.document_with(classroom)?)
        .context("failed to serialize document")?;
    let digest = sha256_hex(body.as_bytes());

    if let Some(dir) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let file = File::create(out_path)
        .with_context(|| format!("failed to create bundle {}", out_path.display()))?;

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "documentSha256": digest,
    });
    let mut zip = ZipWriter::new(file);
    write_entry(&mut zip, MANIFEST_ENTRY, manifest.to_string().as_bytes())?;
    write_entry(&mut zip, DOCUMENT_ENTRY, body.as_bytes())?;
    zip.finish().context("failed to finish bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
        sha256: digest,
    })
}

/// Restores a bundle, or a plain JSON backup, over the store's document.
/// Nothing is written unless the backup holds classroom state and, for
/// bundles, its checksum matches.
pub fn import_bundle(in_path: &Path, store: &DataStore) -> anyhow::Result<ImportSummary> {
    let (text, format) = if is_zip_file(in_path)? {
        (read_bundle_document(in_path)?, BUNDLE_FORMAT_V1)
    } else {
        let text = std::fs::read_to_string(in_path)
            .with_context(|| format!("failed to read backup {}", in_path.display()))?;
        (text, RAW_JSON_FORMAT)
    };

    let document: serde_json::Value =
        serde_json::from_str(&text).context("backup is not valid JSON")?;
    if document.get(STORAGE_KEY).is_none() {
        return Err(anyhow!("Invalid backup file format."));
    }
    classroom_from_document(&document)?;

    store.save_document(&document)?;
    Ok(ImportSummary {
        bundle_format_detected: format.to_string(),
    })
}

fn read_bundle_document(in_path: &Path) -> anyhow::Result<String> {
    let file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.display()))?;
    let mut archive = ZipArchive::new(file).context("not a readable zip bundle")?;

    let manifest: serde_json::Value = serde_json::from_str(&read_entry(&mut archive, MANIFEST_ENTRY)?)
        .context("bundle manifest is not valid JSON")?;
    match manifest.get("format").and_then(|v| v.as_str()) {
        Some(BUNDLE_FORMAT_V1) => {}
        other => return Err(anyhow!("unsupported bundle format: {}", other.unwrap_or("none"))),
    }

    let text = read_entry(&mut archive, DOCUMENT_ENTRY)?;
    if let Some(expected) = manifest.get("documentSha256").and_then(|v| v.as_str()) {
        if sha256_hex(text.as_bytes()) != expected {
            return Err(anyhow!("document checksum mismatch"));
        }
    }
    Ok(text)
}

/// Checks for the zip local-file-header magic.
fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut magic = [0u8; 4];
    let n = File::open(path)
        .and_then(|mut f| f.read(&mut magic))
        .with_context(|| format!("failed to open backup {}", path.display()))?;
    Ok(n == 4 && magic == *b"PK\x03\x04")
}
