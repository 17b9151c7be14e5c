//! Export functionality for the project store.
//!
//! Exports always carry the full collection, in store order, wrapped in the
//! `{ "projects": [...] }` envelope.

use super::store::ProjectStore;
use crate::error::{Error, Result};
use crate::export::TransferFile;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use tracing::debug;

/// Read the whole collection into a transfer file.
pub fn export_projects<S: ProjectStore + ?Sized>(store: &S) -> Result<TransferFile> {
    let projects = store.get_all()?;
    debug!(count = projects.len(), "exporting projects");
    Ok(TransferFile::new(projects))
}

/// Encode a transfer file as pretty JSON, optionally gzip-compressed.
pub fn encode_transfer(file: &TransferFile, compress: bool) -> Result<Vec<u8>> {
    let json = file.to_json_pretty()?;
    if !compress {
        return Ok(json.into_bytes());
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(json.as_bytes())
        .map_err(|e| Error::Encode(format!("gzip: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::Encode(format!("gzip: {}", e)))
}
