//! Report loading
//!
//! Reads report files into memory before the parsers run. A directory
//! input becomes a fragment list sorted by file name, which fixes the
//! discovery order of everything downstream.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::formats::ReportSource;

/// Load a report file, or every file of a report directory
pub fn load_report_source(path: &Path) -> Result<ReportSource> {
    let location = path.display().to_string();

    if path.is_dir() {
        let mut parts = Vec::new();
        let entries = fs::read_dir(path)
            .with_context(|| format!("Failed to read report directory: {}", location))?;

        for entry in entries {
            let entry = entry?;
            let entry_path = entry.path();
            if !entry_path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let content = fs::read_to_string(&entry_path)
                .with_context(|| format!("Failed to read report fragment: {}", entry_path.display()))?;
            parts.push((name, content));
        }

        parts.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(ReportSource::fragments(location, parts))
    } else {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read report file: {}", location))?;
        Ok(ReportSource::content(location, text))
    }
}
