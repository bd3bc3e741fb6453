use std::io::{Cursor, Read, Write};

use anyhow::{Context, Result};
use zip::{write::SimpleFileOptions, ZipArchive, ZipWriter};

pub const REPORT_ENTRY: &str = "insights.json";
pub const CHART_ENTRY: &str = "chart.png";

/// Bundles the serialized report and the chart image into the archive
/// uploaded to object storage.
pub fn bundle(report_json: &[u8], chart_png: &[u8]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    writer
        .start_file(REPORT_ENTRY, options)
        .context("Failed to start report archive entry")?;
    writer
        .write_all(report_json)
        .context("Failed to write report archive entry")?;

    writer
        .start_file(CHART_ENTRY, options)
        .context("Failed to start chart archive entry")?;
    writer
        .write_all(chart_png)
        .context("Failed to write chart archive entry")?;

    let cursor = writer.finish().context("Failed to finish insights archive")?;
    Ok(cursor.into_inner())
}

/// Unpacks the two named entries on the sender side.
pub fn unbundle(archive_bytes: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))
        .context("Failed to open insights archive")?;

    let report_json = read_entry(&mut archive, REPORT_ENTRY)?;
    let chart_png = read_entry(&mut archive, CHART_ENTRY)?;
    Ok((report_json, chart_png))
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .with_context(|| format!("Archive is missing entry '{}'", name))?;

    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read archive entry '{}'", name))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_then_unbundle_preserves_entries() {
        let report = br#"{"questions_attempted":7}"#;
        let chart = b"\x89PNG fake image payload";

        let archive = bundle(report, chart).unwrap();
        let (report_out, chart_out) = unbundle(&archive).unwrap();

        assert_eq!(report_out, report);
        assert_eq!(chart_out, chart);
    }

    #[test]
    fn archive_without_chart_entry_is_rejected() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(REPORT_ENTRY, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"{}").unwrap();
        let archive = writer.finish().unwrap().into_inner();

        let err = unbundle(&archive).unwrap_err();
        assert!(err.to_string().contains(CHART_ENTRY));
    }

    #[test]
    fn garbage_bytes_are_not_an_archive() {
        assert!(unbundle(b"definitely not a zip").is_err());
    }
}
