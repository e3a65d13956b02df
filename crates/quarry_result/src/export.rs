//! Writing envelopes to files.

use crate::{FormattedData, ResultEnvelope, format_csv};
use quarry_error::{ExportError, ExportErrorKind, QuarryResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

/// File format for [`export_envelope`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    /// Pretty-printed UTF-8 JSON
    #[default]
    Json,
    /// Header plus rows
    Csv,
}

impl ExportFormat {
    /// Format implied by the file extension; JSON unless it is `.csv`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

/// Write the payload of a successful envelope to `path`.
///
/// # Errors
///
/// Returns an export error for a failed envelope, a payload that cannot be
/// written as CSV, or a serialization or IO failure.
#[instrument(skip(envelope, path), fields(path = %path.as_ref().display()))]
pub fn export_envelope(
    envelope: &ResultEnvelope,
    path: impl AsRef<Path>,
    format: Option<ExportFormat>,
) -> QuarryResult<()> {
    let path = path.as_ref();
    if !*envelope.success() {
        let reason = envelope.error().clone().unwrap_or_default();
        return Err(ExportError::new(ExportErrorKind::FailedResult(reason)).into());
    }
    let data = envelope
        .data()
        .as_ref()
        .ok_or_else(|| ExportError::new(ExportErrorKind::NoData("envelope has no data".into())))?;
    let format = format.unwrap_or_else(|| ExportFormat::from_path(path));

    let contents = match format {
        ExportFormat::Json => serde_json::to_string_pretty(data)
            .map_err(|e| ExportError::new(ExportErrorKind::Serialize(e.to_string())))?,
        ExportFormat::Csv => match data {
            FormattedData::Csv(text) => text.clone(),
            other => match other.tabular() {
                Some((columns, rows)) => format_csv(rows, columns)?,
                None => {
                    return Err(ExportError::new(ExportErrorKind::NoData(
                        "chart data has no rows to write as CSV".into(),
                    ))
                    .into());
                }
            },
        },
    };

    std::fs::write(path, contents).map_err(|e| {
        ExportError::new(ExportErrorKind::FileWrite(format!("{}: {}", path.display(), e)))
    })?;
    info!(format = %format, "Exported result");
    Ok(())
}
