use crate::core::{ConversionResult, CrsIdentifier};
use crate::utils::error::{ConverterError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// 轉換失敗的欄位以此字串取代，保持列數一致
pub const ERROR_PLACEHOLDER: &str = "ERROR";

pub const HEADER: [&str; 10] = [
    "index", "id", "x_src", "y_src", "z_src", "x_res", "y_res", "z_res", "status", "error",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            ExportFormat::Csv => b',',
            ExportFormat::Tsv => b'\t',
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Tsv => "text/tab-separated-values; charset=utf-8",
        }
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn export(results: &[ConversionResult], format: ExportFormat) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;

    for result in results {
        let input = &result.input;
        let mut record = vec![
            result.row_number().to_string(),
            input.label.clone().unwrap_or_default(),
            input.x.to_string(),
            input.y.to_string(),
            optional(input.z),
        ];

        match (result.output(), result.error()) {
            (Some(output), _) => {
                record.push(output.x.to_string());
                record.push(output.y.to_string());
                record.push(optional(output.z));
                record.push("converted".to_string());
                record.push(String::new());
            }
            (None, error) => {
                record.push(ERROR_PLACEHOLDER.to_string());
                record.push(ERROR_PLACEHOLDER.to_string());
                record.push(ERROR_PLACEHOLDER.to_string());
                record.push("failed".to_string());
                record.push(error.map(|e| e.to_string()).unwrap_or_default());
            }
        }

        writer.write_record(&record)?;
    }

    let data = writer.into_inner().map_err(|e| ConverterError::IoError(e.into_error()))?;
    tracing::debug!("Exported {} rows ({} bytes)", results.len(), data.len());
    Ok(data)
}

fn file_stem(identifier: &CrsIdentifier) -> String {
    match identifier.epsg_code() {
        Some(code) => format!("epsg{}", code),
        None => identifier
            .as_str()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect(),
    }
}

/// 例如 `converted_epsg29903_to_epsg4326_20261017T120000Z.csv`
pub fn file_name(
    source: &CrsIdentifier,
    target: &CrsIdentifier,
    format: ExportFormat,
    at: DateTime<Utc>,
) -> String {
    format!(
        "converted_{}_to_{}_{}.{}",
        file_stem(source),
        file_stem(target),
        at.format("%Y%m%dT%H%M%SZ"),
        format.extension()
    )
}
