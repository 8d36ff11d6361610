use crate::core::{CoordinateRow, ConversionResult, CrsIdentifier, CrsRegistry, RowOutcome, Transformer};
use crate::utils::error::{ConverterError, Result};
use crate::utils::validation::validate_non_empty_string;

pub const DEFAULT_MAX_ROWS: usize = 1000;

pub struct Converter<R: CrsRegistry> {
    registry: R,
    max_rows: usize,
}

impl<R: CrsRegistry> Converter<R> {
    pub fn new(registry: R) -> Self {
        Self::with_max_rows(registry, DEFAULT_MAX_ROWS)
    }

    pub fn with_max_rows(registry: R, max_rows: usize) -> Self {
        Self { registry, max_rows }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// 轉換整批座標。
    ///
    /// CRS 無法解析時整批失敗；單列轉換失敗只標記該列，其餘照常轉換。
    /// 回傳結果的長度與順序與輸入一致。
    pub fn convert(
        &self,
        rows: &[CoordinateRow],
        source_crs: &CrsIdentifier,
        target_crs: &CrsIdentifier,
    ) -> Result<Vec<ConversionResult>> {
        validate_non_empty_string("source_crs", source_crs.as_str())?;
        validate_non_empty_string("target_crs", target_crs.as_str())?;

        if rows.len() > self.max_rows {
            return Err(ConverterError::BatchTooLarge {
                rows: rows.len(),
                max: self.max_rows,
            });
        }

        let transformer = self.registry.transformer(source_crs, target_crs)?;

        let results: Vec<ConversionResult> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| ConversionResult {
                index,
                input: row.clone(),
                outcome: convert_row(&transformer, row),
            })
            .collect();

        let failed = results.iter().filter(|r| !r.is_converted()).count();
        if failed > 0 {
            tracing::warn!(
                "Converted {} rows {} -> {} ({} failed)",
                results.len(),
                source_crs,
                target_crs,
                failed
            );
        } else {
            tracing::info!(
                "Converted {} rows {} -> {}",
                results.len(),
                source_crs,
                target_crs
            );
        }

        Ok(results)
    }
}

fn convert_row<T: Transformer>(transformer: &T, row: &CoordinateRow) -> RowOutcome {
    match transformer.transform(row) {
        Ok((x, y, z)) => RowOutcome::Converted {
            output: CoordinateRow {
                label: row.label.clone(),
                x,
                y,
                z,
            },
        },
        Err(error) => {
            tracing::debug!("Row ({}, {}) failed: {}", row.x, row.y, error);
            RowOutcome::Failed { error }
        }
    }
}
