use crate::core::grid_ref::irish_grid_to_xy;
use crate::core::{CoordinateRow, CrsIdentifier, IRISH_GRID_CODE};
use crate::utils::error::{ConverterError, Result};
use serde::{Deserialize, Serialize};

/// 表格儲存格：數字或貼上的文字
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    fn is_blank(&self) -> bool {
        matches!(self, Cell::Text(s) if s.trim().is_empty())
    }

    fn as_text(&self) -> String {
        match self {
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// 前端表格的一列，欄位皆可為空
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_ref: Option<String>,
}

fn present(cell: &Option<Cell>) -> Option<&Cell> {
    cell.as_ref().filter(|c| !c.is_blank())
}

impl TableRow {
    pub fn is_blank(&self) -> bool {
        present(&self.id).is_none()
            && present(&self.x).is_none()
            && present(&self.y).is_none()
            && present(&self.z).is_none()
            && self.grid_ref.as_deref().map_or(true, |g| g.trim().is_empty())
    }
}

fn number(row: usize, name: &str, cell: Option<&Cell>) -> Result<f64> {
    let cell = cell.ok_or_else(|| ConverterError::Table {
        row,
        message: format!("missing {} value", name),
    })?;
    cell.as_number().ok_or_else(|| ConverterError::Table {
        row,
        message: format!("{} value '{}' is not a number", name, cell.as_text()),
    })
}

/// 將前端表格轉為座標列。空白列略過，其他缺值或非數字的列讓整個請求失敗。
///
/// 錯誤中的列號只計算非空白列，與轉換結果的 `row_number` 一致。
pub fn parse_rows(rows: &[TableRow], source: &CrsIdentifier) -> Result<Vec<CoordinateRow>> {
    let accepts_grid_refs = source.epsg_code() == Some(IRISH_GRID_CODE);
    let mut parsed = Vec::with_capacity(rows.len());

    for row in rows.iter().filter(|row| !row.is_blank()) {
        let row_number = parsed.len() + 1;

        let grid_ref = row.grid_ref.as_deref().map(str::trim).filter(|g| !g.is_empty());
        let (x, y) = match grid_ref {
            Some(reference) => {
                if !accepts_grid_refs {
                    return Err(ConverterError::Table {
                        row: row_number,
                        message: "grid references require TM75 / Irish Grid (EPSG:29903) as the source system".to_string(),
                    });
                }
                irish_grid_to_xy(reference).map_err(|e| ConverterError::Table {
                    row: row_number,
                    message: e.to_string(),
                })?
            }
            None => (
                number(row_number, "x", present(&row.x))?,
                number(row_number, "y", present(&row.y))?,
            ),
        };

        let z = match present(&row.z) {
            Some(cell) => Some(number(row_number, "z", Some(cell))?),
            None => None,
        };

        parsed.push(CoordinateRow {
            label: present(&row.id).map(Cell::as_text),
            x,
            y,
            z,
        });
    }

    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    X,
    Y,
    Z,
    GridRef,
    Ignored,
}

fn column_for_header(name: &str) -> Option<Column> {
    match name.trim().to_lowercase().as_str() {
        "x" | "easting" | "lon" | "lng" | "longitude" | "x_src" => Some(Column::X),
        "y" | "northing" | "lat" | "latitude" | "y_src" => Some(Column::Y),
        "z" | "height" | "elevation" | "z_src" => Some(Column::Z),
        "id" | "label" | "name" => Some(Column::Id),
        "grid_ref" | "gridref" | "grid ref" => Some(Column::GridRef),
        _ => None,
    }
}

fn detect_delimiter(text: &str) -> u8 {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if first.contains('\t') {
        b'\t'
    } else if first.contains(';') && !first.contains(',') {
        b';'
    } else {
        b','
    }
}

fn headerless_layout(first: &csv::StringRecord) -> Vec<Column> {
    let first_field = first.get(0).unwrap_or("").trim();
    let looks_like_grid_ref = first_field.parse::<f64>().is_err()
        && first_field.chars().any(|c| c.is_ascii_digit())
        && irish_grid_to_xy(first_field).is_ok();
    if looks_like_grid_ref {
        return vec![Column::GridRef, Column::Id];
    }
    match first.len() {
        0..=2 => vec![Column::X, Column::Y],
        3 => {
            let third_numeric = first.get(2).is_some_and(|v| v.trim().parse::<f64>().is_ok());
            if third_numeric {
                vec![Column::X, Column::Y, Column::Z]
            } else {
                vec![Column::X, Column::Y, Column::Id]
            }
        }
        _ => vec![Column::X, Column::Y, Column::Z, Column::Id],
    }
}

/// 解析從試算表複製或上傳的文字 (Tab、逗號或分號分隔，標題列可有可無)
pub fn parse_delimited(text: &str) -> Result<Vec<TableRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }

    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };

    let header: Option<Vec<Column>> = {
        let columns: Vec<Option<Column>> = first.iter().map(column_for_header).collect();
        let recognised = columns.iter().filter(|c| c.is_some()).count();
        (recognised > 0).then(|| {
            columns
                .into_iter()
                .map(|c| c.unwrap_or(Column::Ignored))
                .collect()
        })
    };

    let (layout, data) = match header {
        Some(layout) => (layout, &records[1..]),
        None => (headerless_layout(first), &records[..]),
    };

    let rows: Vec<TableRow> = data
        .iter()
        .map(|record| {
            let mut row = TableRow::default();
            for (column, value) in layout.iter().zip(record.iter()) {
                if value.is_empty() {
                    continue;
                }
                let cell = Some(Cell::Text(value.to_string()));
                match column {
                    Column::Id => row.id = cell,
                    Column::X => row.x = cell,
                    Column::Y => row.y = cell,
                    Column::Z => row.z = cell,
                    Column::GridRef => row.grid_ref = Some(value.to_string()),
                    Column::Ignored => {}
                }
            }
            row
        })
        .filter(|row| !row.is_blank())
        .collect();

    tracing::debug!("Parsed {} table rows from pasted text", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Option<Cell> {
        Some(Cell::Text(value.to_string()))
    }

    #[test]
    fn test_parse_rows_skips_blank_rows() {
        let rows = vec![
            TableRow {
                x: Some(Cell::Number(80367.0)),
                y: Some(Cell::Number(84425.0)),
                id: text("Corrán Tuathail"),
                ..Default::default()
            },
            TableRow::default(),
            TableRow {
                x: text(" 335793 "),
                y: text("327689"),
                z: text("850"),
                ..Default::default()
            },
        ];

        let parsed = parse_rows(&rows, &CrsIdentifier::new("EPSG:29903")).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].label.as_deref(), Some("Corrán Tuathail"));
        assert_eq!(parsed[1].x, 335793.0);
        assert_eq!(parsed[1].z, Some(850.0));
    }

    #[test]
    fn test_parse_rows_reports_row_number() {
        let rows = vec![
            TableRow {
                x: text("1"),
                y: text("2"),
                ..Default::default()
            },
            TableRow {
                x: text("abc"),
                y: text("2"),
                ..Default::default()
            },
        ];

        let err = parse_rows(&rows, &CrsIdentifier::new("EPSG:4326")).unwrap_err();
        assert!(matches!(err, ConverterError::Table { row: 2, .. }));

        // 空白列不計入列號
        let with_gap = vec![rows[0].clone(), TableRow::default(), rows[1].clone()];
        let err = parse_rows(&with_gap, &CrsIdentifier::new("EPSG:4326")).unwrap_err();
        assert!(matches!(err, ConverterError::Table { row: 2, .. }));

        let missing = vec![TableRow {
            x: text("1"),
            id: text("only x"),
            ..Default::default()
        }];
        let err = parse_rows(&missing, &CrsIdentifier::new("EPSG:4326")).unwrap_err();
        assert!(err.to_string().contains("missing y"));
    }

    #[test]
    fn test_grid_refs_only_for_irish_grid() {
        let rows = vec![TableRow {
            grid_ref: Some("V 80367 84425".to_string()),
            ..Default::default()
        }];

        let parsed = parse_rows(&rows, &CrsIdentifier::new("epsg:29903")).unwrap();
        assert_eq!((parsed[0].x, parsed[0].y), (80367.0, 84425.0));

        let err = parse_rows(&rows, &CrsIdentifier::new("EPSG:4326")).unwrap_err();
        assert!(matches!(err, ConverterError::Table { row: 1, .. }));
    }

    #[test]
    fn test_parse_delimited_tab_without_header() {
        let pasted = "80367\t84425\tCorrán Tuathail\n335793\t327689\tSlieve Donard\n";
        let rows = parse_delimited(pasted).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].x, text("80367"));
        assert_eq!(rows[1].id, text("Slieve Donard"));
    }

    #[test]
    fn test_parse_delimited_with_header() {
        let pasted = "id,easting,northing,height\nA,1,2,3\n\nB,4,5,\n";
        let rows = parse_delimited(pasted).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, text("A"));
        assert_eq!(rows[0].z, text("3"));
        assert_eq!(rows[1].y, text("5"));
        assert_eq!(rows[1].z, None);
    }

    #[test]
    fn test_parse_delimited_grid_refs() {
        let pasted = "N 15904 34671,Hill\nJ359276,Summit";
        let rows = parse_delimited(pasted).unwrap();
        assert_eq!(rows[0].grid_ref.as_deref(), Some("N 15904 34671"));
        assert_eq!(rows[1].id, text("Summit"));
    }

    #[test]
    fn test_parse_delimited_empty() {
        assert!(parse_delimited("").unwrap().is_empty());
    }
}
