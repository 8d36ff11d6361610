use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const WGS84_CODE: u32 = 4326;
pub const IRISH_GRID_CODE: u32 = 29903;

/// 一筆座標資料。`x` 為東距或經度，`y` 為北距或緯度。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRow {
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl CoordinateRow {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            label: None,
            x,
            y,
            z: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }
}

/// 使用者輸入的座標參考系統識別碼，尚未經過註冊表驗證
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrsIdentifier(String);

impl CrsIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 解析 EPSG 代碼。接受 `EPSG:4326`、`epsg:4326`、`4326`
    /// 以及下拉選單標籤 `WGS 84 - epsg:4326`。
    pub fn epsg_code(&self) -> Option<u32> {
        let value = self.0.trim();
        let lower = value.to_ascii_lowercase();
        let digits = match lower.rfind("epsg:") {
            Some(pos) => &value[pos + "epsg:".len()..],
            None => value,
        };
        digits.trim().parse::<u32>().ok()
    }
}

impl fmt::Display for CrsIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CrsIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 註冊表中的一個座標系統
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrsEntry {
    pub code: u32,
    pub name: String,
    pub geographic: bool,
}

impl CrsEntry {
    /// 下拉選單顯示用標籤，格式與 `CrsIdentifier::epsg_code` 相容
    pub fn label(&self) -> String {
        format!("{} - epsg:{}", self.name, self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RowConversionError {
    #[error("transformation failed: {0}")]
    Library(String),

    #[error("transformation produced a non-finite coordinate")]
    NonFinite,

    #[error("coordinate outside the valid domain: {0}")]
    OutOfDomain(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Converted { output: CoordinateRow },
    Failed { error: RowConversionError },
}

/// 單列轉換結果，`index` 為非空白輸入列的位置 (從 0 起算)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub index: usize,
    pub input: CoordinateRow,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

impl ConversionResult {
    pub fn output(&self) -> Option<&CoordinateRow> {
        match &self.outcome {
            RowOutcome::Converted { output } => Some(output),
            RowOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RowConversionError> {
        match &self.outcome {
            RowOutcome::Converted { .. } => None,
            RowOutcome::Failed { error } => Some(error),
        }
    }

    pub fn is_converted(&self) -> bool {
        self.output().is_some()
    }

    /// 顯示用的列號 (從 1 起算)，表格、地圖與匯出檔共用
    pub fn row_number(&self) -> usize {
        self.index + 1
    }
}

/// 地圖標記 (WGS 84)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub index: usize,
    pub row: usize,
    pub label: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub source: (f64, f64),
    pub converted: (f64, f64),
    pub maps_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub name: String,
    pub url: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationWarning {
    #[error("MAPBOX_TOKEN is not set; the basemap is disabled. Register a token at https://docs.mapbox.com/help/getting-started/access-tokens/")]
    MissingMapToken,
}
