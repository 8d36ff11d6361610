use crate::domain::model::{CoordinateRow, CrsEntry, CrsIdentifier, RowConversionError};
use crate::utils::error::Result;

/// 已解析的座標轉換器，可重複套用在每一列
pub trait Transformer {
    fn transform(
        &self,
        row: &CoordinateRow,
    ) -> std::result::Result<(f64, f64, Option<f64>), RowConversionError>;
}

/// 外部大地測量函式庫的座標系統註冊表
pub trait CrsRegistry: Send + Sync {
    type Transformer: Transformer;

    fn resolve(&self, identifier: &CrsIdentifier) -> Result<CrsEntry>;

    fn transformer(&self, source: &CrsIdentifier, target: &CrsIdentifier)
        -> Result<Self::Transformer>;

    fn search(&self, query: &str, limit: usize) -> Vec<CrsEntry>;
}
