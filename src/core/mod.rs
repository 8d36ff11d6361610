pub mod convert;
pub mod export;
pub mod grid_ref;
pub mod map;
pub mod table;

pub use crate::domain::model::{
    ConfigurationWarning, ConversionResult, CoordinateRow, CrsEntry, CrsIdentifier, Marker,
    RowConversionError, RowOutcome, TileLayer, IRISH_GRID_CODE, WGS84_CODE,
};
pub use crate::domain::ports::{CrsRegistry, Transformer};
pub use crate::utils::error::Result;
