use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// 100 km 方格字母，由南往北、由西往東排列 (不含 I)
const GRID: [[char; 5]; 5] = [
    ['V', 'W', 'X', 'Y', 'Z'],
    ['Q', 'R', 'S', 'T', 'U'],
    ['L', 'M', 'N', 'O', 'P'],
    ['F', 'G', 'H', 'J', 'K'],
    ['A', 'B', 'C', 'D', 'E'],
];

const SQUARE_SIZE: f64 = 100_000.0;
const MAX_DIGITS: usize = 5;

static SPACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z])\s+(\d{1,5})\s+(\d{1,5})$").expect("valid regex"));
static COMPACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z])(\d{0,10})$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridRefError {
    #[error("'{0}' is not an Irish grid reference (expected e.g. \"N 15904 34671\")")]
    Malformed(String),

    #[error("'{0}' is not an Irish grid square letter")]
    UnknownSquare(char),

    #[error("easting and northing in '{0}' must have the same number of digits")]
    UnevenDigits(String),
}

fn square_origin(letter: char) -> Result<(f64, f64), GridRefError> {
    GRID.iter()
        .enumerate()
        .find_map(|(row, letters)| {
            letters
                .iter()
                .position(|&l| l == letter)
                .map(|col| (col as f64 * SQUARE_SIZE, row as f64 * SQUARE_SIZE))
        })
        .ok_or(GridRefError::UnknownSquare(letter))
}

/// 數字位數少於 5 時補零至 1 公尺精度，例如 `159` 代表 15900 m
fn metres(digits: &str) -> f64 {
    let value: u32 = digits.parse().unwrap_or(0);
    let padding = MAX_DIGITS - digits.len();
    f64::from(value) * 10f64.powi(padding as i32)
}

/// 將帶字母的愛爾蘭網格參考 (例如 `"N 15904 34671"` 或 `"N1590434671"`)
/// 轉為 EPSG:29903 的東距與北距 (公尺)。
pub fn irish_grid_to_xy(reference: &str) -> Result<(f64, f64), GridRefError> {
    let normalized = reference.trim().to_uppercase();

    let (letter, easting, northing) = if let Some(caps) = SPACED.captures(&normalized) {
        let easting = caps[2].to_string();
        let northing = caps[3].to_string();
        if easting.len() != northing.len() {
            return Err(GridRefError::UnevenDigits(reference.to_string()));
        }
        (caps[1].chars().next(), easting, northing)
    } else if let Some(caps) = COMPACT.captures(&normalized) {
        let digits = &caps[2];
        if digits.len() % 2 != 0 {
            return Err(GridRefError::UnevenDigits(reference.to_string()));
        }
        let (easting, northing) = digits.split_at(digits.len() / 2);
        (caps[1].chars().next(), easting.to_string(), northing.to_string())
    } else {
        return Err(GridRefError::Malformed(reference.to_string()));
    };

    let letter = letter.ok_or_else(|| GridRefError::Malformed(reference.to_string()))?;
    let (origin_e, origin_n) = square_origin(letter)?;

    Ok((origin_e + metres(&easting), origin_n + metres(&northing)))
}
