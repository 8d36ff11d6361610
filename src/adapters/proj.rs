use crate::domain::model::{
    CoordinateRow, CrsEntry, CrsIdentifier, RowConversionError, WGS84_CODE,
};
use crate::domain::ports::{CrsRegistry, Transformer};
use crate::utils::error::{ConverterError, Result};
use proj4rs::Proj;

#[derive(Debug, Clone)]
struct Definition {
    entry: CrsEntry,
    proj4: String,
}

impl Definition {
    fn new(code: u32, name: impl Into<String>, proj4: impl Into<String>) -> Self {
        let proj4 = proj4.into();
        Self {
            entry: CrsEntry {
                code,
                name: name.into(),
                geographic: is_geographic(&proj4),
            },
            proj4,
        }
    }
}

fn is_geographic(proj4: &str) -> bool {
    proj4
        .split_whitespace()
        .any(|token| token == "+proj=longlat" || token == "+proj=latlong")
}

fn proj4_param<'a>(proj4: &'a str, key: &str) -> Option<&'a str> {
    proj4.split_whitespace().find_map(|token| {
        token
            .strip_prefix('+')
            .and_then(|t| t.strip_prefix(key))
            .and_then(|t| t.strip_prefix('='))
    })
}

/// 橫麥卡托投影 (tmerc / etmerc / utm) 的中央經線，其他投影回傳 `None`
fn central_meridian(proj4: &str) -> Option<f64> {
    match proj4_param(proj4, "proj")? {
        "utm" => {
            let zone: u32 = proj4_param(proj4, "zone")?.parse().ok()?;
            (1..=60)
                .contains(&zone)
                .then(|| f64::from(zone) * 6.0 - 183.0)
        }
        "tmerc" | "etmerc" => Some(
            proj4_param(proj4, "lon_0")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0),
        ),
        _ => None,
    }
}

/// 距中央經線超過此經差時，橫麥卡托的輸出沒有意義
const MAX_MERIDIAN_OFFSET: f64 = 90.0;

/// WKT 的第一個引號字串即為座標系統名稱
fn name_from_wkt(wkt: &str) -> Option<&str> {
    let start = wkt.find('"')? + 1;
    let len = wkt[start..].find('"')?;
    Some(&wkt[start..start + len])
}

/// 常用座標系統。其他 EPSG 代碼由 `crs_definitions` 查詢。
fn curated_definitions() -> Vec<Definition> {
    let mut defs = vec![
        Definition::new(4326, "WGS 84", "+proj=longlat +datum=WGS84 +no_defs"),
        Definition::new(
            3857,
            "WGS 84 / Pseudo-Mercator",
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs",
        ),
        Definition::new(
            4258,
            "ETRS89",
            "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs",
        ),
        Definition::new(4269, "NAD83", "+proj=longlat +datum=NAD83 +no_defs"),
        Definition::new(
            4277,
            "OSGB36",
            "+proj=longlat +ellps=airy +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +no_defs",
        ),
        Definition::new(
            29903,
            "TM75 / Irish Grid",
            "+proj=tmerc +lat_0=53.5 +lon_0=-8 +k=1.000035 +x_0=200000 +y_0=250000 +ellps=mod_airy +towgs84=482.5,-130.6,564.6,-1.042,-0.214,-0.631,8.15 +units=m +no_defs",
        ),
        Definition::new(
            2157,
            "IRENET95 / Irish Transverse Mercator",
            "+proj=tmerc +lat_0=53.5 +lon_0=-8 +k=0.99982 +x_0=600000 +y_0=750000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        ),
        Definition::new(
            27700,
            "OSGB36 / British National Grid",
            "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=airy +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs",
        ),
        Definition::new(
            3035,
            "ETRS89-extended / LAEA Europe",
            "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        ),
        Definition::new(
            2154,
            "RGF93 v1 / Lambert-93",
            "+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        ),
    ];

    for zone in 1..=60u32 {
        defs.push(Definition::new(
            32600 + zone,
            format!("WGS 84 / UTM zone {}N", zone),
            format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs", zone),
        ));
        defs.push(Definition::new(
            32700 + zone,
            format!("WGS 84 / UTM zone {}S", zone),
            format!("+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs", zone),
        ));
    }

    for zone in 28..=38u32 {
        defs.push(Definition::new(
            25800 + zone,
            format!("ETRS89 / UTM zone {}N", zone),
            format!(
                "+proj=utm +zone={} +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
                zone
            ),
        ));
    }

    defs.sort_by_key(|def| def.entry.code);
    defs
}

/// 以 proj4rs 實作的座標系統註冊表
#[derive(Debug, Clone)]
pub struct ProjRegistry {
    curated: Vec<Definition>,
}

impl ProjRegistry {
    pub fn new() -> Self {
        let curated = curated_definitions();
        tracing::debug!("Loaded {} curated coordinate systems", curated.len());
        Self { curated }
    }

    fn lookup(&self, identifier: &CrsIdentifier) -> Result<Definition> {
        let code = identifier
            .epsg_code()
            .ok_or_else(|| ConverterError::CrsResolution {
                identifier: identifier.to_string(),
                reason: "expected an EPSG code such as EPSG:4326".to_string(),
            })?;

        if let Ok(pos) = self.curated.binary_search_by_key(&code, |def| def.entry.code) {
            return Ok(self.curated[pos].clone());
        }

        let def = u16::try_from(code)
            .ok()
            .and_then(crs_definitions::from_code)
            .ok_or_else(|| ConverterError::CrsResolution {
                identifier: identifier.to_string(),
                reason: format!("EPSG:{} is not in the registry", code),
            })?;

        if def.proj4.trim().is_empty() {
            return Err(ConverterError::CrsResolution {
                identifier: identifier.to_string(),
                reason: format!("EPSG:{} has no usable definition", code),
            });
        }

        let name = name_from_wkt(def.wkt)
            .map(str::to_string)
            .unwrap_or_else(|| format!("EPSG:{}", code));
        Ok(Definition::new(code, name, def.proj4))
    }

    fn build_proj(identifier: &CrsIdentifier, def: &Definition) -> Result<Proj> {
        Proj::from_proj_string(&def.proj4).map_err(|e| ConverterError::CrsResolution {
            identifier: identifier.to_string(),
            reason: format!("definition rejected by the transformation library: {}", e),
        })
    }
}

impl Default for ProjRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CrsRegistry for ProjRegistry {
    type Transformer = ProjTransformer;

    fn resolve(&self, identifier: &CrsIdentifier) -> Result<CrsEntry> {
        let def = self.lookup(identifier)?;
        Self::build_proj(identifier, &def)?;
        Ok(def.entry)
    }

    fn transformer(
        &self,
        source: &CrsIdentifier,
        target: &CrsIdentifier,
    ) -> Result<ProjTransformer> {
        let source_def = self.lookup(source)?;
        let target_def = self.lookup(target)?;
        let source_proj = Self::build_proj(source, &source_def)?;
        let target_proj = Self::build_proj(target, &target_def)?;

        // 投影為橫麥卡托時，需要每列的 WGS 84 經度來檢查目標範圍
        let meridian_check = match central_meridian(&target_def.proj4) {
            Some(meridian) => {
                let wgs84_id = CrsIdentifier::new(format!("EPSG:{}", WGS84_CODE));
                let wgs84_def = self.lookup(&wgs84_id)?;
                Some(MeridianCheck {
                    meridian,
                    wgs84: Self::build_proj(&wgs84_id, &wgs84_def)?,
                })
            }
            None => None,
        };

        tracing::debug!(
            "Resolved transformer EPSG:{} -> EPSG:{} (target meridian check: {})",
            source_def.entry.code,
            target_def.entry.code,
            meridian_check.is_some()
        );

        Ok(ProjTransformer {
            identity: source_def.entry.code == target_def.entry.code,
            source_geographic: source_def.entry.geographic,
            target_geographic: target_def.entry.geographic,
            source: source_proj,
            target: target_proj,
            meridian_check,
        })
    }

    fn search(&self, query: &str, limit: usize) -> Vec<CrsEntry> {
        let query = query.trim().to_lowercase();
        let mut results = Vec::new();

        // 直接輸入的代碼若不在常用清單中，仍然列出
        let exact = CrsIdentifier::new(query.as_str());
        if exact.epsg_code().is_some() {
            if let Ok(def) = self.lookup(&exact) {
                results.push(def.entry);
            }
        }

        for def in &self.curated {
            if results.len() >= limit {
                break;
            }
            if results.iter().any(|e: &CrsEntry| e.code == def.entry.code) {
                continue;
            }
            if query.is_empty() || def.entry.label().to_lowercase().contains(&query) {
                results.push(def.entry.clone());
            }
        }

        results.truncate(limit);
        results
    }
}

struct MeridianCheck {
    meridian: f64,
    wgs84: Proj,
}

pub struct ProjTransformer {
    source: Proj,
    target: Proj,
    source_geographic: bool,
    target_geographic: bool,
    identity: bool,
    meridian_check: Option<MeridianCheck>,
}

impl ProjTransformer {
    /// 列的 WGS 84 經度 (度)
    fn longitude(
        &self,
        wgs84: &Proj,
        row: &CoordinateRow,
    ) -> std::result::Result<f64, RowConversionError> {
        if self.source_geographic {
            return Ok(row.x);
        }
        let mut point = (row.x, row.y, 0.0);
        proj4rs::transform::transform(&self.source, wgs84, &mut point)
            .map_err(|e| RowConversionError::Library(e.to_string()))?;
        let lon = point.0.to_degrees();
        if !lon.is_finite() {
            return Err(RowConversionError::NonFinite);
        }
        Ok(lon)
    }

    fn check_target_domain(
        &self,
        row: &CoordinateRow,
    ) -> std::result::Result<(), RowConversionError> {
        let Some(check) = &self.meridian_check else {
            return Ok(());
        };

        let lon = self.longitude(&check.wgs84, row)?;
        let offset = (lon - check.meridian + 540.0).rem_euclid(360.0) - 180.0;
        if offset.abs() > MAX_MERIDIAN_OFFSET {
            return Err(RowConversionError::OutOfDomain(format!(
                "longitude {} is {:.1}° from the target projection's central meridian {}",
                lon,
                offset.abs(),
                check.meridian
            )));
        }
        Ok(())
    }

    fn check_domain(&self, row: &CoordinateRow) -> std::result::Result<(), RowConversionError> {
        if !row.x.is_finite() || !row.y.is_finite() || row.z.is_some_and(|z| !z.is_finite()) {
            return Err(RowConversionError::OutOfDomain(
                "input is not a finite number".to_string(),
            ));
        }
        if self.source_geographic {
            if row.y.abs() > 90.0 {
                return Err(RowConversionError::OutOfDomain(format!(
                    "latitude {} is outside [-90, 90]",
                    row.y
                )));
            }
            if row.x.abs() > 180.0 {
                return Err(RowConversionError::OutOfDomain(format!(
                    "longitude {} is outside [-180, 180]",
                    row.x
                )));
            }
        }
        Ok(())
    }
}

impl Transformer for ProjTransformer {
    fn transform(
        &self,
        row: &CoordinateRow,
    ) -> std::result::Result<(f64, f64, Option<f64>), RowConversionError> {
        self.check_domain(row)?;

        if self.identity {
            return Ok((row.x, row.y, row.z));
        }

        self.check_target_domain(row)?;

        // proj4rs 的地理座標以弧度表示
        let mut point = if self.source_geographic {
            (row.x.to_radians(), row.y.to_radians(), row.z.unwrap_or(0.0))
        } else {
            (row.x, row.y, row.z.unwrap_or(0.0))
        };

        proj4rs::transform::transform(&self.source, &self.target, &mut point)
            .map_err(|e| RowConversionError::Library(e.to_string()))?;

        let (mut x, mut y, z) = point;
        if self.target_geographic {
            x = x.to_degrees();
            y = y.to_degrees();
        }

        if !x.is_finite() || !y.is_finite() || !z.is_finite() {
            return Err(RowConversionError::NonFinite);
        }

        Ok((x, y, row.z.map(|_| z)))
    }
}
