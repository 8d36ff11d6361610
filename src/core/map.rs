use crate::core::{
    ConfigurationWarning, ConversionResult, CrsIdentifier, CrsRegistry, Marker, TileLayer,
    Transformer, WGS84_CODE,
};
use crate::utils::error::Result;

pub const MAPBOX_URL_TEMPLATE: &str =
    "https://api.mapbox.com/styles/v1/mapbox/{id}/tiles/{z}/{x}/{y}{r}?access_token={access_token}";

pub const DEFAULT_STYLES: [&str; 5] = [
    "light-v9",
    "dark-v9",
    "streets-v9",
    "outdoors-v9",
    "satellite-streets-v9",
];

pub const DEFAULT_STYLE: &str = "satellite-streets-v9";

/// 每個樣式一個底圖圖層。樣板需要 token 但未設定時不提供底圖並回傳警告。
pub fn tile_layers(
    template: &str,
    token: Option<&str>,
    styles: &[String],
    default_style: &str,
) -> (Vec<TileLayer>, Vec<ConfigurationWarning>) {
    let token = token.map(str::trim).filter(|t| !t.is_empty());
    if template.contains("{access_token}") && token.is_none() {
        return (Vec::new(), vec![ConfigurationWarning::MissingMapToken]);
    }

    let layers = styles
        .iter()
        .map(|style| TileLayer {
            name: style.clone(),
            url: template
                .replace("{id}", style)
                .replace("{access_token}", token.unwrap_or_default()),
            checked: style == default_style,
        })
        .collect();

    (layers, Vec::new())
}

pub fn google_maps_url(lat: f64, lon: f64) -> String {
    format!("https://www.google.com/maps?q={},{}&t=k&z=16", lat, lon)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// WGS 84 的位置來源
enum Position<T> {
    Source,
    Target,
    Transform(T),
}

/// 為每一筆成功轉換的資料建立地圖標記。
///
/// 來源為 WGS 84 時直接使用輸入座標，目標為 WGS 84 時使用輸出座標，
/// 否則將輸入座標轉為 WGS 84。無法定位的列不產生標記。
pub fn markers<R: CrsRegistry>(
    registry: &R,
    results: &[ConversionResult],
    source: &CrsIdentifier,
    target: &CrsIdentifier,
) -> Result<Vec<Marker>> {
    let position = if source.epsg_code() == Some(WGS84_CODE) {
        Position::Source
    } else if target.epsg_code() == Some(WGS84_CODE) {
        Position::Target
    } else {
        let wgs84 = CrsIdentifier::new(format!("EPSG:{}", WGS84_CODE));
        Position::Transform(registry.transformer(source, &wgs84)?)
    };

    let mut markers = Vec::new();
    for result in results {
        let Some(output) = result.output() else {
            continue;
        };

        let lon_lat = match &position {
            Position::Source => Some((result.input.x, result.input.y)),
            Position::Target => Some((output.x, output.y)),
            Position::Transform(transformer) => transformer
                .transform(&result.input)
                .ok()
                .map(|(x, y, _)| (x, y)),
        };

        let Some((lon, lat)) = lon_lat else {
            tracing::debug!("Row {} has no WGS 84 position, skipping marker", result.index);
            continue;
        };

        markers.push(Marker {
            index: result.index,
            row: result.row_number(),
            label: result.input.label.clone(),
            lat,
            lon,
            source: (result.input.x, result.input.y),
            converted: (round2(output.x), round2(output.y)),
            maps_url: google_maps_url(lat, lon),
        });
    }

    Ok(markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::proj::ProjRegistry;
    use crate::core::convert::Converter;
    use crate::core::CoordinateRow;

    fn styles() -> Vec<String> {
        DEFAULT_STYLES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tile_layers_with_token() {
        let (layers, warnings) = tile_layers(MAPBOX_URL_TEMPLATE, Some("pk.test"), &styles(), DEFAULT_STYLE);

        assert!(warnings.is_empty());
        assert_eq!(layers.len(), 5);
        assert_eq!(
            layers[0].url,
            "https://api.mapbox.com/styles/v1/mapbox/light-v9/tiles/{z}/{x}/{y}{r}?access_token=pk.test"
        );
        assert_eq!(layers.iter().filter(|l| l.checked).count(), 1);
        assert!(layers[4].checked);
    }

    #[test]
    fn test_tile_layers_without_token_warns() {
        let (layers, warnings) = tile_layers(MAPBOX_URL_TEMPLATE, None, &styles(), DEFAULT_STYLE);
        assert!(layers.is_empty());
        assert_eq!(warnings, vec![ConfigurationWarning::MissingMapToken]);

        let (layers, _) = tile_layers(MAPBOX_URL_TEMPLATE, Some("  "), &styles(), DEFAULT_STYLE);
        assert!(layers.is_empty());
    }

    #[test]
    fn test_template_without_token_placeholder() {
        let template = "https://tiles.example.com/{id}/{z}/{x}/{y}.png";
        let (layers, warnings) = tile_layers(template, None, &styles(), DEFAULT_STYLE);
        assert!(warnings.is_empty());
        assert_eq!(layers[1].url, "https://tiles.example.com/dark-v9/{z}/{x}/{y}.png");
    }

    #[test]
    fn test_markers_use_target_when_wgs84() {
        let converter = Converter::new(ProjRegistry::new());
        let source = CrsIdentifier::new("EPSG:32632");
        let target = CrsIdentifier::new("EPSG:4326");
        let rows = vec![CoordinateRow::new(500000.0, 0.0).with_label("equator")];

        let results = converter.convert(&rows, &source, &target).unwrap();
        let markers = markers(converter.registry(), &results, &source, &target).unwrap();

        assert_eq!(markers.len(), 1);
        assert!((markers[0].lon - 9.0).abs() < 1e-6);
        assert_eq!(markers[0].label.as_deref(), Some("equator"));
        assert!(markers[0].maps_url.starts_with("https://www.google.com/maps?q="));
    }

    #[test]
    fn test_markers_transform_input_for_projected_pairs() {
        let converter = Converter::new(ProjRegistry::new());
        let source = CrsIdentifier::new("EPSG:32632");
        let target = CrsIdentifier::new("EPSG:3857");
        let rows = vec![CoordinateRow::new(500000.0, 5000000.0)];

        let results = converter.convert(&rows, &source, &target).unwrap();
        let markers = markers(converter.registry(), &results, &source, &target).unwrap();

        assert_eq!(markers.len(), 1);
        assert!((markers[0].lon - 9.0).abs() < 1e-6);
        assert!(markers[0].lat > 45.0 && markers[0].lat < 45.3);
    }

    #[test]
    fn test_failed_rows_have_no_marker() {
        let converter = Converter::new(ProjRegistry::new());
        let source = CrsIdentifier::new("EPSG:4326");
        let target = CrsIdentifier::new("EPSG:32632");
        let rows = vec![CoordinateRow::new(9.0, 95.0), CoordinateRow::new(9.0, 45.0)];

        let results = converter.convert(&rows, &source, &target).unwrap();
        let markers = markers(converter.registry(), &results, &source, &target).unwrap();

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].index, 1);
        assert_eq!(markers[0].row, 2);
        assert_eq!((markers[0].lon, markers[0].lat), (9.0, 45.0));
    }
}
