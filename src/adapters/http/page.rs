use crate::config::AppConfig;
use crate::utils::error::Result;
use serde::Serialize;

pub const TITLE: &str = "Batch Coordinate Converter";
pub const DEFAULT_SOURCE: &str = "TM75 / Irish Grid - epsg:29903";
pub const DEFAULT_TARGET: &str = "WGS 84 - epsg:4326";

const TEMPLATE: &str = include_str!("../../../assets/index.html");

fn analytics_snippet(measurement_id: &str) -> String {
    format!(
        r#"<script async src="https://www.googletagmanager.com/gtag/js?id={id}"></script>
    <script>
      window.dataLayer = window.dataLayer || [];
      function gtag(){{dataLayer.push(arguments);}}
      gtag('js', new Date());
      gtag('config', '{id}');
    </script>"#,
        id = measurement_id
    )
}

#[derive(Serialize)]
struct InitialRow {
    x: u32,
    y: u32,
    id: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageSettings<'a> {
    base: String,
    max_rows: usize,
    default_source: &'a str,
    default_target: &'a str,
    default_style: &'a str,
    initial_rows: Vec<InitialRow>,
}

/// 頁面內嵌的初始設定，`</` 需跳脫以免提前結束 script 區塊
fn page_settings(config: &AppConfig) -> Result<String> {
    let base = if config.base_path.ends_with('/') {
        config.base_path.clone()
    } else {
        format!("{}/", config.base_path)
    };

    let settings = PageSettings {
        base,
        max_rows: config.max_rows,
        default_source: DEFAULT_SOURCE,
        default_target: DEFAULT_TARGET,
        default_style: &config.map.default_style,
        initial_rows: vec![
            InitialRow {
                x: 80367,
                y: 84425,
                id: "Corrán Tuathail",
            },
            InitialRow {
                x: 335793,
                y: 327689,
                id: "Slieve Donard",
            },
        ],
    };
    Ok(serde_json::to_string(&settings)?.replace("</", "<\\/"))
}

/// 啟動時產生一次完整頁面
pub fn render(config: &AppConfig) -> Result<String> {
    let analytics = config
        .analytics_id
        .as_deref()
        .map(analytics_snippet)
        .unwrap_or_default();

    Ok(TEMPLATE
        .replace("{{title}}", TITLE)
        .replace("{{analytics}}", &analytics)
        .replace("{{max_rows}}", &config.max_rows.to_string())
        .replace("{{settings}}", &page_settings(config)?))
}
