use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use batch_coord::{build_router, AppConfig, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BODY_LIMIT: usize = 4 * 1024 * 1024;

fn app_with(config: AppConfig) -> Router {
    build_router(Arc::new(AppState::new(config).expect("page renders")))
}

fn app() -> Router {
    app_with(AppConfig::default())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let response = app().oneshot(get("/health")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn test_index_page() -> Result<()> {
    let response = app().oneshot(get("/")).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await?;
    let page = String::from_utf8(bytes.to_vec())?;
    assert!(page.contains("<title>Batch Coordinate Converter</title>"));
    assert!(page.contains("TM75 / Irish Grid - epsg:29903"));
    Ok(())
}

#[tokio::test]
async fn test_crs_search() -> Result<()> {
    let response = app().oneshot(get("/api/crs?q=irish&limit=5")).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let options = json_body(response).await?;
    let options = options.as_array().expect("array of options");
    assert!(!options.is_empty() && options.len() <= 5);
    assert!(options
        .iter()
        .any(|o| o["label"] == "TM75 / Irish Grid - epsg:29903"));
    Ok(())
}

#[tokio::test]
async fn test_convert_reports_row_failures() -> Result<()> {
    let request = json!({
        "source_crs": "WGS 84 - epsg:4326",
        "target_crs": "EPSG:32632",
        "rows": [
            {"id": "ok", "x": 9.0, "y": 45.0},
            {"id": "bad", "x": "9", "y": "91"},
            {},
        ],
    });

    let response = app().oneshot(post_json("/api/convert", request)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert_eq!(body["converted"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["results"][0]["status"], "converted");
    assert_eq!(body["results"][1]["status"], "failed");
    assert_eq!(body["results"][1]["error"]["kind"], "out_of_domain");

    let markers = body["markers"].as_array().expect("markers");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["label"], "ok");
    assert_eq!(markers[0]["row"], 1);
    assert_eq!(markers[0]["lat"], 45.0);
    Ok(())
}

#[tokio::test]
async fn test_convert_unknown_crs_is_unprocessable() -> Result<()> {
    let request = json!({
        "source_crs": "EPSG:999999",
        "target_crs": "EPSG:4326",
        "rows": [{"x": 1, "y": 2}],
    });

    let response = app().oneshot(post_json("/api/convert", request)).await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await?;
    assert_eq!(body["category"], "input");
    assert!(body["error"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn test_convert_bad_cell_is_bad_request() -> Result<()> {
    let request = json!({
        "source_crs": "EPSG:4326",
        "target_crs": "EPSG:3857",
        "rows": [{"x": "abc", "y": 2}],
    });

    let response = app().oneshot(post_json("/api/convert", request)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_convert_over_limit() -> Result<()> {
    let config = AppConfig {
        max_rows: 1,
        ..AppConfig::default()
    };
    let request = json!({
        "source_crs": "EPSG:4326",
        "target_crs": "EPSG:3857",
        "rows": [{"x": 1, "y": 2}, {"x": 3, "y": 4}],
    });

    let response = app_with(config)
        .oneshot(post_json("/api/convert", request))
        .await?;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}

#[tokio::test]
async fn test_export_csv_attachment() -> Result<()> {
    let request = json!({
        "source_crs": "EPSG:29903",
        "target_crs": "EPSG:4326",
        "rows": [{"id": "Slieve Donard", "x": 335793, "y": 327689}],
    });

    let response = app()
        .oneshot(post_json("/api/export?format=csv", request))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert!(headers[header::CONTENT_TYPE]
        .to_str()?
        .starts_with("text/csv"));
    let disposition = headers[header::CONTENT_DISPOSITION].to_str()?.to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("converted_epsg29903_to_epsg4326_"));
    assert!(disposition.contains(".csv"));

    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await?;
    let text = String::from_utf8(bytes.to_vec())?;
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("index,id,x_src,y_src,z_src,x_res,y_res,z_res,status,error")
    );
    assert!(lines.next().is_some_and(|l| l.starts_with("1,Slieve Donard,")));
    Ok(())
}

#[tokio::test]
async fn test_export_numbers_rows_like_the_result_table() -> Result<()> {
    let request = json!({
        "source_crs": "EPSG:4326",
        "target_crs": "EPSG:32632",
        "rows": [
            {"id": "first", "x": 9.0, "y": 45.0},
            {},
            {"id": "far", "x": -170.0, "y": 45.0},
        ],
    });

    let response = app()
        .oneshot(post_json("/api/export?format=tsv", request))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await?;
    let text = String::from_utf8(bytes.to_vec())?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1\tfirst\t"));
    assert!(lines[2].starts_with("2\tfar\t"));
    assert!(lines[2].contains("\tERROR\tERROR\tERROR\tfailed\t"));
    Ok(())
}

#[tokio::test]
async fn test_parse_pasted_table() -> Result<()> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/table")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("80367\t84425\tA1\n335793\t327689\tA2\n"))?;

    let response = app().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    let rows = body["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["id"], "A2");
    Ok(())
}

#[tokio::test]
async fn test_map_config_warns_without_token() -> Result<()> {
    let response = app().oneshot(get("/api/map")).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    let warnings = body["warnings"].as_array().expect("warnings");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap_or_default().contains("MAPBOX_TOKEN"));
    Ok(())
}

#[tokio::test]
async fn test_map_config_with_token() -> Result<()> {
    let mut config = AppConfig::default();
    config.map.token = Some("pk.test".to_string());

    let response = app_with(config).oneshot(get("/api/map")).await?;
    let body = json_body(response).await?;

    assert!(body["warnings"].as_array().is_some_and(Vec::is_empty));
    let layers = body["layers"].as_array().expect("layers");
    assert_eq!(layers.len(), 5);
    assert_eq!(
        layers.iter().filter(|l| l["checked"] == true).count(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn test_base_path_mount() -> Result<()> {
    let config = AppConfig {
        base_path: "/batch-coordinate-converter".to_string(),
        ..AppConfig::default()
    };
    let app = app_with(config);

    let response = app
        .clone()
        .oneshot(get("/batch-coordinate-converter/api/crs?q=4326"))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/batch-coordinate-converter/"))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/health")).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/crs")).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
