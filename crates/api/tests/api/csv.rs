use axum::http::StatusCode;
use hyper::header;
use serde_json::json;

use crate::helpers::{body_text, post_json, spawn_app, MockChat, MockWeather};

#[tokio::test]
async fn csv_export_is_an_outer_join_attachment() {
    let test_app = spawn_app(MockWeather::new(), MockChat::new()).await;
    let body = json!({
        "location": {"lat": 31.8578, "lon": -116.6058},
        "data": {
            "velocidad_viento": {"2024-04-10T00:00:00": 3.5, "2024-04-10T03:00:00": 4.0},
            "precipitacion": {"2024-04-10T03:00:00": 0.0},
            "humedad": {},
            "temperatura": {"2024-04-10T06:00:00": 291.2, "2024-04-10T00:00:00": 288.1},
            "presion_superficie": {},
            "radiacion_solar": {},
            "radiacion_infrarroja": {"2024-04-10T00:00:00": 310.0}
        }
    });
    let response = post_json(&test_app.app, "/csv/generate", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=datos_meteorologicos_lat31.8578_lon-116.6058.csv"
    );

    let csv = body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Timestamp,velocidad_viento,precipitacion,humedad,temperatura,presion_superficie,radiacion_solar,radiacion_infrarroja",
            "2024-04-10T00:00:00,3.5,,,288.1,,,310",
            "2024-04-10T03:00:00,4,0,,,,,",
            "2024-04-10T06:00:00,,,,291.2,,,",
        ]
    );
}

#[tokio::test]
async fn csv_export_requires_every_variable() {
    let test_app = spawn_app(MockWeather::new(), MockChat::new()).await;
    let body = json!({
        "location": {"lat": 31.8578, "lon": -116.6058},
        "data": {"temperatura": {"2024-04-10T00:00:00": 288.1}}
    });
    let response = post_json(&test_app.app, "/csv/generate/", body).await;

    assert!(response.status().is_client_error());
}
