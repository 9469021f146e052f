use axum::http::StatusCode;
use serde_json::{json, Value};
use time::macros::datetime;
use weather_api::LlmError;

use crate::helpers::{body_text, post_json, spawn_app, temperature_summary, MockChat, MockWeather};

fn request_body() -> Value {
    json!({
        "time": {"day": 10, "month": 4, "start_time": "15:30", "end_time": "18:00"},
        "location": {"lat": 31.8578, "lon": -116.6058},
        "plan": "hiking in the afternoon"
    })
}

#[tokio::test]
async fn forecast_json_is_returned_verbatim() {
    let mut weather = MockWeather::new();
    weather
        .expect_summarize()
        .withf(|point, window| {
            point.lat == 31.8578
                && window.start == datetime!(2024-04-10 00:00:00 UTC)
                && window.end == datetime!(2024-04-10 15:30:00 UTC)
        })
        .times(1)
        .returning(|_, _| Ok(temperature_summary()));

    let mut chat = MockChat::new();
    chat.expect_complete()
        .withf(|prompt| {
            prompt.contains("User plan: hiking in the afternoon")
                && prompt.contains("\"temperatura\"")
                && prompt.contains("from 15:30 to 18:00")
        })
        .times(1)
        .returning(|_| {
            Ok(r#"{"summary": {"temperatura": 291.0}, "data": {}, "recomendations": ["Bring water"]}"#
                .to_string())
        });

    let test_app = spawn_app(weather, chat).await;
    let response = post_json(&test_app.app, "/predict/weather", request_body()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let forecast: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(forecast["summary"]["temperatura"], 291.0);
    assert_eq!(forecast["recomendations"][0], "Bring water");
}

#[tokio::test]
async fn trailing_slash_is_routed() {
    let mut weather = MockWeather::new();
    weather
        .expect_summarize()
        .returning(|_, _| Ok(temperature_summary()));
    let mut chat = MockChat::new();
    chat.expect_complete()
        .returning(|_| Ok(r#"{"summary": {}}"#.to_string()));

    let test_app = spawn_app(weather, chat).await;
    let response = post_json(&test_app.app, "/predict/weather/", request_body()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_json_reply_is_a_server_error() {
    let mut weather = MockWeather::new();
    weather
        .expect_summarize()
        .returning(|_, _| Ok(temperature_summary()));
    let mut chat = MockChat::new();
    chat.expect_complete()
        .returning(|_| Ok("Here is your forecast: sunny all day".to_string()));

    let test_app = spawn_app(weather, chat).await;
    let response = post_json(&test_app.app, "/predict/weather", request_body()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("not valid JSON"));
}

#[tokio::test]
async fn exhausted_models_are_a_server_error() {
    let mut weather = MockWeather::new();
    weather
        .expect_summarize()
        .returning(|_, _| Ok(temperature_summary()));
    let mut chat = MockChat::new();
    chat.expect_complete().returning(|_| {
        Err(LlmError::Exhausted {
            attempts: 3,
            last_error: "invalid api key".into(),
        })
    });

    let test_app = spawn_app(weather, chat).await;
    let response = post_json(&test_app.app, "/predict/weather", request_body()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("invalid api key"));
}

#[tokio::test]
async fn invalid_time_is_rejected_before_fetching() {
    let mut weather = MockWeather::new();
    weather.expect_summarize().times(0);
    let mut chat = MockChat::new();
    chat.expect_complete().times(0);

    let test_app = spawn_app(weather, chat).await;
    let body = json!({
        "time": {"day": 10, "month": 13, "start_time": "15:30", "end_time": "18:00"},
        "location": {"lat": 31.8578, "lon": -116.6058}
    });
    let response = post_json(&test_app.app, "/predict/weather", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("month"));
}
