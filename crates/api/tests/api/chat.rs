use acquisition::{FailureReason, FetchError, VariableFailure};
use axum::http::StatusCode;
use serde_json::{json, Value};
use weather_api::LlmError;

use crate::helpers::{body_text, post_json, spawn_app, temperature_summary, MockChat, MockWeather};

#[tokio::test]
async fn weather_chat_wraps_reply_in_res() {
    let mut weather = MockWeather::new();
    weather
        .expect_summarize()
        .times(1)
        .returning(|_, _| Ok(temperature_summary()));
    let mut chat = MockChat::new();
    chat.expect_complete()
        .withf(|prompt| prompt.contains("the person's plan: picnic at noon"))
        .times(1)
        .returning(|_| Ok("A picnic sounds great, bring sunscreen.".to_string()));

    let test_app = spawn_app(weather, chat).await;
    let body = json!({
        "prompt": "picnic at noon",
        "time": {"day": 10, "month": 4, "start_time": "12:00", "end_time": "14:00"},
        "location": {"lat": 31.8578, "lon": -116.6058}
    });
    let response = post_json(&test_app.app, "/chat/weather", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let reply: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(reply, json!({"res": "A picnic sounds great, bring sunscreen."}));
}

#[tokio::test]
async fn weather_chat_without_data_is_a_server_error() {
    let mut weather = MockWeather::new();
    weather.expect_summarize().returning(|_, _| {
        Err(FetchError::NoDataAvailable {
            failures: vec![VariableFailure {
                variable: "temperatura".into(),
                reason: FailureReason::NoDataFound,
            }],
        })
    });
    let mut chat = MockChat::new();
    chat.expect_complete().times(0);

    let test_app = spawn_app(weather, chat).await;
    let body = json!({
        "prompt": "picnic",
        "time": {"day": 10, "month": 4, "start_time": "12:00", "end_time": "14:00"},
        "location": {"lat": 31.8578, "lon": -116.6058}
    });
    let response = post_json(&test_app.app, "/chat/weather/", body).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .contains("no weather variable could be fetched"));
}

#[tokio::test]
async fn simple_chat_adds_context() {
    let weather = MockWeather::new();
    let mut chat = MockChat::new();
    chat.expect_complete()
        .withf(|prompt| {
            prompt.contains("User's current location: Ensenada (Latitude: 31.8578, Longitude: -116.6058)")
                && prompt.contains("- Cloudiness: clear")
                && prompt.contains("1. Wear a hat")
                && prompt.ends_with("User's question: Should I go surfing?\n")
        })
        .times(1)
        .returning(|_| Ok("Yes, conditions look good.".to_string()));

    let test_app = spawn_app(weather, chat).await;
    let body = json!({
        "prompt": "Should I go surfing?",
        "location": {"lat": 31.8578, "lon": -116.6058, "address": "Ensenada"},
        "current_time": "2024-04-10T09:00:00",
        "weather_data": {
            "data": {"summary": {"nubosidad": "clear"}},
            "recomendations": ["Wear a hat"]
        }
    });
    let response = post_json(&test_app.app, "/chat/simple", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let reply: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        reply,
        json!({"response": "Yes, conditions look good.", "status": "success"})
    );
}

#[tokio::test]
async fn simple_chat_without_context_sends_prompt_as_is() {
    let weather = MockWeather::new();
    let mut chat = MockChat::new();
    chat.expect_complete()
        .withf(|prompt| prompt == "hello")
        .times(1)
        .returning(|_| Ok("hi".to_string()));

    let test_app = spawn_app(weather, chat).await;
    let response = post_json(&test_app.app, "/chat/simple/", json!({"prompt": "hello"})).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn simple_chat_failure_keeps_response_shape() {
    let weather = MockWeather::new();
    let mut chat = MockChat::new();
    chat.expect_complete().returning(|_| {
        Err(LlmError::Exhausted {
            attempts: 3,
            last_error: "rate limited".into(),
        })
    });

    let test_app = spawn_app(weather, chat).await;
    let response = post_json(&test_app.app, "/chat/simple", json!({"prompt": "hello"})).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let reply: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(reply["status"], "error");
    let text = reply["response"].as_str().unwrap();
    assert!(text.starts_with("Error: "));
    assert!(text.contains("rate limited"));
}
