use std::{collections::BTreeMap, sync::Arc};

use acquisition::{FetchError, GeoPoint, TimeWindow};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    Router,
};
use hyper::{header, Method};
use mockall::mock;
use serde_json::Value;
use tower::ServiceExt;
use weather_api::{
    app, AppState, ChatCompletion, LlmError, SeriesPoint, SeriesStats, VariableSummary,
    WeatherService, WeatherSummary,
};

mock! {
    pub Weather {}
    #[async_trait]
    impl WeatherService for Weather {
        async fn summarize(
            &self,
            point: GeoPoint,
            window: TimeWindow,
        ) -> Result<WeatherSummary, FetchError>;
    }
}

mock! {
    pub Chat {}
    #[async_trait]
    impl ChatCompletion for Chat {
        async fn complete(&self, prompt: String) -> Result<String, LlmError>;
    }
}

pub struct TestApp {
    pub app: Router,
}

pub async fn spawn_app(weather: MockWeather, chat: MockChat) -> TestApp {
    let app_state = AppState {
        weather: Arc::new(weather),
        chat: Arc::new(chat),
        reference_year: 2024,
    };
    TestApp { app: app(app_state) }
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    app.clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.")
}

pub async fn body_text(response: Response) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub fn temperature_summary() -> WeatherSummary {
    let mut variables = BTreeMap::new();
    variables.insert(
        "temperatura".to_string(),
        VariableSummary {
            stats: SeriesStats {
                min: 288.0,
                max: 294.0,
                mean: 291.0,
            },
            data: vec![
                SeriesPoint {
                    time: "2024-04-10T00:00:00".into(),
                    value: Some(288.0),
                },
                SeriesPoint {
                    time: "2024-04-10T03:00:00".into(),
                    value: Some(294.0),
                },
            ],
        },
    );
    WeatherSummary {
        variables,
        cloudiness: None,
        missing: vec!["precipitacion".into()],
    }
}
