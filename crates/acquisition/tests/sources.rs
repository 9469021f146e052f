use std::{collections::HashMap, sync::Arc, time::Duration};

use acquisition::{
    authenticate_earthdata, authenticate_giovanni, find_variable, forecast_variables,
    AcquireError, Endpoints, FetchError, FetchOptions, FetchOrchestrator, GeoPoint,
    GiovanniSource, GranuleSource, HttpClient, SeriesMetadata, SourceConfig, TimeWindow,
    VariableQuery, VariableSource,
};
use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use nasa_weather_core::Credentials;
use serde_json::json;
use slog::{o, Discard, Logger};
use time::macros::datetime;
use tokio::net::TcpListener;

const BASIC_AUTH: &str = "Basic YWxpY2U6czNjcmV0";
const GIOVANNI_TOKEN: &str = "giovanni-token";
const EARTHDATA_TOKEN: &str = "earthdata-token";

const TIME_SERIES: &str = "prod_name,GLDAS_NOAH025_3H_2_1\n\
param_short_name,Tair_f_inst\n\
param_name,GLDAS_NOAH025_3H_2_1_Tair_f_inst\n\
unit_of_measure,K\n\
begin_time,2024-04-10T00:00:00Z\n\
end_time,2024-04-10T15:30:00Z\n\
time_resolution,3-hourly\n\
west_bound,-116.625\n\
east_bound,-116.5\n\
south_bound,31.75\n\
north_bound,31.875\n\
user_lat,31.8578\n\
user_lon,-116.6058\n\
\n\
Timestamp (UTC),Data\n\
2024-04-10T00:00:00,287.5\n\
2024-04-10T03:00:00,285.25\n\
2024-04-10T06:00:00,-9999\n";

/// Binds an ephemeral port and serves the router built for its base URL
async fn serve(build: impl FnOnce(&str) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let router = build(&base);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

fn endpoints(base: &str) -> Endpoints {
    Endpoints {
        giovanni_signin: format!("{}/signin", base),
        giovanni_timeseries: format!("{}/timeseries", base),
        earthdata_token: format!("{}/token", base),
        cmr_granules: format!("{}/granules.json", base),
    }
}

fn config(base: &str) -> SourceConfig {
    SourceConfig {
        endpoints: endpoints(base),
        request_timeout: Duration::from_secs(5),
        ..SourceConfig::new(Credentials::new("alice", "s3cret"))
    }
}

fn logger() -> Logger {
    Logger::root(Discard, o!())
}

fn http() -> HttpClient {
    HttpClient::new(logger(), "weather-tests", Duration::from_secs(5)).unwrap()
}

fn query() -> VariableQuery {
    VariableQuery::new(
        find_variable("temperatura").unwrap(),
        GeoPoint::new(31.8578, -116.6058).unwrap(),
        TimeWindow::parse("2024-04-10T00:00:00", "2024-04-10T15:30:00").unwrap(),
    )
}

fn has_basic_auth(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .is_some_and(|value| value == BASIC_AUTH)
}

async fn signin(headers: HeaderMap) -> Response {
    if !has_basic_auth(&headers) {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }
    format!("\"{}\"\n", GIOVANNI_TOKEN).into_response()
}

async fn time_series(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !headers
        .get("authorizationtoken")
        .is_some_and(|value| value == GIOVANNI_TOKEN)
    {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    let expected_params = params
        .get("data")
        .is_some_and(|data| data.ends_with("Tair_f_inst"))
        && params.get("location").map(String::as_str) == Some("[31.8578,-116.6058]")
        && params.get("time").map(String::as_str)
            == Some("2024-04-10T00:00:00/2024-04-10T15:30:00");
    if !expected_params {
        return (StatusCode::BAD_REQUEST, "unexpected query").into_response();
    }
    TIME_SERIES.into_response()
}

async fn earthdata_token(headers: HeaderMap) -> Response {
    if !has_basic_auth(&headers) {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }
    Json(json!({
        "access_token": EARTHDATA_TOKEN,
        "token_type": "Bearer",
        "expiration_date": "12/31/2026"
    }))
    .into_response()
}

fn has_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .is_some_and(|value| value == format!("Bearer {}", EARTHDATA_TOKEN).as_str())
}

#[tokio::test]
async fn giovanni_source_parses_served_series() {
    let base = serve(|_| {
        Router::new()
            .route("/signin", get(signin))
            .route("/timeseries", get(time_series))
    })
    .await;

    let data = GiovanniSource::new(logger(), config(&base))
        .acquire(query())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(data.descriptor.name, "temperatura");
    let values: Vec<_> = data.series.readings().iter().map(|r| r.value).collect();
    assert_eq!(values, vec![Some(287.5), Some(285.25), None]);
    assert_eq!(
        data.series.readings()[1].time,
        datetime!(2024-04-10 03:00:00 UTC)
    );
    match data.metadata {
        SeriesMetadata::Header(header) => assert_eq!(header.get("unit_of_measure"), Some("K")),
        other => panic!("unexpected metadata: {other:?}"),
    }
}

#[tokio::test]
async fn rejected_sign_in_aborts_the_batch() {
    let base = serve(|_| {
        Router::new().route(
            "/signin",
            get(|| async { (StatusCode::UNAUTHORIZED, "bad credentials") }),
        )
    })
    .await;

    let source = GiovanniSource::new(logger(), config(&base));
    let err = source.acquire(query()).await.unwrap_err();
    match err {
        AcquireError::Authentication(reason) => {
            assert!(reason.contains("401"));
            assert!(reason.contains("bad credentials"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let window = TimeWindow::parse("2024-04-10T00:00:00", "2024-04-10T15:30:00").unwrap();
    let err = FetchOrchestrator::new(logger(), Arc::new(source), FetchOptions::default())
        .fetch(
            &forecast_variables(),
            GeoPoint::new(31.8578, -116.6058).unwrap(),
            window,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Authentication { .. }));
}

#[tokio::test]
async fn forbidden_time_series_is_an_authentication_error() {
    let base = serve(|_| {
        Router::new()
            .route("/signin", get(signin))
            .route(
                "/timeseries",
                get(|| async { (StatusCode::FORBIDDEN, "token expired") }),
            )
    })
    .await;

    let err = GiovanniSource::new(logger(), config(&base))
        .acquire(query())
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::Authentication(_)));
}

#[tokio::test]
async fn giovanni_sign_in_needs_exactly_200() {
    let base = serve(|_| {
        Router::new()
            .route("/signin", get(signin))
            .route(
                "/accepted/signin",
                get(|| async { (StatusCode::ACCEPTED, "\"pending\"") }),
            )
            .route("/empty/signin", get(|| async { "\"\"\n" }))
    })
    .await;
    let credentials = Credentials::new("alice", "s3cret");

    let session = authenticate_giovanni(&http(), &endpoints(&base), &credentials)
        .await
        .unwrap();
    assert_eq!(session.token(), GIOVANNI_TOKEN);

    let accepted = endpoints(&format!("{}/accepted", base));
    let err = authenticate_giovanni(&http(), &accepted, &credentials)
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::Authentication(ref reason) if reason.contains("202")));

    let empty = endpoints(&format!("{}/empty", base));
    let err = authenticate_giovanni(&http(), &empty, &credentials)
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::Authentication(_)));
}

#[tokio::test]
async fn earthdata_login_reads_bearer_token() {
    let base = serve(|_| Router::new().route("/token", post(earthdata_token))).await;

    let session = authenticate_earthdata(
        &http(),
        &endpoints(&base),
        &Credentials::new("alice", "s3cret"),
    )
    .await
    .unwrap();
    assert_eq!(session.access_token(), EARTHDATA_TOKEN);
    assert_eq!(session.expires(), Some("12/31/2026"));

    let err = authenticate_earthdata(
        &http(),
        &endpoints(&base),
        &Credentials::new("alice", "wrong"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AcquireError::Authentication(ref reason) if reason.contains("401")));
}

#[tokio::test]
async fn empty_granule_feed_is_no_data() {
    let base = serve(|_| {
        Router::new()
            .route("/token", post(earthdata_token))
            .route(
                "/granules.json",
                get(|headers: HeaderMap| async move {
                    if !has_bearer(&headers) {
                        return (StatusCode::UNAUTHORIZED, "missing bearer").into_response();
                    }
                    Json(json!({"feed": {"entry": []}})).into_response()
                }),
            )
    })
    .await;

    let found = GranuleSource::new(logger(), config(&base))
        .acquire(query())
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn unreadable_granules_surface_the_error() {
    let base = serve(|base| {
        let feed = json!({"feed": {"entry": [
            {
                "id": "G1",
                "title": "GLDAS_NOAH025_3H.A20240410.0000.021.nc4",
                "time_start": "2024-04-10T00:00:00.000Z",
                "links": [{
                    "rel": "http://esipfed.org/ns/fedsearch/1.1/data#",
                    "href": format!("{}/files/G1.nc4", base)
                }]
            },
            {
                "id": "G2",
                "title": "GLDAS_NOAH025_3H.A20240410.0300.021.nc4",
                "time_start": "2024-04-10T03:00:00.000Z",
                "links": [{
                    "rel": "http://esipfed.org/ns/fedsearch/1.1/data#",
                    "href": format!("{}/files/G2.nc4", base)
                }]
            }
        ]}});
        Router::new()
            .route("/token", post(earthdata_token))
            .route(
                "/granules.json",
                get(move || async move { Json(feed) }),
            )
            .route("/files/{name}", get(|| async { "not a netcdf file" }))
    })
    .await;

    let result = GranuleSource::new(logger(), config(&base))
        .acquire(query())
        .await;
    let err = match result {
        Err(err) => err,
        Ok(found) => panic!("expected an error, got {:?}", found.map(|d| d.series.len())),
    };
    #[cfg(not(feature = "netcdf"))]
    assert!(matches!(err, AcquireError::Unsupported(_)));
    #[cfg(feature = "netcdf")]
    assert!(!matches!(err, AcquireError::Authentication(_)));
}
