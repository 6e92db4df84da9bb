//! End-to-end pipeline tests over a live mock server.
//!
//! These run the default reqwest transport against wiremock, so they cover
//! what the unit suites cannot: real wire encoding of urls, params, headers
//! and bodies, and real decode behavior from live responses.

use courier::{
    Body, HttpClient, PipelineClient, Recovery, RequestConfig, RequestOptions, ResponseType,
    StatusCode,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with(mock: Mock) -> MockServer {
    let server = MockServer::start().await;
    mock.mount(&server).await;
    server
}

// =============================================================================
// Plain client round trips
// =============================================================================

#[tokio::test]
async fn test_get_json_round_trip() {
    let server = server_with(
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}]))),
    )
    .await;

    let client = HttpClient::new(RequestOptions::new().base_url(server.uri()));
    let response = client.get("/users", RequestOptions::new()).await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.json::<Value>().unwrap(), json!([{"id": 1}]));
}

#[tokio::test]
async fn test_params_encoded_on_the_wire() {
    let server = server_with(
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "hello world"))
            .and(query_param("tags", "a"))
            .and(query_param("tags", "b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 0}))),
    )
    .await;

    let client = HttpClient::new(RequestOptions::new().base_url(server.uri()));
    let response = client
        .get(
            "/search",
            RequestOptions::new()
                .param("q", "hello world")
                .param("tags", json!(["a", "b"])),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_post_json_body_round_trip() {
    let server = server_with(
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"name": "Test User"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7}))),
    )
    .await;

    let client = HttpClient::new(
        RequestOptions::new()
            .base_url(server.uri())
            .header("Content-Type", "application/json"),
    );
    let response = client
        .post(
            "/users",
            Some(Body::Json(json!({"name": "Test User"}))),
            RequestOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json::<Value>().unwrap(), json!({"id": 7}));
}

#[tokio::test]
async fn test_error_status_carries_body_message() {
    let server = server_with(
        Mock::given(method("GET")).and(path("/missing")).respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
        ),
    )
    .await;

    let client = HttpClient::new(RequestOptions::new().base_url(server.uri()));
    let err = client
        .get("/missing", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(err.is_status());
    assert_eq!(err.message, "Not Found");
    assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
    assert!(err.response.is_some());
}

#[tokio::test]
async fn test_text_response_sniffed_from_content_type() {
    let server = server_with(
        Mock::given(method("GET"))
            .and(path("/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string("just text")),
    )
    .await;

    let client = HttpClient::new(RequestOptions::new().base_url(server.uri()));
    let response = client.get("/plain", RequestOptions::new()).await.unwrap();

    assert_eq!(response.text(), Some("just text"));
}

#[tokio::test]
async fn test_explicit_bytes_response_type() {
    let server = server_with(
        Mock::given(method("GET"))
            .and(path("/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8, 159, 146, 150])),
    )
    .await;

    let client = HttpClient::new(RequestOptions::new().base_url(server.uri()));
    let response = client
        .get(
            "/raw",
            RequestOptions::new().response_type(ResponseType::Bytes),
        )
        .await
        .unwrap();

    assert_eq!(
        response.bytes().map(|b| b.as_ref()),
        Some(&[0u8, 159, 146, 150][..])
    );
}

#[tokio::test]
async fn test_stream_response_type_delivers_raw_body() {
    use futures::TryStreamExt;

    let server = server_with(
        Mock::given(method("GET"))
            .and(path("/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_string("chunked payload")),
    )
    .await;

    let client = HttpClient::new(RequestOptions::new().base_url(server.uri()));
    let response = client
        .get(
            "/stream",
            RequestOptions::new().response_type(ResponseType::Stream),
        )
        .await
        .unwrap();

    let stream = response.into_stream().expect("stream data");
    let chunks: Vec<_> = stream.try_collect().await.unwrap();
    let body: Vec<u8> = chunks.concat();
    assert_eq!(body, b"chunked payload");
}

// =============================================================================
// Pipeline workflows
// =============================================================================

#[tokio::test]
async fn test_request_interceptor_header_reaches_the_wire() {
    let server = server_with(
        Mock::given(method("GET"))
            .and(path("/secure"))
            .and(header("authorization", "Bearer wired-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true}))),
    )
    .await;

    let client = PipelineClient::new(RequestOptions::new().base_url(server.uri()));
    client
        .interceptors()
        .request
        .on_fulfilled("auth", |mut config: RequestConfig| async move {
            config.options.headers.insert(
                "authorization",
                courier::HeaderValue::from_static("Bearer wired-token"),
            );
            Ok(config)
        })
        .unwrap();

    let response = client.get("/secure", RequestOptions::new()).await.unwrap();
    assert_eq!(response.json::<Value>().unwrap(), json!({"ok": true}));
}

#[tokio::test]
async fn test_token_refresh_retries_once_against_live_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"profile": "me"})))
        .mount(&server)
        .await;

    let client = PipelineClient::new(RequestOptions::new().base_url(server.uri()));
    let retry_client = client.clone();
    client
        .interceptors()
        .response
        .on_rejected("auth", move |error| {
            let client = retry_client.clone();
            async move {
                let expired = error.status_code() == Some(StatusCode::UNAUTHORIZED)
                    && error.message == "jwt expired";
                match error.config.clone() {
                    Some(mut config) if expired && !config.retry.is_retry() => {
                        config.retry.attempts += 1;
                        Ok(Recovery::Resolved(client.request(config).await?))
                    }
                    _ => Ok(Recovery::Unhandled(error)),
                }
            }
        })
        .unwrap();

    let response = client
        .get("/users/profile", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(response.json::<Value>().unwrap(), json!({"profile": "me"}));
}

#[tokio::test]
async fn test_unrecovered_rejection_surfaces_original_error() {
    let server = server_with(
        Mock::given(method("GET")).and(path("/broken")).respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "server on fire"})),
        ),
    )
    .await;

    let client = PipelineClient::new(RequestOptions::new().base_url(server.uri()));
    client
        .interceptors()
        .response
        .on_rejected("observer", |error| async move {
            Ok(Recovery::Unhandled(error))
        })
        .unwrap();

    let err = client
        .get("/broken", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.message, "server on fire");
    assert_eq!(err.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn test_base_and_call_options_merge_on_the_wire() {
    let server = server_with(
        Mock::given(method("GET"))
            .and(path("/merged"))
            .and(header("x-app", "courier"))
            .and(header("x-call", "yes"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({}))),
    )
    .await;

    let client = HttpClient::new(
        RequestOptions::new()
            .base_url(server.uri())
            .header("x-app", "courier"),
    );
    let response = client
        .get(
            "/merged",
            RequestOptions::new().header("x-call", "yes").param("page", 2),
        )
        .await
        .unwrap();

    assert!(response.is_success());
}
