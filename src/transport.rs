//! Transport adapter: the external network collaborator and the
//! classification of its raw results.
//!
//! The pipeline depends only on the [`Transport`] trait. The default
//! implementation is [`ReqwestTransport`]; tests substitute their own.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use http::{HeaderMap, StatusCode, header};
use tracing::debug;

use crate::config::{RequestConfig, ResponseType};
use crate::error::{HttpError, Result};
use crate::multipart::MultipartForm;
use crate::request::{Request, TransportBody};
use crate::response::{Blob, Response, ResponseData};

/// Raw body handle: a stream of chunks, buffered only when decoding
/// requires it.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// What a transport returns: status, headers, and the undecoded body.
pub struct RawResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl RawResponse {
    /// Build from a status, headers, and a body stream. The status text is
    /// the canonical reason phrase.
    pub fn new(status: StatusCode, headers: HeaderMap, body: BodyStream) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        }
    }

    /// Build from an already-buffered body. Useful for tests and canned
    /// transports.
    pub fn buffered(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let bytes = body.into();
        Self::new(status, headers, stream::once(async move { Ok(bytes) }).boxed())
    }
}

/// The external network primitive.
///
/// Implementations issue the call and surface transport-level failures
/// (connection, DNS, abort) as [`ErrorKind::Transport`] errors without
/// attaching config or request context; the dispatcher adds it.
///
/// [`ErrorKind::Transport`]: crate::ErrorKind::Transport
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<RawResponse>;
}

/// Run one resolved configuration through the transport: finalize the
/// request, send it, decode the body, and classify the outcome.
pub(crate) async fn dispatch(transport: &dyn Transport, config: RequestConfig) -> Result<Response> {
    let request = config.finalize();
    debug!(method = %request.method, url = %request.url, "dispatching request");

    let send = transport.send(&request);
    let raw = match request.timeout {
        Some(limit) => match tokio::time::timeout(limit, send).await {
            Ok(result) => result,
            Err(_) => Err(HttpError::transport(format!(
                "request timed out after {limit:?}"
            ))),
        },
        None => send.await,
    }
    .map_err(|err| err.with_context(config.clone(), request.clone()))?;

    let RawResponse {
        status,
        status_text,
        headers,
        body,
    } = raw;

    let data = decode_data(request.response_type, status, &headers, body)
        .await
        .map_err(|err| err.with_context(config.clone(), request.clone()))?;

    debug!(status = %status, "received response");

    let response = Response {
        status,
        status_text: status_text.clone(),
        headers,
        data,
        config: config.clone(),
        request: request.clone(),
    };

    if response.is_success() {
        Ok(response)
    } else {
        let message = response
            .error_message()
            .filter(|m| !m.is_empty())
            .or_else(|| (!status_text.is_empty()).then_some(status_text))
            .unwrap_or_else(|| "Unexpected error".to_string());
        Err(HttpError::status(message, config, request, response))
    }
}

/// Decode the body per the explicit response type, falling back to
/// content-type sniffing when no type is set, the type is `original`, or
/// the status is non-success.
pub(crate) async fn decode_data(
    response_type: Option<ResponseType>,
    status: StatusCode,
    headers: &HeaderMap,
    body: BodyStream,
) -> Result<ResponseData> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let explicit = match response_type {
        None | Some(ResponseType::Original) => None,
        Some(requested) if status.is_success() => Some(requested),
        Some(_) => None,
    };

    match explicit {
        Some(ResponseType::Stream) => Ok(ResponseData::Stream(body)),
        Some(requested) => {
            let bytes = collect(body).await?;
            decode_explicit(requested, &content_type, bytes)
        }
        None => {
            let bytes = collect(body).await?;
            Ok(sniff(&content_type, bytes))
        }
    }
}

/// Decode with exactly the requested strategy. Failure here is an error,
/// unlike the sniffing path.
fn decode_explicit(requested: ResponseType, content_type: &str, bytes: Bytes) -> Result<ResponseData> {
    match requested {
        ResponseType::Json => serde_json::from_slice(&bytes)
            .map(ResponseData::Json)
            .map_err(|err| HttpError::decode(format!("failed to decode JSON response: {err}"))),
        ResponseType::Text => String::from_utf8(bytes.to_vec())
            .map(ResponseData::Text)
            .map_err(|err| HttpError::decode(format!("failed to decode text response: {err}"))),
        ResponseType::ArrayBuffer | ResponseType::Bytes => Ok(ResponseData::Bytes(bytes)),
        ResponseType::Blob => Ok(ResponseData::Blob(Blob {
            content_type: content_type.to_string(),
            bytes,
        })),
        ResponseType::FormData => Ok(ResponseData::Form(
            url::form_urlencoded::parse(&bytes).into_owned().collect(),
        )),
        // Stream is taken before buffering; original always sniffs.
        ResponseType::Stream | ResponseType::Original => Ok(sniff(content_type, bytes)),
    }
}

/// Classify by content type. Decode failures yield `None` data rather than
/// an error: a decode problem never masks a completed transport result.
fn sniff(content_type: &str, bytes: Bytes) -> ResponseData {
    if content_type.contains("application/json") {
        serde_json::from_slice(&bytes)
            .map(ResponseData::Json)
            .unwrap_or(ResponseData::None)
    } else if content_type.starts_with("text/") {
        String::from_utf8(bytes.to_vec())
            .map(ResponseData::Text)
            .unwrap_or(ResponseData::None)
    } else if content_type.contains("application/octet-stream") {
        ResponseData::Bytes(bytes)
    } else {
        ResponseData::Blob(Blob {
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

async fn collect(mut body: BodyStream) -> Result<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer.freeze())
}

/// Default transport over reqwest (rustls, gzip, brotli, streaming bodies).
///
/// The `credentials` and `cache` passthrough options have no reqwest
/// equivalent and are ignored here; they are carried for custom transports.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with a default reqwest client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport over a caller-configured reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str())
            .headers(request.headers.clone());

        match &request.body {
            Some(TransportBody::Text(text)) => builder = builder.body(text.clone()),
            Some(TransportBody::Multipart(form)) => {
                builder = builder.multipart(to_reqwest_form(form)?);
            }
            None => {}
        }

        let response = builder
            .send()
            .await
            .map_err(|err| HttpError::transport(err.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map_err(|err| HttpError::transport(err.to_string()))
            .boxed();

        Ok(RawResponse::new(status, headers, body))
    }
}

fn to_reqwest_form(form: &MultipartForm) -> Result<reqwest::multipart::Form> {
    let mut out = reqwest::multipart::Form::new();
    for part in form.parts() {
        let mut piece = reqwest::multipart::Part::bytes(part.data().to_vec());
        if let Some(file_name) = part.file_name_ref() {
            piece = piece.file_name(file_name.to_string());
        }
        if let Some(content_type) = part.content_type_ref() {
            piece = piece
                .mime_str(content_type)
                .map_err(|err| HttpError::config(format!("invalid part content type: {err}")))?;
        }
        out = out.part(part.name().to_string(), piece);
    }
    Ok(out)
}
