//! Form-encoded `POST /random`.

use crate::{ClientError, Result};
use http_body_util::{BodyExt, Full};
use hyper::{
    Method, Request, Uri,
    body::Bytes,
    client::conn::http1,
    header::{CONTENT_TYPE, HOST},
};
use hyper_util::rt::TokioIo;
use randgen_core::types::GenerationRequest;
use tokio::net::TcpStream;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Posts `request` to `uri` on a fresh connection and returns the response
/// body.
///
/// The status is not inspected: the service answers rejected input with an
/// empty array and a success status, and anything else fails to decode.
///
/// # Errors
///
/// Connection, protocol and encoding failures.
pub async fn post_form(uri: &Uri, request: &GenerationRequest) -> Result<Bytes> {
    let authority = uri
        .authority()
        .ok_or_else(|| ClientError::invalid_url(uri.to_string(), "missing host"))?;
    let port = authority.port_u16().unwrap_or(80);

    let stream = TcpStream::connect((authority.host(), port)).await?;
    let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!("POST connection failed: {e}");
        }
    });

    let form = serde_urlencoded::to_string(request)?;
    let path = uri.path_and_query().map_or("/", |p| p.as_str());
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(HOST, authority.as_str())
        .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
        .body(Full::new(Bytes::from(form)))?;

    let response = sender.send_request(request).await?;
    tracing::debug!(status = %response.status(), "POST answered");

    Ok(response.into_body().collect().await?.to_bytes())
}
