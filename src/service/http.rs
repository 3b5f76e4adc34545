use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{StegoService, TransferResponse};
use crate::analyzer::Finding;
use crate::config::{ANALYSIS_TIMEOUT, ServiceConfig, UPLOAD_CHUNK_SIZE};
use crate::error::ServiceError;
use crate::progress::Progress;
use crate::request::TransferRequest;
use crate::types::{ANALYZE_PATH, Operation};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct DecodeBody {
    message: String,
}

#[derive(Serialize)]
struct AnalyzeBody<'a> {
    text: &'a str,
}

/// reqwest-backed client for the steganography service.
#[derive(Debug, Clone)]
pub struct HttpService {
    client: Client,
    config: ServiceConfig,
}

impl HttpService {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Multipart body: the carrier under the route's file field, then `message`
    /// (encode only) and `password`.
    fn form(request: &TransferRequest, progress: &Progress) -> Result<Form, ServiceError> {
        let route = request.route();
        let file = request.file();

        let part = Part::stream_with_length(upload_body(file.bytes(), progress.clone()), file.len()).file_name(file.name().to_owned()).mime_str(file.mime())?;

        let mut form = Form::new().part(route.file_field, part);
        if let Some(message) = request.message() {
            form = form.text("message", message.to_owned());
        }

        Ok(form.text("password", request.password().expose_secret().to_owned()))
    }
}

#[async_trait]
impl StegoService for HttpService {
    async fn transfer(&self, request: &TransferRequest, progress: &Progress) -> Result<TransferResponse, ServiceError> {
        let route = request.route();
        debug!(route = route.name, bytes = request.file().len(), "sending transfer");

        let response = self.client.post(self.config.url(route.path)).multipart(Self::form(request, progress)?).send().await?;
        let response = check_status(response).await?;

        match request.operation() {
            Operation::Encode => Ok(TransferResponse::Carrier(response.bytes().await?)),
            Operation::Decode => parse_json::<DecodeBody>(response).await.map(|body| TransferResponse::Message(body.message)),
        }
    }

    async fn analyze(&self, text: &str) -> Result<Vec<Finding>, ServiceError> {
        let response = self.client.post(self.config.url(ANALYZE_PATH)).timeout(ANALYSIS_TIMEOUT).json(&AnalyzeBody { text }).send().await?;
        parse_json(check_status(response).await?).await
    }
}

/// Splits the carrier into upload slices. Slicing `Bytes` shares the buffer.
fn slices(bytes: &Bytes) -> Vec<Bytes> {
    (0..bytes.len()).step_by(UPLOAD_CHUNK_SIZE).map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(bytes.len()))).collect()
}

/// Streams the carrier, advancing `progress` as each slice is pulled by the transport.
fn upload_body(bytes: &Bytes, progress: Progress) -> Body {
    let total = bytes.len() as u64;
    let mut sent = 0u64;

    let stream = stream::iter(slices(bytes)).map(move |slice| {
        sent += slice.len() as u64;
        progress.advance(sent, total);
        Ok::<_, std::io::Error>(slice)
    });

    Body::wrap_stream(stream)
}

/// Turns a non-2xx response into [`ServiceError::Status`], keeping the `{error}` body.
async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response.json::<ErrorBody>().await.ok().map(|body| body.error);
    debug!(status = status.as_u16(), has_detail = detail.is_some(), "service rejected request");

    Err(ServiceError::Status { status: status.as_u16(), detail })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| ServiceError::Malformed(err.to_string()))
}
