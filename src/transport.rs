//! reqwestによるHTTP送受信

use maize_scan_common::api::{ApiTransport, HttpReply};
use maize_scan_common::{Error, PredictForm, Result};
use reqwest::multipart::{Form, Part};
use std::time::Duration;

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("maize-scan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<HttpReply> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        Ok(HttpReply::new(status, body))
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::Transport(e.to_string())
}

/// multipartフォームを組み立てる（file, latitude, longitude）
fn build_form(form: &PredictForm) -> Result<Form> {
    let file = Part::bytes(form.bytes.clone())
        .file_name(form.file_name.clone())
        .mime_str(&form.mime_type)
        .map_err(transport_error)?;
    let mut multipart = Form::new().part("file", file);
    for (name, value) in form.text_fields() {
        multipart = multipart.text(name, value);
    }
    Ok(multipart)
}

impl ApiTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpReply> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        Self::read(response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply> {
        tracing::debug!(%url, "POST json");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::read(response).await
    }

    async fn post_multipart(&self, url: &str, form: &PredictForm) -> Result<HttpReply> {
        tracing::debug!(%url, bytes = form.bytes.len(), "POST multipart");
        let response = self
            .client
            .post(url)
            .multipart(build_form(form)?)
            .send()
            .await
            .map_err(transport_error)?;
        Self::read(response).await
    }
}
