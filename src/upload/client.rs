use crate::upload::error::UploadError;
use crate::upload::payload::UploadPayload;
use crate::upload::types::{AnalysisResponse, BlockAction, ModuleId, SelectedFile, UserRecord};
use derivative::Derivative;
use reqwest::header::HeaderMap;
use reqwest::Url;
use std::time::Duration;

/// HTTP seam towards the SentinAI server.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct SentinelClient {
    #[derivative(Debug = "ignore")]
    http: reqwest::Client,
    base_url: Url,
    // Carries the session cookie; kept out of debug output.
    #[derivative(Debug = "ignore")]
    headers: HeaderMap,
}

impl SentinelClient {
    pub fn new(
        base_url: &str,
        headers: HeaderMap,
        timeout: Option<Duration>,
    ) -> Result<Self, UploadError> {
        let base_url = normalize_base_url(base_url)?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
            headers,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, UploadError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| UploadError::InvalidBaseUrl(format!("{}{}", self.base_url, path)))
    }

    /// `POST /upload/{module}`. The body is decoded whatever the HTTP status,
    /// since the server reports rejected uploads as JSON with a 400.
    pub async fn upload(
        &self,
        module: &ModuleId,
        files: &[SelectedFile],
    ) -> Result<AnalysisResponse, UploadError> {
        let form = UploadPayload::new(module, files)?.into_form().await?;
        let url = self.endpoint(&format!("upload/{}", module))?;
        tracing::info!(%url, files = files.len(), "uploading");

        let response = self
            .http
            .post(url)
            .headers(self.headers.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: AnalysisResponse = serde_json::from_str(&body)?;
        tracing::debug!(%status, ?parsed, "upload response");
        Ok(parsed)
    }

    /// `POST /admin/block`. Only the status code matters.
    pub async fn set_block(&self, user_id: &str, action: BlockAction) -> Result<(), UploadError> {
        let url = self.endpoint("admin/block")?;
        let response = self
            .http
            .post(url)
            .headers(self.headers.clone())
            .form(&[("user_id", user_id), ("action", action.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status));
        }
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, UploadError> {
        let url = self.endpoint("admin/users")?;
        let response = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, UploadError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UploadError::InvalidBaseUrl(raw.to_string()));
    }
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash).map_err(|_| UploadError::InvalidBaseUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UploadError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}
