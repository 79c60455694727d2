use crate::{
    client::traits::ImageGenerator,
    error::{BlinkShotError, Result},
    models::{ImageGenerationRequest, ImageResponse},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    api_url: String,
}

impl ImageClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
        }
    }

    pub fn with_client(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub async fn generate(&self, request: ImageGenerationRequest) -> Result<ImageResponse> {
        log::info!(
            "Generating image ({} chars, style: {}, iterative: {})",
            request.prompt.len(),
            if request.style.is_empty() { "none" } else { "custom" },
            request.iterative_mode
        );

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BlinkShotError::Request(format!("Image request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BlinkShotError::Request(format!("Failed to read response: {}", e)))?;

        parse_response(status, &body)
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate(&self, request: ImageGenerationRequest) -> Result<ImageResponse> {
        ImageClient::generate(self, request).await
    }
}

pub(crate) fn parse_response(status: StatusCode, body: &str) -> Result<ImageResponse> {
    if !status.is_success() {
        log::error!("Image endpoint returned {}", status);
        return Err(BlinkShotError::Api(body.to_string()));
    }

    let image: ImageResponse =
        serde_json::from_str(body).map_err(|e| BlinkShotError::Response(e.to_string()))?;

    if image.b64_json.is_empty() {
        return Err(BlinkShotError::Response("No image generated".into()));
    }

    log::debug!("Image generated in {:.3}s", image.timings.inference);
    Ok(image)
}
