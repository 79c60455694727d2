use crate::{
    error::Result,
    models::{ImageGenerationRequest, ImageResponse},
};
use async_trait::async_trait;

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: ImageGenerationRequest) -> Result<ImageResponse>;
}
