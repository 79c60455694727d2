pub mod image_client;
pub mod traits;

use crate::{
    models::{GenerationQuery, ImageGenerationRequest},
    styles,
};

pub use image_client::ImageClient;
pub use traits::ImageGenerator;

pub fn build_request(query: &GenerationQuery, user_api_key: &str) -> ImageGenerationRequest {
    ImageGenerationRequest {
        prompt: query.key.prompt.clone(),
        style: styles::style_prompt(&query.key.style).to_string(),
        user_api_key: user_api_key.to_string(),
        iterative_mode: query.iterative_mode,
    }
}
