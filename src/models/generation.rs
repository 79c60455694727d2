use crate::error::{BlinkShotError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    pub inference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub b64_json: String, // Base64 encoded PNG
    pub timings: Timings,
}

impl ImageResponse {
    pub fn new(b64_json: impl Into<String>, inference: f64) -> Self {
        Self {
            b64_json: b64_json.into(),
            timings: Timings { inference },
        }
    }

    pub fn same_payload(&self, other: &ImageResponse) -> bool {
        self.b64_json == other.b64_json
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.b64_json.as_bytes())
            .map_err(|e| BlinkShotError::Decode(e.to_string()))
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.decode()?;
        std::fs::write(path.as_ref(), bytes)?;
        log::info!("Saved image to {}", path.as_ref().display());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub prompt: String,
    pub image: ImageResponse,
}

impl Generation {
    pub fn new(prompt: impl Into<String>, image: ImageResponse) -> Self {
        Self {
            prompt: prompt.into(),
            image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub generations: Vec<Generation>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            generations: Vec::new(),
        }
    }

    pub fn latest(&self) -> Option<&Generation> {
        self.generations.last()
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }
}
