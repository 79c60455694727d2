use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub style: String,
    #[serde(rename = "userAPIKey")]
    pub user_api_key: String,
    #[serde(rename = "iterativeMode")]
    pub iterative_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub prompt: String,
    pub style: String,
}

impl QueryKey {
    pub fn new(prompt: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: style.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationQuery {
    pub key: QueryKey,
    pub iterative_mode: bool,
}
