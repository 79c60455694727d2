use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/generateImages";
pub const DEFAULT_STORAGE_DIR: &str = ".blinkshot";

#[derive(Debug, Clone, PartialEq)]
pub struct DebounceConfig {
    pub long_ms: u64,
    pub medium_ms: u64,
    pub short_ms: u64,
    pub few_words: usize,
    pub some_words: usize,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        DebounceConfig {
            long_ms: 800,
            medium_ms: 500,
            short_ms: 350,
            few_words: 2,
            some_words: 5,
        }
    }
}

impl DebounceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |name: &str, fallback: u64| {
            env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(fallback)
        };

        DebounceConfig {
            long_ms: read("BLINKSHOT_DEBOUNCE_LONG_MS", defaults.long_ms),
            medium_ms: read("BLINKSHOT_DEBOUNCE_MEDIUM_MS", defaults.medium_ms),
            short_ms: read("BLINKSHOT_DEBOUNCE_SHORT_MS", defaults.short_ms),
            ..defaults
        }
    }

    pub fn with_intervals(mut self, long_ms: u64, medium_ms: u64, short_ms: u64) -> Self {
        self.long_ms = long_ms;
        self.medium_ms = medium_ms;
        self.short_ms = short_ms;
        self
    }

    pub fn delay_for_words(&self, words: usize) -> Duration {
        let ms = if words <= self.few_words {
            self.long_ms
        } else if words <= self.some_words {
            self.medium_ms
        } else {
            self.short_ms
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub debounce: DebounceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: None,
            storage_dir: None,
            api_key: None,
            debounce: DebounceConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_url = env::var("BLINKSHOT_API_URL").ok();
        let storage_dir = env::var("BLINKSHOT_STORAGE_DIR").ok().map(PathBuf::from);
        let api_key = env::var("TOGETHER_API_KEY").ok().filter(|k| !k.is_empty());

        Config {
            api_url,
            storage_dir,
            api_key,
            debounce: DebounceConfig::from_env(),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_debounce(mut self, debounce: DebounceConfig) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }
}
