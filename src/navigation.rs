use std::collections::BTreeMap;
use std::sync::Mutex;
use url::form_urlencoded;

pub const SESSION_PARAM: &str = "session";

pub trait Navigator: Send + Sync {
    fn query_param(&self, name: &str) -> Option<String>;

    fn replace_query_param(&self, name: &str, value: Option<&str>);
}

#[derive(Debug, Default)]
pub struct MemoryNavigator {
    params: Mutex<BTreeMap<String, String>>,
    replacements: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session_id: impl Into<String>) -> Self {
        let navigator = Self::new();
        if let Ok(mut params) = navigator.params.lock() {
            params.insert(SESSION_PARAM.to_string(), session_id.into());
        }
        navigator
    }

    pub fn visit(&self, session_id: Option<&str>) {
        if let Ok(mut params) = self.params.lock() {
            match session_id {
                Some(id) => params.insert(SESSION_PARAM.to_string(), id.to_string()),
                None => params.remove(SESSION_PARAM),
            };
        }
    }

    pub fn location(&self) -> String {
        let params = match self.params.lock() {
            Ok(params) => params,
            Err(_) => return "/".to_string(),
        };
        if params.is_empty() {
            return "/".to_string();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();
        format!("/?{}", query)
    }

    pub fn replacements(&self) -> Vec<String> {
        self.replacements
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Navigator for MemoryNavigator {
    fn query_param(&self, name: &str) -> Option<String> {
        self.params.lock().ok()?.get(name).cloned()
    }

    fn replace_query_param(&self, name: &str, value: Option<&str>) {
        if let Ok(mut params) = self.params.lock() {
            match value {
                Some(v) => params.insert(name.to_string(), v.to_string()),
                None => params.remove(name),
            };
        }
        let location = self.location();
        log::debug!("Replaced URL with {}", location);
        if let Ok(mut replacements) = self.replacements.lock() {
            replacements.push(location);
        }
    }
}
