use crate::{
    client::build_request,
    config::Config,
    models::{Generation, ImageGenerationRequest, ImageResponse},
    navigation::Navigator,
    pipeline::{Effect, Event, GenerationPipeline, PipelineState, ScheduledTask, TaskToken},
    session::SessionStore,
    settings::UserSettings,
    storage::KeyValueStorage,
};
use std::sync::Arc;

/// Work for whoever drives the app: timers, network calls and view updates.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Schedule(ScheduledTask),
    Fetch {
        token: TaskToken,
        request: ImageGenerationRequest,
    },
    SetPrompt(String),
    ShowError(String),
    Appended { session_id: String, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryEntry<'a> {
    pub session_id: &'a str,
    pub generations: usize,
    pub thumbnail: Option<&'a ImageResponse>,
}

pub struct BlinkShot {
    store: SessionStore,
    pipeline: GenerationPipeline,
    settings: UserSettings,
}

impl BlinkShot {
    pub fn new(
        config: &Config,
        storage: Arc<dyn KeyValueStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let store = SessionStore::load(storage.clone(), navigator);
        let mut settings = UserSettings::load(storage);
        if !settings.has_api_key() {
            if let Some(key) = &config.api_key {
                if let Err(e) = settings.set_api_key(key.clone()) {
                    log::error!("Failed to persist API key from config: {}", e);
                }
            }
        }

        Self {
            store,
            pipeline: GenerationPipeline::new(config.debounce.clone()),
            settings,
        }
    }

    pub fn start(&mut self) -> Vec<Command> {
        self.dispatch(Event::SessionChanged)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn pipeline(&self) -> &GenerationPipeline {
        &self.pipeline
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }

    pub fn displayed_generation(&self) -> Option<&Generation> {
        self.pipeline
            .displayed_generation(self.store.current_session())
    }

    pub fn gallery(&self) -> Vec<GalleryEntry<'_>> {
        self.store
            .sessions()
            .iter()
            .rev()
            .map(|session| GalleryEntry {
                session_id: &session.session_id,
                generations: session.len(),
                thumbnail: session.latest().map(|g| &g.image),
            })
            .collect()
    }

    pub fn edit_prompt(&mut self, text: impl Into<String>) -> Vec<Command> {
        self.dispatch(Event::PromptEdited(text.into()))
    }

    pub fn select_style(&mut self, style: impl Into<String>) -> Vec<Command> {
        self.dispatch(Event::StyleSelected(style.into()))
    }

    pub fn set_iterative_mode(&mut self, enabled: bool) -> Vec<Command> {
        self.dispatch(Event::IterativeModeChanged(enabled))
    }

    pub fn select_generation(&mut self, index: usize) -> Vec<Command> {
        self.dispatch(Event::SelectGeneration(index))
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        if let Err(e) = self.settings.set_api_key(key) {
            log::error!("Failed to persist API key: {}", e);
        }
    }

    /// Call after the URL changed underneath us (link, back button).
    pub fn url_changed(&mut self) -> Vec<Command> {
        if self.store.sync_with_url() {
            self.dispatch(Event::SessionChanged)
        } else {
            Vec::new()
        }
    }

    pub fn open_session(&mut self, session_id: Option<&str>) -> Vec<Command> {
        if self.store.open_session(session_id) {
            self.dispatch(Event::SessionChanged)
        } else {
            Vec::new()
        }
    }

    pub fn delete_session(&mut self, session_id: &str) -> Vec<Command> {
        match self.store.delete_session(session_id) {
            Ok(true) => self.dispatch(Event::SessionChanged),
            Ok(false) => Vec::new(),
            Err(e) => {
                log::error!("Failed to delete session {}: {}", session_id, e);
                // The in-memory state may still have changed; resync the view.
                if self.store.current_session_id().is_none() {
                    self.dispatch(Event::SessionChanged)
                } else {
                    Vec::new()
                }
            }
        }
    }

    pub fn dispatch(&mut self, event: Event) -> Vec<Command> {
        let effects = self
            .pipeline
            .handle(event, self.store.current_session());
        effects
            .into_iter()
            .filter_map(|effect| self.apply(effect))
            .collect()
    }

    fn apply(&mut self, effect: Effect) -> Option<Command> {
        match effect {
            Effect::ScheduleDebounce(task) => Some(Command::Schedule(task)),
            Effect::StartFetch { token, query } => Some(Command::Fetch {
                token,
                request: build_request(&query, self.settings.api_key()),
            }),
            Effect::SetPrompt(prompt) => Some(Command::SetPrompt(prompt)),
            Effect::ReportError(message) => Some(Command::ShowError(message)),
            Effect::AppendGeneration(generation) => {
                let session_id = self.store.ensure_session_id();
                if let Err(e) = self.store.add_generation(&session_id, generation) {
                    log::error!("Failed to persist generation: {}", e);
                }
                let index = self
                    .store
                    .session(&session_id)
                    .map(|s| s.len().saturating_sub(1))?;
                Some(Command::Appended { session_id, index })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{MemoryNavigator, SESSION_PARAM};
    use crate::session::{session_record_key, SESSION_INDEX_KEY};
    use crate::storage::MemoryStorage;

    struct Harness {
        storage: Arc<MemoryStorage>,
        navigator: Arc<MemoryNavigator>,
        app: BlinkShot,
    }

    fn harness(navigator: MemoryNavigator) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let navigator = Arc::new(navigator);
        let app = BlinkShot::new(&Config::new(), storage.clone(), navigator.clone());
        Harness {
            storage,
            navigator,
            app,
        }
    }

    fn reload(h: Harness) -> Harness {
        let app = BlinkShot::new(&Config::new(), h.storage.clone(), h.navigator.clone());
        Harness { app, ..h }
    }

    /// Types a prompt and resolves the resulting fetch with `payload`.
    fn generate(app: &mut BlinkShot, prompt: &str, payload: &str) -> Vec<Command> {
        let token = match app.edit_prompt(prompt).as_slice() {
            [Command::Schedule(task)] => task.token,
            other => panic!("expected schedule, got {:?}", other),
        };
        let fetch = match app.dispatch(Event::DebounceElapsed(token)).as_slice() {
            [Command::Fetch { token, .. }] => *token,
            other => panic!("expected fetch, got {:?}", other),
        };
        app.dispatch(Event::FetchSucceeded {
            token: fetch,
            image: ImageResponse::new(payload, 0.2),
        })
    }

    #[test]
    fn test_page_load_without_session_creates_nothing() {
        let mut h = harness(MemoryNavigator::new());
        assert_eq!(h.app.start(), vec![Command::SetPrompt(String::new())]);
        assert!(h.storage.keys().unwrap().is_empty());
        assert!(h.navigator.replacements().is_empty());

        // Typing alone does not create a session either.
        h.app.edit_prompt("fox");
        assert!(h.storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_first_generation_creates_session_and_url() {
        let mut h = harness(MemoryNavigator::new());
        h.app.start();

        let commands = generate(&mut h.app, "a red fox", "AAAA");
        let session_id = match commands.as_slice() {
            [Command::Appended { session_id, index: 0 }] => session_id.clone(),
            other => panic!("expected append, got {:?}", other),
        };
        assert_eq!(h.navigator.query_param(SESSION_PARAM), Some(session_id.clone()));
        assert!(h.storage.get_item(&session_record_key(&session_id)).unwrap().is_some());
        assert_eq!(
            h.app.displayed_generation().map(|g| g.prompt.as_str()),
            Some("a red fox")
        );
        // Adopting the new id is not a session switch.
        assert!(h.app.url_changed().is_empty());
        assert_eq!(h.app.state(), PipelineState::Idle);
    }

    #[test]
    fn test_fetch_request_carries_settings() {
        let mut h = harness(MemoryNavigator::new());
        h.app.set_api_key("tok");
        h.app.set_iterative_mode(true);
        h.app.select_style("cyberpunk");

        let token = match h.app.edit_prompt("neon fox").as_slice() {
            [Command::Schedule(task)] => task.token,
            other => panic!("expected schedule, got {:?}", other),
        };
        match h.app.dispatch(Event::DebounceElapsed(token)).as_slice() {
            [Command::Fetch { request, .. }] => {
                assert_eq!(request.prompt, "neon fox");
                assert_eq!(request.user_api_key, "tok");
                assert!(request.iterative_mode);
                assert!(request.style.starts_with("Envision a futuristic"));
            }
            other => panic!("expected fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_reload_restores_without_fetch() {
        let mut h = harness(MemoryNavigator::new());
        h.app.start();
        generate(&mut h.app, "fox", "AAAA");
        generate(&mut h.app, "fox in snow", "BBBB");

        let mut h = reload(h);
        assert_eq!(h.app.start(), vec![Command::SetPrompt("fox in snow".into())]);
        assert_eq!(h.app.state(), PipelineState::Restoring);
        assert_eq!(
            h.app.displayed_generation().map(|g| g.image.b64_json.as_str()),
            Some("BBBB")
        );
        assert!(h.app.edit_prompt("fox in snow").is_empty());
        assert!(matches!(
            h.app.edit_prompt("fox in deep snow").as_slice(),
            [Command::Schedule(_)]
        ));
    }

    #[test]
    fn test_switching_sessions_via_url() {
        let mut h = harness(MemoryNavigator::new());
        h.app.start();
        generate(&mut h.app, "owl", "AAAA");
        let a = h.app.store().current_session_id().unwrap().to_string();

        h.navigator.visit(Some("nonexistent"));
        assert_eq!(h.app.url_changed(), vec![Command::SetPrompt(String::new())]);
        assert_eq!(h.app.state(), PipelineState::Idle);
        assert!(h.app.displayed_generation().is_none());

        h.navigator.visit(Some(&a));
        assert_eq!(h.app.url_changed(), vec![Command::SetPrompt("owl".into())]);
        assert_eq!(h.app.state(), PipelineState::Restoring);
    }

    #[test]
    fn test_open_new_canvas_then_generate_starts_second_session() {
        let mut h = harness(MemoryNavigator::new());
        h.app.start();
        generate(&mut h.app, "owl", "AAAA");
        let first = h.app.store().current_session_id().unwrap().to_string();

        h.app.open_session(None);
        generate(&mut h.app, "cat", "CCCC");
        let second = h.app.store().current_session_id().unwrap().to_string();
        assert_ne!(first, second);

        let gallery = h.app.gallery();
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery[0].session_id, second);
        assert_eq!(gallery[0].thumbnail.map(|i| i.b64_json.as_str()), Some("CCCC"));
        assert_eq!(gallery[1].generations, 1);
    }

    #[test]
    fn test_delete_active_session() {
        let mut h = harness(MemoryNavigator::new());
        h.app.start();
        generate(&mut h.app, "owl", "AAAA");
        let id = h.app.store().current_session_id().unwrap().to_string();

        assert_eq!(h.app.delete_session(&id), vec![Command::SetPrompt(String::new())]);
        assert_eq!(h.app.store().current_session_id(), None);
        assert_eq!(h.navigator.query_param(SESSION_PARAM), None);
        assert_eq!(h.storage.get_item(&session_record_key(&id)).unwrap(), None);
        assert_eq!(
            h.storage.get_item(SESSION_INDEX_KEY).unwrap().as_deref(),
            Some("[]")
        );
        assert!(h.app.gallery().is_empty());
    }

    #[test]
    fn test_config_api_key_seeds_settings_once() {
        let storage = Arc::new(MemoryStorage::new());
        let navigator = Arc::new(MemoryNavigator::new());
        let config = Config::new().with_api_key("from-env");

        let app = BlinkShot::new(&config, storage.clone(), navigator.clone());
        assert_eq!(app.settings().api_key(), "from-env");

        let mut app = BlinkShot::new(&Config::new(), storage.clone(), navigator.clone());
        app.set_api_key("typed");
        let app = BlinkShot::new(&config, storage, navigator);
        assert_eq!(app.settings().api_key(), "typed");
    }
}
