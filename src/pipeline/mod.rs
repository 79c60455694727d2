pub mod debounce;
pub mod events;

use crate::{
    config::DebounceConfig,
    models::{Generation, GenerationQuery, ImageResponse, QueryKey, Session},
};

pub use debounce::{word_count, Debouncer, ScheduledTask, TaskToken};
pub use events::{Effect, Event, PipelineState};

#[derive(Debug, Clone)]
struct InFlight {
    token: TaskToken,
    key: QueryKey,
}

/// Live prompt → request loop for one active session context.
///
/// Transitions are driven by [`Event`]s through [`GenerationPipeline::handle`], which
/// takes a read-only view of the active session and returns the [`Effect`]s to carry
/// out. Only the most recently started fetch may produce an append; any other result
/// is dropped on arrival.
#[derive(Debug)]
pub struct GenerationPipeline {
    prompt: String,
    style: String,
    iterative_mode: bool,
    debounced_prompt: Option<String>,
    debouncer: Debouncer,
    in_flight: Option<InFlight>,
    next_fetch_token: u64,
    restoring_prompt: Option<String>,
    last_result: Option<(QueryKey, ImageResponse)>,
    last_error: Option<String>,
    active_index: Option<usize>,
}

impl GenerationPipeline {
    pub fn new(debounce: DebounceConfig) -> Self {
        Self {
            prompt: String::new(),
            style: String::new(),
            iterative_mode: false,
            debounced_prompt: None,
            debouncer: Debouncer::new(debounce),
            in_flight: None,
            next_fetch_token: 0,
            restoring_prompt: None,
            last_result: None,
            last_error: None,
            active_index: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        if self.restoring_prompt.is_some() {
            PipelineState::Restoring
        } else if self.debouncer.is_pending() {
            PipelineState::Debouncing
        } else if self.in_flight.is_some() {
            PipelineState::Fetching
        } else {
            PipelineState::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.debouncer.is_pending() || self.in_flight.is_some()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn iterative_mode(&self) -> bool {
        self.iterative_mode
    }

    pub fn debounced_prompt(&self) -> Option<&str> {
        self.debounced_prompt.as_deref()
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring_prompt.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn in_flight_key(&self) -> Option<&QueryKey> {
        self.in_flight.as_ref().map(|f| &f.key)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn displayed_generation<'a>(&self, session: Option<&'a Session>) -> Option<&'a Generation> {
        if self.prompt.is_empty() {
            return None;
        }
        let index = self.active_index?;
        session.and_then(|s| s.generations.get(index))
    }

    pub fn handle(&mut self, event: Event, session: Option<&Session>) -> Vec<Effect> {
        let before = self.state();
        let effects = match event {
            Event::PromptEdited(text) => self.on_prompt_edited(text),
            Event::StyleSelected(style) => self.on_style_selected(style, session),
            Event::IterativeModeChanged(enabled) => {
                self.iterative_mode = enabled;
                Vec::new()
            }
            Event::DebounceElapsed(token) => self.on_debounce_elapsed(token, session),
            Event::FetchSucceeded { token, image } => self.on_fetch_succeeded(token, image, session),
            Event::FetchFailed { token, message } => self.on_fetch_failed(token, message),
            Event::SessionChanged => self.on_session_changed(session),
            Event::SelectGeneration(index) => {
                if session.map_or(false, |s| index < s.len()) {
                    self.active_index = Some(index);
                }
                Vec::new()
            }
        };
        let after = self.state();
        if before != after {
            log::debug!("Pipeline {} -> {}", before.as_str(), after.as_str());
        }
        effects
    }

    fn on_prompt_edited(&mut self, text: String) -> Vec<Effect> {
        if text == self.prompt {
            return Vec::new();
        }
        self.prompt = text;

        if let Some(restored) = &self.restoring_prompt {
            if *restored == self.prompt {
                return Vec::new();
            }
            log::debug!("Prompt diverged from restored session, resuming generation");
            self.restoring_prompt = None;
        }

        if self.prompt.trim().is_empty() {
            self.debouncer.cancel();
            self.in_flight = None;
            self.debounced_prompt = None;
            return Vec::new();
        }

        let task = self.debouncer.schedule_text(&self.prompt);
        vec![Effect::ScheduleDebounce(task)]
    }

    fn on_style_selected(&mut self, style: String, session: Option<&Session>) -> Vec<Effect> {
        if style == self.style {
            return Vec::new();
        }
        self.style = style;

        // A pending debounce picks up the new style when it fires.
        if self.is_restoring() || self.debouncer.is_pending() {
            return Vec::new();
        }
        match self.debounced_prompt.clone() {
            Some(prompt) => self.settle(prompt, session),
            None => Vec::new(),
        }
    }

    fn on_debounce_elapsed(&mut self, token: TaskToken, session: Option<&Session>) -> Vec<Effect> {
        let Some(text) = self.debouncer.fire(token) else {
            log::trace!("Ignoring stale debounce {:?}", token);
            return Vec::new();
        };
        if self.is_restoring() {
            return Vec::new();
        }
        self.debounced_prompt = Some(text.clone());
        self.settle(text, session)
    }

    fn settle(&mut self, text: String, session: Option<&Session>) -> Vec<Effect> {
        if text.trim().is_empty() {
            self.in_flight = None;
            return Vec::new();
        }

        let key = QueryKey::new(text, self.style.clone());
        if self.in_flight.as_ref().map_or(false, |f| f.key == key) {
            return Vec::new();
        }

        if let Some((cached_key, image)) = &self.last_result {
            if *cached_key == key {
                log::debug!("Reusing result for unchanged prompt");
                let image = image.clone();
                self.in_flight = None;
                return self.accept(key, image, session);
            }
        }

        if let Some(superseded) = self.in_flight.take() {
            log::debug!("Request {:?} superseded", superseded.token);
        }
        self.next_fetch_token += 1;
        let token = TaskToken(self.next_fetch_token);
        self.in_flight = Some(InFlight {
            token,
            key: key.clone(),
        });
        self.last_error = None;

        vec![Effect::StartFetch {
            token,
            query: GenerationQuery {
                key,
                iterative_mode: self.iterative_mode,
            },
        }]
    }

    fn on_fetch_succeeded(
        &mut self,
        token: TaskToken,
        image: ImageResponse,
        session: Option<&Session>,
    ) -> Vec<Effect> {
        let key = match self.in_flight.take() {
            Some(in_flight) if in_flight.token == token => in_flight.key,
            other => {
                self.in_flight = other;
                log::debug!("Dropping result of superseded request {:?}", token);
                return Vec::new();
            }
        };
        self.accept(key, image, session)
    }

    fn accept(&mut self, key: QueryKey, image: ImageResponse, session: Option<&Session>) -> Vec<Effect> {
        self.last_result = Some((key.clone(), image.clone()));

        if self.is_restoring() || self.prompt.trim().is_empty() {
            return Vec::new();
        }

        let latest = session.and_then(|s| s.latest());
        if latest.map_or(false, |g| g.image.same_payload(&image)) {
            log::debug!("Result identical to latest generation, not appending");
            return Vec::new();
        }

        self.active_index = Some(session.map_or(0, |s| s.len()));
        vec![Effect::AppendGeneration(Generation::new(key.prompt, image))]
    }

    fn on_fetch_failed(&mut self, token: TaskToken, message: String) -> Vec<Effect> {
        match &self.in_flight {
            Some(in_flight) if in_flight.token == token => {
                self.in_flight = None;
                log::warn!("Image generation failed: {}", message);
                self.last_error = Some(message.clone());
                vec![Effect::ReportError(message)]
            }
            _ => Vec::new(),
        }
    }

    fn on_session_changed(&mut self, session: Option<&Session>) -> Vec<Effect> {
        self.debouncer.cancel();
        self.in_flight = None;
        self.last_result = None;
        self.last_error = None;

        match session.and_then(|s| s.latest()) {
            Some(latest) => {
                let prompt = latest.prompt.clone();
                self.restoring_prompt = Some(prompt.clone());
                self.prompt = prompt.clone();
                self.debounced_prompt = Some(prompt.clone());
                self.active_index = session.map(|s| s.len() - 1);
                vec![Effect::SetPrompt(prompt)]
            }
            None => {
                self.restoring_prompt = None;
                self.prompt.clear();
                self.debounced_prompt = None;
                self.active_index = None;
                vec![Effect::SetPrompt(String::new())]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pipeline() -> GenerationPipeline {
        GenerationPipeline::new(DebounceConfig::default())
    }

    fn image(payload: &str) -> ImageResponse {
        ImageResponse::new(payload, 0.25)
    }

    fn session_with(prompts: &[(&str, &str)]) -> Session {
        let mut session = Session::new("s1");
        for (prompt, payload) in prompts {
            session
                .generations
                .push(Generation::new(*prompt, image(payload)));
        }
        session
    }

    fn scheduled(effects: &[Effect]) -> ScheduledTask {
        match effects {
            [Effect::ScheduleDebounce(task)] => task.clone(),
            other => panic!("expected a single debounce, got {:?}", other),
        }
    }

    fn started(effects: &[Effect]) -> (TaskToken, GenerationQuery) {
        match effects {
            [Effect::StartFetch { token, query }] => (*token, query.clone()),
            other => panic!("expected a single fetch, got {:?}", other),
        }
    }

    /// Edit then let the debounce fire, returning the fetch that starts.
    fn type_and_settle(
        p: &mut GenerationPipeline,
        text: &str,
        session: Option<&Session>,
    ) -> (TaskToken, GenerationQuery) {
        let task = scheduled(&p.handle(Event::PromptEdited(text.into()), session));
        started(&p.handle(Event::DebounceElapsed(task.token), session))
    }

    #[test]
    fn test_starts_idle() {
        let p = pipeline();
        assert_eq!(p.state(), PipelineState::Idle);
        assert!(!p.is_busy());
    }

    #[test]
    fn test_debounce_delay_depends_on_word_count() {
        let mut p = pipeline();
        let one = scheduled(&p.handle(Event::PromptEdited("fox".into()), None));
        let three = scheduled(&p.handle(Event::PromptEdited("a red fox".into()), None));
        let nine = scheduled(&p.handle(
            Event::PromptEdited("a red fox in a snowy forest at dawn".into()),
            None,
        ));
        assert_eq!(one.delay, Duration::from_millis(800));
        assert_eq!(three.delay, Duration::from_millis(500));
        assert_eq!(nine.delay, Duration::from_millis(350));
        assert_eq!(p.state(), PipelineState::Debouncing);
    }

    #[test]
    fn test_only_latest_debounce_fires() {
        let mut p = pipeline();
        let first = scheduled(&p.handle(Event::PromptEdited("a".into()), None));
        let second = scheduled(&p.handle(Event::PromptEdited("a fox".into()), None));

        assert!(p.handle(Event::DebounceElapsed(first.token), None).is_empty());
        let (_, query) = started(&p.handle(Event::DebounceElapsed(second.token), None));
        assert_eq!(query.key, QueryKey::new("a fox", ""));
        assert_eq!(p.state(), PipelineState::Fetching);
    }

    #[test]
    fn test_successful_fetch_appends_and_becomes_active() {
        let mut p = pipeline();
        let (token, query) = type_and_settle(&mut p, "a red fox", None);
        assert!(!query.iterative_mode);

        let effects = p.handle(
            Event::FetchSucceeded {
                token,
                image: image("AAAA"),
            },
            None,
        );
        assert_eq!(
            effects,
            vec![Effect::AppendGeneration(Generation::new("a red fox", image("AAAA")))]
        );
        assert_eq!(p.active_index(), Some(0));
        assert_eq!(p.state(), PipelineState::Idle);
    }

    #[test]
    fn test_duplicate_payload_is_not_appended() {
        let session = session_with(&[("a red fox", "AAAA")]);
        let mut p = pipeline();
        p.handle(Event::SessionChanged, Some(&session));
        let (token, _) = type_and_settle(&mut p, "a red fox!", Some(&session));

        let effects = p.handle(
            Event::FetchSucceeded {
                token,
                image: ImageResponse::new("AAAA", 9.0),
            },
            Some(&session),
        );
        assert!(effects.is_empty());
        assert_eq!(p.active_index(), Some(0));

        let (token, _) = type_and_settle(&mut p, "a red fox!!", Some(&session));
        let effects = p.handle(
            Event::FetchSucceeded {
                token,
                image: image("BBBB"),
            },
            Some(&session),
        );
        assert_eq!(effects.len(), 1);
        assert_eq!(p.active_index(), Some(1));
    }

    #[test]
    fn test_superseded_result_is_dropped() {
        let mut p = pipeline();
        let (old, _) = type_and_settle(&mut p, "fox", None);
        let (new, query) = type_and_settle(&mut p, "red fox", None);
        assert_ne!(old, new);
        assert_eq!(p.in_flight_key(), Some(&query.key));

        let late = p.handle(
            Event::FetchSucceeded {
                token: old,
                image: image("OLD"),
            },
            None,
        );
        assert!(late.is_empty());
        // The current request is still outstanding and still honoured.
        assert_eq!(p.state(), PipelineState::Fetching);
        let effects = p.handle(
            Event::FetchSucceeded {
                token: new,
                image: image("NEW"),
            },
            None,
        );
        assert_eq!(
            effects,
            vec![Effect::AppendGeneration(Generation::new("red fox", image("NEW")))]
        );
    }

    #[test]
    fn test_editing_during_fetch_does_not_cancel_until_key_changes() {
        let mut p = pipeline();
        let (token, _) = type_and_settle(&mut p, "fox", None);
        p.handle(Event::PromptEdited("fox r".into()), None);
        assert_eq!(p.state(), PipelineState::Debouncing);

        // Still the latest settled key, so its result is accepted.
        let effects = p.handle(
            Event::FetchSucceeded {
                token,
                image: image("AAAA"),
            },
            None,
        );
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_same_key_is_not_requested_twice() {
        let mut p = pipeline();
        let _ = type_and_settle(&mut p, "fox", None);
        p.handle(Event::PromptEdited("fox!".into()), None);
        let task = scheduled(&p.handle(Event::PromptEdited("fox".into()), None));
        assert!(p.handle(Event::DebounceElapsed(task.token), None).is_empty());
        assert_eq!(p.state(), PipelineState::Fetching);
    }

    #[test]
    fn test_settled_key_reuses_last_result() {
        let session = session_with(&[("fox", "AAAA")]);
        let mut p = pipeline();
        let (token, _) = type_and_settle(&mut p, "fox", None);
        p.handle(
            Event::FetchSucceeded {
                token,
                image: image("AAAA"),
            },
            None,
        );

        // Focus churn: the same text settles again. No request, no duplicate entry.
        p.handle(Event::PromptEdited("fo".into()), Some(&session));
        let task = scheduled(&p.handle(Event::PromptEdited("fox".into()), Some(&session)));
        assert!(p
            .handle(Event::DebounceElapsed(task.token), Some(&session))
            .is_empty());
        assert_eq!(p.state(), PipelineState::Idle);
    }

    #[test]
    fn test_clearing_prompt_cancels_pending_work() {
        let mut p = pipeline();
        let (token, _) = type_and_settle(&mut p, "fox", None);
        let pending = scheduled(&p.handle(Event::PromptEdited("fox tail".into()), None));

        assert!(p.handle(Event::PromptEdited("   ".into()), None).is_empty());
        assert_eq!(p.state(), PipelineState::Idle);
        assert!(p.handle(Event::DebounceElapsed(pending.token), None).is_empty());
        assert!(p
            .handle(
                Event::FetchSucceeded {
                    token,
                    image: image("AAAA"),
                },
                None,
            )
            .is_empty());
    }

    #[test]
    fn test_failure_reports_error_without_append() {
        let mut p = pipeline();
        let (token, _) = type_and_settle(&mut p, "fox", None);
        let effects = p.handle(
            Event::FetchFailed {
                token,
                message: "rate limited".into(),
            },
            None,
        );
        assert_eq!(effects, vec![Effect::ReportError("rate limited".into())]);
        assert_eq!(p.last_error(), Some("rate limited"));
        assert_eq!(p.state(), PipelineState::Idle);

        // Resubmitting by editing issues a fresh request and clears the error.
        let _ = type_and_settle(&mut p, "fox!", None);
        assert_eq!(p.last_error(), None);
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut p = pipeline();
        let (old, _) = type_and_settle(&mut p, "fox", None);
        let _ = type_and_settle(&mut p, "red fox", None);
        let effects = p.handle(
            Event::FetchFailed {
                token: old,
                message: "boom".into(),
            },
            None,
        );
        assert!(effects.is_empty());
        assert_eq!(p.last_error(), None);
    }

    #[test]
    fn test_restoring_populates_prompt_without_fetch() {
        let session = session_with(&[("fox", "AAAA"), ("red fox", "BBBB")]);
        let mut p = pipeline();

        let effects = p.handle(Event::SessionChanged, Some(&session));
        assert_eq!(effects, vec![Effect::SetPrompt("red fox".into())]);
        assert_eq!(p.state(), PipelineState::Restoring);
        assert_eq!(p.prompt(), "red fox");
        assert_eq!(p.active_index(), Some(1));
        assert_eq!(
            p.displayed_generation(Some(&session)).map(|g| g.image.b64_json.as_str()),
            Some("BBBB")
        );

        // Echoing the restored text or changing style does not fetch.
        assert!(p.handle(Event::PromptEdited("red fox".into()), Some(&session)).is_empty());
        assert!(p.handle(Event::StyleSelected("retro".into()), Some(&session)).is_empty());
        assert_eq!(p.state(), PipelineState::Restoring);
    }

    #[test]
    fn test_diverging_from_restored_prompt_resumes() {
        let session = session_with(&[("fox", "AAAA")]);
        let mut p = pipeline();
        p.handle(Event::SessionChanged, Some(&session));

        let task = scheduled(&p.handle(Event::PromptEdited("fox!".into()), Some(&session)));
        assert!(!p.is_restoring());
        let (_, query) = started(&p.handle(Event::DebounceElapsed(task.token), Some(&session)));
        assert_eq!(query.key.prompt, "fox!");
    }

    #[test]
    fn test_switch_to_empty_session_clears_prompt() {
        let a = session_with(&[("fox", "AAAA")]);
        let mut p = pipeline();
        p.handle(Event::SessionChanged, Some(&a));

        let effects = p.handle(Event::SessionChanged, None);
        assert_eq!(effects, vec![Effect::SetPrompt(String::new())]);
        assert_eq!(p.state(), PipelineState::Idle);
        assert_eq!(p.prompt(), "");
        assert_eq!(p.active_index(), None);

        let empty = Session::new("b");
        p.handle(Event::SessionChanged, Some(&a));
        p.handle(Event::SessionChanged, Some(&empty));
        assert_eq!(p.state(), PipelineState::Idle);
    }

    #[test]
    fn test_session_switch_cancels_in_flight_request() {
        let mut p = pipeline();
        let (token, _) = type_and_settle(&mut p, "fox", None);
        let b = session_with(&[("owl", "OWL0")]);
        p.handle(Event::SessionChanged, Some(&b));

        let effects = p.handle(
            Event::FetchSucceeded {
                token,
                image: image("AAAA"),
            },
            Some(&b),
        );
        assert!(effects.is_empty());
        assert_eq!(p.state(), PipelineState::Restoring);
    }

    #[test]
    fn test_style_change_refetches_settled_prompt() {
        let mut p = pipeline();
        let (token, _) = type_and_settle(&mut p, "fox", None);
        p.handle(
            Event::FetchSucceeded {
                token,
                image: image("AAAA"),
            },
            None,
        );
        p.handle(Event::IterativeModeChanged(true), None);

        let (_, query) = started(&p.handle(Event::StyleSelected("retro".into()), None));
        assert_eq!(query.key, QueryKey::new("fox", "retro"));
        assert!(query.iterative_mode);
    }

    #[test]
    fn test_style_change_while_debouncing_waits() {
        let mut p = pipeline();
        let task = scheduled(&p.handle(Event::PromptEdited("fox".into()), None));
        assert!(p.handle(Event::StyleSelected("moody".into()), None).is_empty());
        let (_, query) = started(&p.handle(Event::DebounceElapsed(task.token), None));
        assert_eq!(query.key.style, "moody");
    }

    #[test]
    fn test_select_generation_bounds() {
        let session = session_with(&[("a", "AAAA"), ("b", "BBBB"), ("c", "CCCC")]);
        let mut p = pipeline();
        p.handle(Event::SessionChanged, Some(&session));
        p.handle(Event::SelectGeneration(0), Some(&session));
        assert_eq!(p.active_index(), Some(0));
        p.handle(Event::SelectGeneration(7), Some(&session));
        assert_eq!(p.active_index(), Some(0));
    }
}
