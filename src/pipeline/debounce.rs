use crate::config::DebounceConfig;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskToken(pub u64);

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub token: TaskToken,
    pub key: String,
    pub delay: Duration,
}

/// Cancellable single-slot timer bookkeeping. Scheduling cancels whatever was pending;
/// only the token of the latest schedule can fire.
#[derive(Debug)]
pub struct Debouncer {
    config: DebounceConfig,
    pending: Option<ScheduledTask>,
    next_token: u64,
}

impl Debouncer {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            pending: None,
            next_token: 0,
        }
    }

    pub fn delay_for(&self, text: &str) -> Duration {
        self.config.delay_for_words(word_count(text))
    }

    pub fn schedule(&mut self, key: impl Into<String>, delay: Duration) -> ScheduledTask {
        if let Some(prior) = self.pending.take() {
            log::trace!("Debounce {:?} cancelled", prior.token);
        }
        self.next_token += 1;
        let task = ScheduledTask {
            token: TaskToken(self.next_token),
            key: key.into(),
            delay,
        };
        self.pending = Some(task.clone());
        task
    }

    pub fn schedule_text(&mut self, text: &str) -> ScheduledTask {
        let delay = self.delay_for(text);
        self.schedule(text, delay)
    }

    pub fn cancel(&mut self) -> Option<ScheduledTask> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes the pending task if `token` is still current. Stale tokens yield `None`.
    pub fn fire(&mut self, token: TaskToken) -> Option<String> {
        match &self.pending {
            Some(task) if task.token == token => self.pending.take().map(|task| task.key),
            _ => None,
        }
    }
}
