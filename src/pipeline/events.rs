use crate::{
    models::{Generation, GenerationQuery, ImageResponse},
    pipeline::debounce::{ScheduledTask, TaskToken},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Debouncing,
    Fetching,
    Restoring,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Debouncing => "debouncing",
            PipelineState::Fetching => "fetching",
            PipelineState::Restoring => "restoring",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    PromptEdited(String),
    StyleSelected(String),
    IterativeModeChanged(bool),
    DebounceElapsed(TaskToken),
    FetchSucceeded { token: TaskToken, image: ImageResponse },
    FetchFailed { token: TaskToken, message: String },
    SessionChanged,
    SelectGeneration(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScheduleDebounce(ScheduledTask),
    StartFetch {
        token: TaskToken,
        query: GenerationQuery,
    },
    AppendGeneration(Generation),
    SetPrompt(String),
    ReportError(String),
}
