//! Event loop driving a [`BlinkShot`]: debounce timers and fetches run as tokio tasks
//! and report back over a channel; all state changes happen on the loop itself.

use crate::{
    app::{BlinkShot, Command},
    client::ImageGenerator,
    logger,
    pipeline::Event,
};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Edit(String),
    Style(String),
    IterativeMode(bool),
    ApiKey(String),
    OpenSession(Option<String>),
    DeleteSession(String),
    SelectGeneration(usize),
    UrlChanged,
}

pub type Observer = Box<dyn FnMut(&Command) + Send>;

pub struct Runtime {
    app: BlinkShot,
    generator: Arc<dyn ImageGenerator>,
    tx: UnboundedSender<Event>,
    rx: UnboundedReceiver<Event>,
    observer: Option<Observer>,
}

impl Runtime {
    pub fn new(app: BlinkShot, generator: Arc<dyn ImageGenerator>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            app,
            generator,
            tx,
            rx,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl FnMut(&Command) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn app(&self) -> &BlinkShot {
        &self.app
    }

    pub fn start(&mut self) {
        let commands = self.app.start();
        self.execute(commands);
    }

    pub fn apply(&mut self, input: Input) {
        let commands = match input {
            Input::Edit(text) => self.app.edit_prompt(text),
            Input::Style(style) => self.app.select_style(style),
            Input::IterativeMode(enabled) => self.app.set_iterative_mode(enabled),
            Input::ApiKey(key) => {
                self.app.set_api_key(key);
                Vec::new()
            }
            Input::OpenSession(id) => self.app.open_session(id.as_deref()),
            Input::DeleteSession(id) => self.app.delete_session(&id),
            Input::SelectGeneration(index) => self.app.select_generation(index),
            Input::UrlChanged => self.app.url_changed(),
        };
        self.execute(commands);
    }

    /// Waits for the next timer or fetch completion and applies it.
    pub async fn step(&mut self) {
        if let Some(event) = self.rx.recv().await {
            let commands = self.app.dispatch(event);
            self.execute(commands);
        }
    }

    /// Steps until nothing is debouncing or in flight.
    pub async fn settle(&mut self) {
        while self.app.pipeline().is_busy() {
            self.step().await;
        }
    }

    pub async fn run(mut self, mut inputs: UnboundedReceiver<Input>) -> BlinkShot {
        self.start();
        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => self.apply(input),
                    None => break,
                },
                Some(event) = self.rx.recv() => {
                    let commands = self.app.dispatch(event);
                    self.execute(commands);
                }
            }
        }
        self.settle().await;
        self.app
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match &command {
                Command::Schedule(task) => {
                    let tx = self.tx.clone();
                    let token = task.token;
                    let delay = task.delay;
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(Event::DebounceElapsed(token));
                    });
                }
                Command::Fetch { token, request } => {
                    let tx = self.tx.clone();
                    let token = *token;
                    let request = request.clone();
                    let generator = self.generator.clone();
                    tokio::spawn(async move {
                        let _timer = logger::timer("image generation");
                        let event = match generator.generate(request).await {
                            Ok(image) => Event::FetchSucceeded { token, image },
                            Err(e) => Event::FetchFailed {
                                token,
                                message: e.to_string(),
                            },
                        };
                        let _ = tx.send(event);
                    });
                }
                _ => {}
            }
            if let Some(observer) = self.observer.as_mut() {
                observer(&command);
            }
        }
    }
}
