use blinkshot::{
    logger::{self, LogLevel, LoggerConfig},
    navigation::{MemoryNavigator, Navigator, SESSION_PARAM},
    storage::open_storage,
    styles, BlinkShot, Command, Config, ImageClient, Input, Runtime,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Type a prompt and press enter to edit it. Commands:
  :style [code]     select a style (no code clears it), :styles lists them
  :mode on|off      consistency mode
  :key [value]      set or clear the API key
  :sessions         list saved sessions
  :session <id>     open a session, :new starts a fresh one
  :delete <id>      delete a session
  :select <n>       show generation n of the current session
  :save <path>      write the displayed image to a file
  :quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();

    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| LogLevel::parse(&v))
        .unwrap_or(LogLevel::Info);
    logger::init_with_config(LoggerConfig::development().with_level(level))?;
    if !env_loaded {
        log::debug!("No .env file found, using process environment");
    }

    let mut config = Config::from_env();
    if config.storage_dir.is_none() {
        config = config.with_storage_dir(blinkshot::config::DEFAULT_STORAGE_DIR);
    }
    logger::log_config_info(&config);

    let storage = open_storage(&config)?;
    let navigator = Arc::new(MemoryNavigator::new());
    if let Some(session) = std::env::args().nth(1) {
        navigator.visit(Some(&session));
    }

    let app = BlinkShot::new(&config, storage, navigator.clone());
    let generator = Arc::new(ImageClient::new(config.api_url()));
    let mut runtime = Runtime::new(app, generator).with_observer(report);
    runtime.start();

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut runtime, &navigator, line.trim_end()) {
                    break;
                }
            }
            _ = runtime.step() => {}
        }
    }

    log::info!("Waiting for outstanding work...");
    runtime.settle().await;
    Ok(())
}

fn report(command: &Command) {
    match command {
        Command::Schedule(task) => log::debug!("Debouncing for {}ms", task.delay.as_millis()),
        Command::Fetch { request, .. } => log::info!("Requesting \"{}\"", request.prompt),
        Command::SetPrompt(prompt) => println!("prompt> {}", prompt),
        Command::ShowError(message) => println!("error: {}", message),
        Command::Appended { session_id, index } => {
            println!("added generation #{} to session {}", index, session_id)
        }
    }
}

fn handle_line(runtime: &mut Runtime, navigator: &MemoryNavigator, line: &str) -> bool {
    let Some(command) = line.strip_prefix(':') else {
        runtime.apply(Input::Edit(line.to_string()));
        return true;
    };
    let (name, arg) = match command.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "q" => return false,
        "style" => runtime.apply(Input::Style(arg.to_string())),
        "styles" => {
            for (value, label) in styles::supported_styles() {
                println!("  {:<12} {}", value, label);
            }
        }
        "mode" => runtime.apply(Input::IterativeMode(arg == "on")),
        "key" => runtime.apply(Input::ApiKey(arg.to_string())),
        "sessions" => {
            let current = runtime.app().store().current_session_id();
            for entry in runtime.app().gallery() {
                let marker = if Some(entry.session_id) == current { "*" } else { " " };
                println!("{} {} ({} generations)", marker, entry.session_id, entry.generations);
            }
        }
        "session" if !arg.is_empty() => {
            navigator.visit(Some(arg));
            runtime.apply(Input::UrlChanged);
        }
        "new" => runtime.apply(Input::OpenSession(None)),
        "delete" if !arg.is_empty() => runtime.apply(Input::DeleteSession(arg.to_string())),
        "select" => match arg.parse() {
            Ok(index) => runtime.apply(Input::SelectGeneration(index)),
            Err(_) => println!("usage: :select <n>"),
        },
        "save" if !arg.is_empty() => match runtime.app().displayed_generation() {
            Some(generation) => {
                if let Err(e) = generation.image.save_to(arg) {
                    println!("error: {}", e);
                }
            }
            None => println!("nothing to save"),
        },
        "url" => println!(
            "{} (session = {:?})",
            navigator.location(),
            navigator.query_param(SESSION_PARAM)
        ),
        _ => println!("{}", HELP),
    }
    true
}
