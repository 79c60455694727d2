//! Drives the pipeline by hand, without a network or timers, to show how edits,
//! results and session switches turn into commands.

use blinkshot::{
    navigation::MemoryNavigator, storage::MemoryStorage, BlinkShot, Command, Config, Event,
    ImageResponse,
};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    blinkshot::logger::init()?;

    let storage = Arc::new(MemoryStorage::new());
    let navigator = Arc::new(MemoryNavigator::new());
    let mut app = BlinkShot::new(&Config::new(), storage.clone(), navigator.clone());
    print_commands("start", app.start());

    for (prompt, payload) in [("fox", "Zm94"), ("a red fox", "cmVkIGZveA=="), ("a red fox", "cmVkIGZveA==")] {
        let commands = app.edit_prompt(prompt);
        print_commands(&format!("edit {:?}", prompt), commands.clone());

        let Some(Command::Schedule(task)) = commands.into_iter().next() else {
            continue;
        };
        let commands = app.dispatch(Event::DebounceElapsed(task.token));
        print_commands("debounce elapsed", commands.clone());

        if let Some(Command::Fetch { token, .. }) = commands.into_iter().next() {
            let result = Event::FetchSucceeded {
                token,
                image: ImageResponse::new(payload, 0.4),
            };
            print_commands("fetch done", app.dispatch(result));
        }
    }

    println!("url is now {}", navigator.location());

    // A second page load against the same storage restores instead of fetching.
    let mut reloaded = BlinkShot::new(&Config::new(), storage, navigator);
    print_commands("reload", reloaded.start());
    println!("state after reload: {}", reloaded.state().as_str());
    Ok(())
}

fn print_commands(label: &str, commands: Vec<Command>) {
    println!("{}:", label);
    for command in commands {
        println!("  {:?}", command);
    }
}
