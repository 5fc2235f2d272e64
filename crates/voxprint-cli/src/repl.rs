//! Subcommands: `voxprint repl`, `parse`, `status` and `reset`.

use std::io::{self, BufRead, Write as _};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use voxprint_intent::{VoiceEngine, dispatcher, serialize_context};

use crate::callbacks::console_callbacks;
use crate::config::AssistantConfig;
use crate::helpers::format_response;
use crate::store::ContextStore;

fn engine() -> Result<VoiceEngine> {
    VoiceEngine::new().context("failed to build the intent parser")
}

/// Run the interactive REPL.  The context is saved after every turn.
pub fn cmd_repl(config: &AssistantConfig) -> Result<()> {
    let engine = engine()?;
    let store = ContextStore::new(&config.context_file);
    let documents = Arc::new(config.documents.clone());
    let mut callbacks = console_callbacks(Arc::clone(&documents));
    let mut context = store.load(documents.len())?;

    info!(
        path = %store.path().display(),
        documents = documents.len(),
        state = ?context.app_state,
        "session ready"
    );

    println!();
    println!("  voxprint v{}", env!("CARGO_PKG_VERSION"));
    println!("  {}", dispatcher::status_text(&context));
    println!("  Say something, or 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read input")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            info!("user requested exit");
            break;
        }

        let result = engine.process(trimmed, &context, &mut callbacks);
        println!("{}", format_response(&result.response, &config.speak_prefix));

        if result.context != context {
            store.save(&result.context)?;
        }
        context = result.context;
    }

    Ok(())
}

/// Print the parsed command for one utterance.
pub fn cmd_parse(config: &AssistantConfig, text: &str) -> Result<()> {
    let engine = engine()?;
    let context = ContextStore::new(&config.context_file).load(config.documents.len())?;

    match engine.parse(text, &context) {
        Some(command) => {
            let json = serde_json::to_string_pretty(&command).context("failed to encode command")?;
            println!("{json}");
        }
        None => println!("No command recognized."),
    }
    Ok(())
}

/// Print the saved context.
pub fn cmd_status(config: &AssistantConfig) -> Result<()> {
    let store = ContextStore::new(&config.context_file);
    let context = store.load(config.documents.len())?;

    println!("  {}", dispatcher::status_text(&context));
    println!("  Context file: {}", store.path().display());
    println!();
    println!("{}", serialize_context(&context).context("failed to encode context")?);
    Ok(())
}

/// Overwrite the saved context with a fresh one.
pub fn cmd_reset(config: &AssistantConfig) -> Result<()> {
    let store = ContextStore::new(&config.context_file);
    store.reset(config.documents.len())?;
    info!(path = %store.path().display(), "context reset");
    println!("  Context reset. Back to the dashboard.");
    Ok(())
}
