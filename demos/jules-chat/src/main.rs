//! Terminal chat against a Jules agent session.
//!
//! Run with: JULES_API_KEY=... cargo run -p jules-chat -- [source] [prompt...]
//!
//! Lines typed on stdin are sent to the session. `/approve` approves the
//! agent's plan, `/quit` exits.

use std::sync::Arc;

use anyhow::{Context, bail};
use futures::StreamExt;
use jules_core::{ChatMessage, CredentialStore, Role, SdkConfig, Source, keys};
use jules_session::{FileCredentialStore, SessionController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PROMPT: &str = "Test Application";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let wanted_source = args.next();
    let prompt = {
        let rest: Vec<String> = args.collect();
        if rest.is_empty() {
            DEFAULT_PROMPT.to_string()
        } else {
            rest.join(" ")
        }
    };

    let store = FileCredentialStore::open_default().context("opening credential store")?;
    if let Ok(key) = std::env::var("JULES_API_KEY") {
        store
            .set(keys::API_KEY, key.trim())
            .context("saving API key")?;
    }

    let controller = Arc::new(SessionController::http(SdkConfig::from_env()));
    tracing::info!(base_url = %controller.config().base_url, "jules-chat starting");
    spawn_printers(&controller);

    if !controller.initialize_from_store(&store) {
        bail!(
            "no API key: set JULES_API_KEY or add `{}` to {}",
            keys::API_KEY,
            store.path().display()
        );
    }

    let sources = controller.load_sources().await?;
    let source = pick_source(&sources, wanted_source.as_deref(), &store)?;
    store
        .set(keys::SELECTED_SOURCE_NAME, &source.name)
        .context("saving selected source")?;
    controller.add_log(format!("Using source {}", source.display_label()));

    let session = controller.create_session(&source, &prompt).await?;
    if let Some(url) = &session.url {
        println!("session {} ({url})", session.id);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "/quit" => break,
            "/approve" => {
                // Failures are already on the message feed.
                let _ = controller.approve_plan().await;
            }
            text => {
                let _ = controller.send_message(text).await;
            }
        }
    }

    controller.shutdown();
    Ok(())
}

/// Choose by CLI argument, then the saved selection, then the first source.
fn pick_source(
    sources: &[Source],
    wanted: Option<&str>,
    store: &dyn CredentialStore,
) -> anyhow::Result<Source> {
    let matches = |source: &Source, name: &str| {
        source.name == name || source.id == name || source.display_label() == name
    };

    if let Some(name) = wanted {
        return sources
            .iter()
            .find(|s| matches(s, name))
            .cloned()
            .with_context(|| format!("unknown source `{name}`"));
    }

    let saved = store.get(keys::SELECTED_SOURCE_NAME);
    saved
        .and_then(|name| sources.iter().find(|s| s.name == name))
        .or_else(|| sources.first())
        .cloned()
        .context("no sources available for this API key")
}

fn spawn_printers(controller: &SessionController) {
    let mut messages = controller.messages().history_plus_stream();
    tokio::spawn(async move {
        while let Some(message) = messages.next().await {
            println!("{}", render(&message));
        }
    });

    let mut logs = controller.logs().history_plus_stream();
    tokio::spawn(async move {
        while let Some(entry) = logs.next().await {
            eprintln!("{entry}");
        }
    });
}

fn render(message: &ChatMessage) -> String {
    let who = match message.role {
        Role::User => "you",
        Role::Agent => "agent",
        Role::Error => "error",
    };
    format!("[{who}] {}", message.text)
}
