use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use prana::kernel::event::{HostEvent, Visibility};
use prana::kernel::host::StaticHost;
use prana::kernel::packet::{IdentityContext, SharedIdentity};
use prana::kernel::time::SystemClock;
use prana::services::delivery::{FileStore, HttpTransport};
use prana::{Prana, PranaConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prana=info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Configuration: optional JSON file, then PRANA_* overrides
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => PranaConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PranaConfig::default(),
    }
    .apply_env();
    config.validate()?;

    // 3. Collaborators
    let identity = Arc::new(SharedIdentity::new(IdentityContext {
        user_id: std::env::var("PRANA_USER_ID").ok(),
        session_id: std::env::var("PRANA_SESSION_ID").ok(),
        lesson_id: std::env::var("PRANA_LESSON_ID").ok(),
    }));
    let transport = Arc::new(HttpTransport::new(&config.delivery));
    let store = Arc::new(FileStore::new(config.delivery.store_path.clone()));
    tracing::info!(endpoint = transport.endpoint(), store = %store.dir().display(), "collaborators ready");

    let prana = Prana::assemble(
        &config,
        &StaticHost::focused_visible().capabilities(),
        Arc::new(SystemClock::new()),
        identity,
        transport,
        store,
    )?;
    let handle = prana.start();

    // 4. Host events from stdin
    println!("Commands: key | click [task] | move X Y | scroll OFFSET MAX | focus | blur | show | hide | panel on|off | online | offline | stats | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "quit" | "exit" => break,
            "stats" => {
                println!("{}", serde_json::to_string(&handle.stats())?);
                continue;
            }
            _ => {}
        }
        match parse_command(line) {
            Some(event) => handle.send(event).await,
            None => tracing::warn!(command = line, "unrecognised command"),
        }
    }

    // 5. Teardown
    if let Some(summary) = handle.destroy().await {
        tracing::info!(transitions = summary.total_transitions, "session closed");
    }
    Ok(())
}

fn parse_command(line: &str) -> Option<HostEvent> {
    let mut parts = line.split_whitespace();
    let event = match parts.next()? {
        "key" => HostEvent::KeyDown,
        "click" => HostEvent::Click { task_relevant: parts.next() == Some("task") },
        "move" => HostEvent::PointerMove {
            x: parts.next()?.parse().ok()?,
            y: parts.next()?.parse().ok()?,
        },
        "scroll" => HostEvent::Scroll {
            offset: parts.next()?.parse().ok()?,
            max_offset: parts.next()?.parse().ok()?,
        },
        "focus" => HostEvent::Focus,
        "blur" => HostEvent::Blur,
        "show" => HostEvent::Visibility { state: Visibility::Visible },
        "hide" => HostEvent::Visibility { state: Visibility::Hidden },
        "panel" => HostEvent::PanelFocus { focused: parts.next()? == "on" },
        "online" => HostEvent::Online,
        "offline" => HostEvent::Offline,
        _ => return None,
    };
    Some(event)
}
