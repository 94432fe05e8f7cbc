//! Travel planner - terminal chat client
//!
//! Usage: `travel-planner [SESSION_ID]`. Type a message, or the number of a
//! suggested option, and press enter.

use futures::StreamExt;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::BroadcastStream;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_planner::{ClientConfig, ConversationState, HttpConversationStore, SessionEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the chat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_planner=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env();
    let session_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::info!(
        oracle = %config.oracle_base_url,
        session_id = %session_id,
        "Starting travel planner"
    );

    let store = HttpConversationStore::from_config(&config)?;
    let state = store.initialize(&session_id).await?;
    for turn in &state.history {
        println!("{turn}");
    }
    print_footer(&state);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut events = BroadcastStream::new(store.subscribe(&session_id).await);
        let current = store.get_state(&session_id).await.unwrap_or_default();
        let result = match option_choice(line, &current.pending_options) {
            Some(option) => store.select_option(&session_id, option).await,
            None => store.submit_text(&session_id, line).await,
        };
        if let Err(e) = result {
            eprintln!("! {e}");
            continue;
        }

        let shown = render_turn(&mut events).await;
        let state = store.settled(&session_id).await?;
        if let Some(last) = state.history.last() {
            match shown.and_then(|len| last.text.get(len..)) {
                Some(rest) => println!("{rest}"),
                None => println!("{last}"),
            }
        }
        print_footer(&state);
    }

    Ok(())
}

/// A 1-based option number, if `line` is one
fn option_choice<'a>(line: &str, options: &'a [String]) -> Option<&'a str> {
    let index = line.parse::<usize>().ok()?.checked_sub(1)?;
    options.get(index).map(String::as_str)
}

/// Print reveal steps until the turn resolves.
///
/// Returns how many bytes of the reply were shown, or `None` if nothing was
/// revealed (the apology is committed without a reveal).
async fn render_turn(events: &mut BroadcastStream<SessionEvent>) -> Option<usize> {
    let mut shown = None;

    while let Some(event) = events.next().await {
        match event {
            Ok(SessionEvent::RevealStep { prefix }) => {
                let from = *shown.get_or_insert_with(|| {
                    print!("Bot: ");
                    0
                });
                if let Some(fresh) = prefix.get(from..) {
                    print!("{fresh}");
                    let _ = std::io::stdout().flush();
                }
                shown = Some(prefix.len());
            }
            Ok(SessionEvent::TurnCompleted { .. } | SessionEvent::OracleFallback { .. }) => break,
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Missed session events"),
        }
    }
    shown
}

fn print_footer(state: &ConversationState) {
    println!("{}", state.record_report());
    for (i, option) in state.pending_options.iter().enumerate() {
        println!("  [{}] {option}", i + 1);
    }
}
