//! Interactive session over one cache.
//!
//! `recent` and `show` mount their view: the view stays subscribed until the
//! next one is mounted, so writes refetch it and the refreshed data is shown
//! before the next prompt. The prompt flags fetches still running.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use eventcache_core::api::EventListParams;
use eventcache_core::events::{self, RECENT_EVENTS_MAX};
use eventcache_core::query::{CacheEntry, InvalidateOptions, QueryKey, QueryStatus, Subscription};
use eventcache_core::Event;

use crate::app::{settled, App};
use crate::commands::Command;

#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    #[command(flatten)]
    App(Command),

    /// Mark all events stale and refetch the mounted view
    Refresh,

    /// Abort running event fetches
    Cancel,

    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    Recent,
    Detail(String),
}

struct Mounted {
    view: View,
    _subscription: Subscription,
}

pub async fn run(app: &App) -> Result<()> {
    app.output.info("Type `help` for commands, `exit` to leave.");
    let updated = Arc::new(AtomicBool::new(false));
    let mut mounted: Option<Mounted> = None;

    loop {
        if updated.swap(false, Ordering::SeqCst) {
            if let Some(current) = &mounted {
                render_cached(app, &current.view);
            }
        }

        let prompt = if app.client().fetching_count() > 0 {
            "events (fetching)> "
        } else {
            "events> "
        };
        let Some(line) = read_line(prompt).await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        let result = match command {
            ShellCommand::Exit => break,
            ShellCommand::Refresh => {
                let matched = app
                    .client()
                    .invalidate(&events::events_key(), InvalidateOptions::default());
                app.output.info(&format!("Marked {} queries stale", matched));
                Ok(())
            }
            ShellCommand::Cancel => {
                let cancelled = app.client().cancel_queries(&events::events_key());
                app.output.info(&format!("Cancelled {} fetches", cancelled));
                Ok(())
            }
            ShellCommand::App(Command::Recent) => mount_recent(app, &updated, &mut mounted).await,
            ShellCommand::App(Command::Show { id }) => {
                mount_detail(app, &id, &updated, &mut mounted).await
            }
            ShellCommand::App(Command::Delete { id }) => {
                let result = app.delete(&id).await;
                // Leave the detail view of a deleted event
                if result.is_ok() && mounted.as_ref().is_some_and(|m| m.view == View::Detail(id.clone())) {
                    mounted = None;
                }
                result
            }
            ShellCommand::App(Command::Search { term }) => app.search(&term.join(" ")).await,
            ShellCommand::App(Command::Create(args)) => app.create(args).await,
            ShellCommand::App(Command::Edit { id, fields }) => app.edit(&id, fields).await,
            ShellCommand::App(Command::Images) => app.images().await,
            ShellCommand::App(Command::Shell) => {
                app.output.info("Already in the shell.");
                Ok(())
            }
        };

        if let Err(e) = result {
            app.output.error(&format!("{:#}", e));
        }
    }

    debug!("Shell closed");
    Ok(())
}

async fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .map(|read| (read > 0).then_some(line))
    })
    .await??;
    Ok(line)
}

/// Observer that flags a re-render once a background fetch has settled.
fn rerender_flag(updated: &Arc<AtomicBool>) -> impl Fn(&QueryKey, &CacheEntry) + Send + Sync + 'static {
    let updated = Arc::clone(updated);
    move |key: &QueryKey, entry: &CacheEntry| {
        if !entry.is_fetching && entry.status == QueryStatus::Success {
            debug!(%key, "Mounted view updated");
            updated.store(true, Ordering::SeqCst);
        }
    }
}

async fn mount_recent(app: &App, updated: &Arc<AtomicBool>, mounted: &mut Option<Mounted>) -> Result<()> {
    let (subscription, state) = app
        .queries
        .observe_recent_events(rerender_flag(updated))
        .await?;
    *mounted = Some(Mounted {
        view: View::Recent,
        _subscription: subscription,
    });
    updated.store(false, Ordering::SeqCst);

    let events = settled(state, events::FETCH_EVENTS_FAILED)?;
    app.output.events("Recently added events", &events);
    Ok(())
}

async fn mount_detail(
    app: &App,
    id: &str,
    updated: &Arc<AtomicBool>,
    mounted: &mut Option<Mounted>,
) -> Result<()> {
    let (subscription, state) = app.queries.observe_event(id, rerender_flag(updated)).await?;
    *mounted = Some(Mounted {
        view: View::Detail(id.to_string()),
        _subscription: subscription,
    });
    updated.store(false, Ordering::SeqCst);

    let event = settled(state, events::EVENT_DETAILS_FAILED)?;
    app.output.event(&event, app.config.base_url());
    Ok(())
}

fn render_cached(app: &App, view: &View) {
    match view {
        View::Recent => {
            let Ok(key) = events::list_key(&EventListParams::recent(RECENT_EVENTS_MAX)) else {
                return;
            };
            if let Some(events) = app.client().get_query_data::<Vec<Event>>(&key) {
                app.output.events("Recently added events (updated)", &events);
            }
        }
        View::Detail(id) => {
            let Ok(key) = events::event_key(id) else {
                return;
            };
            if let Some(event) = app.client().get_query_data::<Event>(&key) {
                app.output.event(&event, app.config.base_url());
            }
        }
    }
}
