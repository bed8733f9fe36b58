//! Watch mode.
//!
//! Every relevant file event requests a full rebuild. At most one build runs
//! at a time and at most one more waits behind it; requests beyond that are
//! dropped, since the queued build will pick up their changes anyway.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing is running: start now.
    Start,
    /// A build is running: run once more after it.
    Queued,
    /// A follow-up is already queued.
    Dropped,
}

#[derive(Debug, Default)]
pub struct Coalescer {
    running: bool,
    pending: bool,
}

impl Coalescer {
    pub fn request(&mut self) -> Decision {
        if !self.running {
            self.running = true;
            Decision::Start
        } else if !self.pending {
            self.pending = true;
            Decision::Queued
        } else {
            Decision::Dropped
        }
    }

    /// Marks the running build finished. Returns true when the queued
    /// follow-up should start now.
    pub fn finish(&mut self) -> bool {
        if self.pending {
            self.pending = false;
            true
        } else {
            self.running = false;
            false
        }
    }
}

enum Message {
    Fs(notify::Result<Event>),
    Done,
}

/// Access events and writes to our own outputs never trigger a rebuild.
fn should_ignore(event: &Event, outputs: &HashSet<PathBuf>) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return true;
    }
    !event.paths.is_empty() && event.paths.iter().all(|p| outputs.contains(p))
}

fn spawn_build(config: PathBuf, tx: Sender<Message>) {
    std::thread::spawn(move || {
        eprintln!("{}", console::style("rebuilding...").dim());
        if let Err(err) = crate::build(&config) {
            crate::report_error(&err);
        }
        let _ = tx.send(Message::Done);
    });
}

pub fn run(config: &Path, poll: bool, poll_interval: Duration) -> Result<()> {
    let config = std::fs::canonicalize(config)
        .with_context(|| format!("failed to find {}", config.display()))?;
    let pipeline = crate::load(&config)?;
    let outputs: HashSet<PathBuf> = pipeline.config().output_paths().into_iter().collect();
    let mut roots = pipeline.config().source_paths();
    roots.extend(
        pipeline
            .config()
            .outputs
            .iter()
            .filter_map(|o| o.template.as_deref())
            .map(|t| pipeline.config().resolve_path(t)),
    );
    roots.push(config.clone());

    // a failed first build still leaves us watching
    if let Err(err) = crate::build(&config) {
        crate::report_error(&err);
    }

    let (tx, rx) = channel();
    let fs_tx = tx.clone();
    let handler = move |res: notify::Result<Event>| {
        let _ = fs_tx.send(Message::Fs(res));
    };
    let mut watcher: Box<dyn Watcher> = if poll {
        Box::new(
            notify::PollWatcher::new(
                handler,
                notify::Config::default().with_poll_interval(poll_interval),
            )
            .context("failed to start poll watcher")?,
        )
    } else {
        Box::new(notify::recommended_watcher(handler).context("failed to start watcher")?)
    };

    for root in &roots {
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
        tracing::debug!(path = %root.display(), "watching");
    }
    eprintln!(
        "{}",
        console::style(if poll {
            "watching for changes (polling, press Ctrl+C to stop)..."
        } else {
            "watching for changes (press Ctrl+C to stop)..."
        })
        .cyan()
    );

    let mut coalescer = Coalescer::default();
    for message in rx {
        match message {
            Message::Fs(Err(err)) => tracing::warn!(error = %err, "watch error"),
            Message::Fs(Ok(event)) => {
                if should_ignore(&event, &outputs) {
                    continue;
                }
                tracing::debug!(paths = ?event.paths, "change detected");
                if coalescer.request() == Decision::Start {
                    spawn_build(config.clone(), tx.clone());
                }
            }
            Message::Done => {
                if coalescer.finish() {
                    spawn_build(config.clone(), tx.clone());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    // =========================================================================
    // Coalescer
    // =========================================================================

    #[test]
    fn test_first_request_starts() {
        let mut c = Coalescer::default();
        assert_eq!(c.request(), Decision::Start);
        assert!(!c.finish());
        assert_eq!(c.request(), Decision::Start);
    }

    #[test]
    fn test_at_most_one_queued() {
        let mut c = Coalescer::default();
        assert_eq!(c.request(), Decision::Start);
        assert_eq!(c.request(), Decision::Queued);
        assert_eq!(c.request(), Decision::Dropped);
        assert_eq!(c.request(), Decision::Dropped);

        // the queued build starts, nothing else is waiting
        assert!(c.finish());
        assert_eq!(c.request(), Decision::Queued);
        assert!(c.finish());
        assert!(!c.finish());
    }

    // =========================================================================
    // Event filtering
    // =========================================================================

    #[test]
    fn test_ignores_access_and_outputs() {
        let outputs = HashSet::from([PathBuf::from("/p/dist/tokens.css")]);

        let access = Event::new(EventKind::Access(AccessKind::Any)).add_path("/p/tokens/a.json".into());
        assert!(should_ignore(&access, &outputs));

        let own_write =
            Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/p/dist/tokens.css".into());
        assert!(should_ignore(&own_write, &outputs));

        let source = Event::new(EventKind::Create(CreateKind::File))
            .add_path("/p/dist/tokens.css".into())
            .add_path("/p/tokens/a.json".into());
        assert!(!should_ignore(&source, &outputs));
    }
}
