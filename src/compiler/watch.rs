//! Watch mode: recompile when primitives change.
//!
//! Three layers, each testable on its own:
//!
//! - [`DebounceMachine`] is a pure state machine. It is driven by change
//!   events and clock ticks and decides when a recompile is due.
//! - [`run_watch`] is the async loop. It feeds events from a channel into the
//!   machine, sleeps until the next deadline and runs one recompile at a time.
//! - [`watch_project`] starts a `notify` watcher on the project root and
//!   forwards relevant paths into the channel.
//!
//! ```text
//!          change                 tick (deadline passed)
//!   Idle ─────────► Triggered ──► Debouncing ──────────► Recompiling ──► Idle
//!                                  ▲      │ change                │
//!                                  └──────┘ (timer reset)         │ change while running
//!                                                                 ▼
//!                                                      pending ──► Triggered
//! ```
//!
//! A stop request received while recompiling lets the recompile finish and
//! then halts. The output file itself is always written atomically, so a stop
//! never leaves a half-written document.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, trace, warn};

use crate::constants::DISCOVERY_DIRS;
use crate::core::{AwdError, PrimitiveKind};
use crate::utils::fs::is_temp_file;

/// Current phase of the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Waiting for changes.
    Idle,
    /// A change arrived; the debounce timer has not been armed yet.
    Triggered {
        /// Time of the latest change
        at: Instant,
    },
    /// Waiting for the quiet period to elapse.
    Debouncing {
        /// When the recompile becomes due
        deadline: Instant,
    },
    /// A recompile is running.
    Recompiling {
        /// Whether more changes arrived while running
        pending: bool,
    },
    /// Terminal.
    Stopped,
}

/// What the caller should do after [`DebounceMachine::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Nothing to do yet.
    None,
    /// Run one recompile, then call [`DebounceMachine::finish_recompile`].
    Recompile,
}

/// Debounce and single-flight logic for watch mode.
///
/// The machine never reads the clock; every transition takes `now` from the
/// caller, so tests can drive it with synthetic instants.
#[derive(Debug, Clone)]
pub struct DebounceMachine {
    state: WatchState,
    debounce: Duration,
    stop_requested: bool,
}

impl DebounceMachine {
    /// New machine in [`WatchState::Idle`].
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: WatchState::Idle,
            debounce,
            stop_requested: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Whether the machine reached [`WatchState::Stopped`].
    pub fn is_stopped(&self) -> bool {
        self.state == WatchState::Stopped
    }

    /// Record a relevant file-system change.
    pub fn on_change(&mut self, now: Instant) {
        self.state = match self.state {
            WatchState::Idle | WatchState::Triggered { .. } => WatchState::Triggered { at: now },
            WatchState::Debouncing { .. } => WatchState::Debouncing {
                deadline: now + self.debounce,
            },
            WatchState::Recompiling { .. } => WatchState::Recompiling { pending: true },
            WatchState::Stopped => WatchState::Stopped,
        };
    }

    /// Advance timers. Returns [`WatchAction::Recompile`] when the quiet period is over.
    pub fn poll(&mut self, now: Instant) -> WatchAction {
        if let WatchState::Triggered { at } = self.state {
            self.state = WatchState::Debouncing {
                deadline: at + self.debounce,
            };
        }

        match self.state {
            WatchState::Debouncing { deadline } if now >= deadline => {
                self.state = WatchState::Recompiling { pending: false };
                WatchAction::Recompile
            }
            _ => WatchAction::None,
        }
    }

    /// Mark the running recompile as done.
    ///
    /// Changes that arrived meanwhile start a fresh debounce period from `now`.
    pub fn finish_recompile(&mut self, now: Instant) {
        let WatchState::Recompiling { pending } = self.state else {
            return;
        };

        self.state = if self.stop_requested {
            WatchState::Stopped
        } else if pending {
            WatchState::Triggered { at: now }
        } else {
            WatchState::Idle
        };
    }

    /// Ask the machine to stop. A running recompile is allowed to finish first.
    pub fn request_stop(&mut self) {
        match self.state {
            WatchState::Recompiling { .. } => self.stop_requested = true,
            _ => self.state = WatchState::Stopped,
        }
    }

    /// When the next recompile is due, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            WatchState::Triggered { at } => Some(at + self.debounce),
            WatchState::Debouncing { deadline } => Some(deadline),
            _ => None,
        }
    }
}

/// Counters reported when the watch loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    /// Recompiles started
    pub recompiles: usize,
    /// Recompiles that returned an error
    pub failures: usize,
}

/// Run the watch loop until `shutdown` resolves or `events` closes.
///
/// Each message on `events` is a batch of changed paths. `recompile` runs on
/// the loop's own task, so at most one recompile is in flight. Its errors are
/// logged and counted; they never end the loop.
pub async fn run_watch<F>(
    mut events: UnboundedReceiver<Vec<PathBuf>>,
    shutdown: impl Future<Output = ()>,
    debounce: Duration,
    mut recompile: F,
) -> WatchSummary
where
    F: FnMut() -> anyhow::Result<()>,
{
    let mut machine = DebounceMachine::new(debounce);
    let mut summary = WatchSummary::default();
    let mut shutdown_fired = false;
    tokio::pin!(shutdown);

    while !machine.is_stopped() {
        let deadline = machine.next_deadline();

        tokio::select! {
            biased;
            () = &mut shutdown, if !shutdown_fired => {
                debug!("Watch shutdown requested");
                shutdown_fired = true;
                machine.request_stop();
            }
            received = events.recv() => match received {
                Some(paths) => {
                    trace!("Change detected: {:?}", paths);
                    machine.on_change(Instant::now());
                }
                None => {
                    debug!("Watch event channel closed");
                    machine.request_stop();
                }
            },
            () = sleep_until_deadline(deadline) => {}
        }

        if machine.poll(Instant::now()) == WatchAction::Recompile {
            summary.recompiles += 1;
            info!("Recompiling");
            if let Err(e) = recompile() {
                summary.failures += 1;
                warn!("Recompile failed: {:#}", e);
            }

            while events.try_recv().is_ok() {
                machine.on_change(Instant::now());
            }
            machine.finish_recompile(Instant::now());
        }
    }

    summary
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Decides which file-system paths should trigger a recompile.
///
/// Relevant paths are anything under a discovery directory and primitive
/// files at the project root. The output file, temporary files from writing
/// it and paths inside ignored directories never are.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    root: PathBuf,
    output: PathBuf,
    ignored_dirs: Vec<String>,
}

impl RelevanceFilter {
    /// Filter for `root`, excluding `output` and directories named in `ignored_dirs`.
    pub fn new(root: impl Into<PathBuf>, output: impl Into<PathBuf>, ignored_dirs: &[String]) -> Self {
        Self {
            root: root.into(),
            output: output.into(),
            ignored_dirs: ignored_dirs.to_vec(),
        }
    }

    /// Whether a change to `path` should trigger a recompile.
    pub fn is_relevant(&self, path: &Path) -> bool {
        if path == self.output || is_temp_file(path) {
            return false;
        }
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };

        let names: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect();

        match names.as_slice() {
            [] => false,
            [_single] => PrimitiveKind::from_path(relative).is_some(),
            [first, rest @ ..] => {
                DISCOVERY_DIRS.contains(first) && !rest.iter().any(|n| self.ignored_dirs.iter().any(|d| d == n))
            }
        }
    }
}

/// Start watching `root` recursively.
///
/// Relevant paths (see [`RelevanceFilter`]) from create, modify and remove
/// events are sent as one batch per event. Dropping the returned watcher
/// stops notifications and closes the channel.
///
/// # Errors
///
/// [`AwdError::WatchError`] when the platform watcher cannot be created or
/// cannot watch `root`.
pub fn watch_project(
    root: &Path,
    filter: RelevanceFilter,
) -> Result<(RecommendedWatcher, UnboundedReceiver<Vec<PathBuf>>), AwdError> {
    let (tx, rx) = unbounded_channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!("File watcher error: {}", e);
                return;
            }
        };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
            return;
        }

        let relevant: Vec<PathBuf> = event.paths.into_iter().filter(|p| filter.is_relevant(p)).collect();
        if !relevant.is_empty() {
            let _ = tx.send(relevant);
        }
    })
    .map_err(|e| AwdError::WatchError {
        reason: e.to_string(),
    })?;

    watcher.watch(root, RecursiveMode::Recursive).map_err(|e| AwdError::WatchError {
        reason: format!("{}: {}", root.display(), e),
    })?;

    Ok((watcher, rx))
}
