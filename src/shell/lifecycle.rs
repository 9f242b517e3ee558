// SPDX-License-Identifier: GPL-3.0-only
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Starting,
    Running { open_windows: usize },
    Terminating,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Page the presentation surface loads
    pub entry_page: String,
}

impl WindowSpec {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.window_title.clone(),
            width: config.window_width,
            height: config.window_height,
            entry_page: config.entry_page.clone(),
        }
    }
}

#[derive(Debug)]
struct Window {
    spec: WindowSpec,
    /// A presentation surface is connected to this window
    attached: bool,
}

#[derive(Debug)]
struct Inner {
    state: ShellState,
    windows: BTreeMap<WindowId, Window>,
    next_id: u64,
}

impl Inner {
    fn open(&mut self, spec: WindowSpec, attached: bool) -> WindowId {
        self.next_id += 1;
        let id = WindowId(self.next_id);
        info!(window = %id, title = %spec.title, width = spec.width, height = spec.height, "Window opened");
        self.windows.insert(id, Window { spec, attached });
        self.state = ShellState::Running {
            open_windows: self.windows.len(),
        };
        id
    }

    fn is_running(&self) -> bool {
        matches!(self.state, ShellState::Running { .. })
    }
}

/// Process-wide window lifecycle.
///
/// Starts with one main window; once the last window closes the shell
/// either tears down or, with `quit_on_last_window_closed` off, idles until
/// `activate` reopens a window.
pub struct Shell {
    main_window: WindowSpec,
    quit_on_last_window_closed: bool,
    inner: Mutex<Inner>,
    shutdown: CancellationToken,
}

impl Shell {
    pub fn init(config: &Config) -> Arc<Self> {
        Self::new(WindowSpec::from_config(config), config.quit_on_last_window_closed)
    }

    pub fn new(main_window: WindowSpec, quit_on_last_window_closed: bool) -> Arc<Self> {
        let shell = Self {
            main_window: main_window.clone(),
            quit_on_last_window_closed,
            inner: Mutex::new(Inner {
                state: ShellState::Starting,
                windows: BTreeMap::new(),
                next_id: 0,
            }),
            shutdown: CancellationToken::new(),
        };

        shell.lock().open(main_window, false);
        Arc::new(shell)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ShellState {
        self.lock().state
    }

    pub fn window(&self, id: WindowId) -> Option<WindowSpec> {
        self.lock().windows.get(&id).map(|w| w.spec.clone())
    }

    /// Windows currently bound to a presentation surface
    pub fn surface_count(&self) -> usize {
        self.lock().windows.values().filter(|w| w.attached).count()
    }

    /// Root token; cancelled on teardown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind a newly connected presentation surface to a window.
    ///
    /// Claims the first window without a surface, otherwise opens another
    /// window. Returns `None` once teardown has begun.
    pub fn attach_surface(&self) -> Option<WindowId> {
        let mut inner = self.lock();
        if !inner.is_running() {
            return None;
        }

        if let Some((id, window)) = inner.windows.iter_mut().find(|(_, w)| !w.attached) {
            window.attached = true;
            debug!(window = %id, "Surface attached");
            return Some(*id);
        }

        Some(inner.open(self.main_window.clone(), true))
    }

    pub fn close_window(&self, id: WindowId) {
        let remaining = {
            let mut inner = self.lock();
            if inner.windows.remove(&id).is_none() || !inner.is_running() {
                return;
            }
            let open_windows = inner.windows.len();
            inner.state = ShellState::Running { open_windows };
            open_windows
        };

        info!(window = %id, remaining, "Window closed");
        if remaining == 0 {
            self.on_all_windows_closed();
        }
    }

    fn on_all_windows_closed(&self) {
        if self.quit_on_last_window_closed {
            info!("All windows closed, quitting");
            self.teardown();
        } else {
            info!("All windows closed, staying resident");
        }
    }

    /// Reopen the main window when the shell is resident with none open
    pub fn activate(&self) -> Option<WindowId> {
        let mut inner = self.lock();
        match inner.state {
            ShellState::Running { open_windows: 0 } => Some(inner.open(self.main_window.clone(), false)),
            _ => None,
        }
    }

    /// Begin shutdown: cancels every in-flight transfer and closes all windows
    pub fn teardown(&self) {
        {
            let mut inner = self.lock();
            if matches!(inner.state, ShellState::Terminating | ShellState::Terminated) {
                return;
            }
            inner.state = ShellState::Terminating;
            inner.windows.clear();
        }

        info!("Shell tearing down");
        self.shutdown.cancel();
    }

    /// Record that every service stopped
    pub fn finish(&self) {
        self.teardown();
        self.lock().state = ShellState::Terminated;
        info!("Shell terminated");
    }

    /// Resolves once teardown has begun
    pub async fn terminated(&self) {
        self.shutdown.cancelled().await
    }
}
