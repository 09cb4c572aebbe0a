//! Dedicated presentation task fed by the poller's wake channel.
//!
//! The frame loop is synchronous, so it runs on a blocking thread. Each wake
//! opens a fresh surface if there is anything to show; alerts inserted while
//! a session is open join that session directly through the shared stack.

use agenda_core::config::DisplayConfig;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::error::SurfaceError;
use crate::presentation::{PresentationLoop, SessionOutcome};
use crate::stack::AlertStack;
use crate::surface::Surface;

pub struct DisplayService<F> {
    stack: AlertStack,
    config: DisplayConfig,
    wake_rx: mpsc::Receiver<()>,
    make_surface: F,
}

impl<F, S> DisplayService<F>
where
    F: FnMut() -> S,
    S: Surface,
{
    /// `make_surface` is called once per session.
    pub fn new(
        stack: AlertStack,
        config: DisplayConfig,
        wake_rx: mpsc::Receiver<()>,
        make_surface: F,
    ) -> Self {
        Self {
            stack,
            config,
            wake_rx,
            make_surface,
        }
    }

    /// Block until the wake channel closes, running one session per wake.
    ///
    /// Returns the number of sessions run. The first surface error (usually
    /// one that cannot be opened) ends the service; pending alerts are left
    /// in the stack.
    pub fn run_blocking(mut self) -> Result<usize, SurfaceError> {
        info!("display service started");
        let mut sessions = 0;
        while self.wake_rx.blocking_recv().is_some() {
            // Collapse wakes that queued up while the last session ran.
            while self.wake_rx.try_recv().is_ok() {}
            if self.stack.is_empty() {
                continue;
            }

            let mut surface = (self.make_surface)();
            let mut presenter = PresentationLoop::new(self.stack.clone(), &self.config);
            match presenter.run_session(&mut surface) {
                Ok(SessionOutcome::Closed) => {
                    // A host-closed surface discards what it was showing.
                    self.stack.clear_all();
                    sessions += 1;
                }
                Ok(_) => sessions += 1,
                Err(e) => {
                    error!(error = %e, pending = self.stack.len(), "display session failed");
                    return Err(e);
                }
            }
        }
        info!(sessions, "display service stopped");
        Ok(sessions)
    }
}
