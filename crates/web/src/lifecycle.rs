//! Application phases and the panic translator.

use std::any::Any;
use std::fmt;
use std::panic::{self, PanicHookInfo};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, error};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Init,
    Configuring,
    Running,
    Dispatching,
    Finalizing,
    ShuttingDown,
}

/// The phase of an application and when it started.
///
/// Phases only move forward. `ShuttingDown` can be entered from any phase.
#[derive(Debug)]
pub struct Lifecycle {
    phase: Phase,
    started_at: Instant,
    started_wall: SystemTime,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self { phase: Phase::Init, started_at: Instant::now(), started_wall: SystemTime::now() }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn advance(&mut self, to: Phase) -> Result<(), Error> {
        if to == Phase::ShuttingDown || to > self.phase {
            debug!(from = ?self.phase, to = ?to, "lifecycle transition");
            self.phase = to;
            Ok(())
        } else {
            Err(Error::Lifecycle { from: self.phase, to })
        }
    }

    /// Enters `ShuttingDown`. Returns false when already there.
    pub fn shut_down(&mut self) -> bool {
        if self.phase == Phase::ShuttingDown {
            return false;
        }
        debug!(from = ?self.phase, "lifecycle shutting down");
        self.phase = Phase::ShuttingDown;
        true
    }

    /// True while a run has started but not reached finalization.
    pub fn is_unfinished(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::Dispatching)
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_wall
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Replaces the process panic hook with one that logs through `tracing`, and puts the
/// previous hook back when dropped.
pub(crate) struct PanicTranslator {
    previous: Option<PanicHook>,
}

impl PanicTranslator {
    pub(crate) fn install() -> Self {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(|info| {
            error!(panic = %info, "handler panicked");
        }));
        debug!("panic translator installed");
        Self { previous: Some(previous) }
    }

    /// Restores the previous hook. Hooks can not be changed while unwinding, so a translator
    /// dropped during a panic leaves its hook in place.
    pub(crate) fn restore(&mut self) {
        if thread::panicking() {
            return;
        }
        if let Some(previous) = self.previous.take() {
            drop(panic::take_hook());
            panic::set_hook(previous);
            debug!("panic translator restored");
        }
    }
}

impl Drop for PanicTranslator {
    fn drop(&mut self) {
        self.restore();
    }
}

impl fmt::Debug for PanicTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicTranslator").field("installed", &self.previous.is_some()).finish()
    }
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{Lifecycle, Phase, panic_message};
    use crate::error::Error;

    #[test]
    fn test_phases_only_move_forward() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), Phase::Init);

        lifecycle.advance(Phase::Configuring).unwrap();
        lifecycle.advance(Phase::Running).unwrap();
        assert!(lifecycle.is_unfinished());
        lifecycle.advance(Phase::Dispatching).unwrap();
        lifecycle.advance(Phase::Finalizing).unwrap();
        assert!(!lifecycle.is_unfinished());

        let result = lifecycle.advance(Phase::Running);
        assert!(matches!(result, Err(Error::Lifecycle { from: Phase::Finalizing, to: Phase::Running })));
        assert!(lifecycle.advance(Phase::Finalizing).is_err());
    }

    #[test]
    fn test_shutdown_is_reachable_from_any_phase() {
        for phase in [Phase::Init, Phase::Configuring, Phase::Running, Phase::Dispatching] {
            let mut lifecycle = Lifecycle::new();
            if phase != Phase::Init {
                lifecycle.advance(phase).unwrap();
            }
            lifecycle.advance(Phase::ShuttingDown).unwrap();
            assert_eq!(lifecycle.phase(), Phase::ShuttingDown);
        }

        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.shut_down());
        assert!(!lifecycle.shut_down());
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload = std::panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
