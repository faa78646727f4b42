use std::sync::Arc;
use std::time::Duration;

use kuchikikiki::NodeRef;
use log::debug;
use tokio::task::JoinHandle;

use crate::document;
use crate::segmenter::{SentenceUnit, WRAPPER_CLASS};

// @module: Playback state machine over the sentence sequence

/// Class name carrying the configured highlight style
pub const HIGHLIGHT_CLASS: &str = "highlight";

/// Callback invoked when the advance timer fires, carrying the arming epoch
pub type TimerNotify = Arc<dyn Fn(u64) + Send + Sync>;

/// Single-shot, cancellable auto-advance timer.
///
/// The timer is an explicit abortable task handle owned by the state
/// machine, never an ambient timer: pause, re-arm and close all cancel
/// through the same point. Each arm bumps an epoch that the fired callback
/// carries, so a tick that raced with cancellation can be told apart from a
/// live one.
pub struct AdvanceTimer {
    notify: TimerNotify,
    handle: Option<JoinHandle<()>>,
    epoch: u64,
}

impl AdvanceTimer {
    pub fn new(notify: TimerNotify) -> Self {
        AdvanceTimer {
            notify,
            handle: None,
            epoch: 0,
        }
    }

    /// Arm a new single-shot timer, cancelling any previously armed one.
    /// Returns the epoch the fired callback will carry.
    pub fn arm(&mut self, delay: Duration) -> u64 {
        self.cancel();
        self.epoch += 1;
        let epoch = self.epoch;
        let notify = self.notify.clone();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            notify(epoch);
        }));
        epoch
    }

    /// Cancel the pending timer, if any. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Epoch of the most recent arm
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a timer is currently pending
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for AdvanceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Outcome of a playback transition
pub enum Activation {
    /// The unit at `index` is now the current, highlighted unit
    Activated {
        /// Index of the activated unit
        index: usize,
        /// Decoded plain text of the unit
        text: String,
        /// Wrapper node, for scroll positioning
        node: NodeRef,
    },

    /// The cursor moved past the end of the sequence; the reader must close
    Exhausted,

    /// The operation was ignored (advance while paused)
    Ignored,
}

/// Owns the ordered sentence sequence and a cursor into it.
///
/// The current highlight is explicit state carried here, cleared as a
/// transition action rather than looked up from the document.
pub struct Playback {
    units: Vec<SentenceUnit>,
    current: usize,
    paused: bool,
    highlighted: Option<usize>,
    timeout_ms: u64,
    timer: AdvanceTimer,
}

impl Playback {
    /// Load a sentence sequence: cursor at 0, not paused, no pending timer.
    pub fn new(units: Vec<SentenceUnit>, timeout_ms: u64, notify: TimerNotify) -> Self {
        Playback {
            units,
            current: 0,
            paused: false,
            highlighted: None,
            timeout_ms,
            timer: AdvanceTimer::new(notify),
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Epoch of the most recently armed timer; ticks carrying an older
    /// epoch are stale and must be discarded by the caller.
    pub fn timer_epoch(&self) -> u64 {
        self.timer.epoch()
    }

    /// Whether an auto-advance timer is pending
    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Activate the first unit of a freshly loaded sequence.
    pub fn start(&mut self) -> Activation {
        self.activate()
    }

    /// Advance the cursor by `step` and activate. No-op while paused.
    pub fn advance(&mut self, step: usize) -> Activation {
        if self.paused {
            return Activation::Ignored;
        }
        self.clear_highlight();
        self.current += step;
        self.activate()
    }

    /// Retreat the cursor by `step`, clamped at 0, and activate.
    ///
    /// Retreat never auto-pauses and is not gated on the pause flag; the
    /// timer it re-arms will find `advance` blocked while paused.
    pub fn retreat(&mut self, step: usize) -> Activation {
        self.clear_highlight();
        self.current = self.current.saturating_sub(step);
        self.activate()
    }

    /// Cancel the pending timer and set the pause flag. Idempotent.
    pub fn pause(&mut self) {
        self.timer.cancel();
        self.paused = true;
    }

    /// Clear the pause flag and re-activate the current index without
    /// moving the cursor, re-arming the timer. Returns `None` when not
    /// paused.
    ///
    /// The original timer was already cancelled at pause time, so resuming
    /// re-triggers highlight, notification and timer for the current
    /// sentence rather than continuing a stale one.
    pub fn resume(&mut self) -> Option<Activation> {
        if !self.paused {
            return None;
        }
        self.paused = false;
        Some(self.advance(0))
    }

    /// Cancel the pending timer and discard the sequence.
    pub fn close(&mut self) {
        self.timer.cancel();
        self.units.clear();
        self.current = 0;
        self.highlighted = None;
    }

    /// The core per-step action: highlight the current unit and arm the
    /// auto-advance timer, or report exhaustion when the cursor has moved
    /// past the end of the sequence.
    fn activate(&mut self) -> Activation {
        if self.current >= self.units.len() {
            self.timer.cancel();
            return Activation::Exhausted;
        }

        if self.highlighted != Some(self.current) {
            self.clear_highlight();
        }

        let unit = &self.units[self.current];
        document::set_attribute(&unit.node, "class", HIGHLIGHT_CLASS);
        self.highlighted = Some(self.current);

        if self.timeout_ms > 0 {
            let epoch = self.timer.arm(Duration::from_millis(self.timeout_ms));
            debug!("Armed advance timer for sentence {} (epoch {})", self.current, epoch);
        }

        Activation::Activated {
            index: unit.index,
            text: unit.text(),
            node: unit.node.clone(),
        }
    }

    /// Restore the wrapper class on the previously highlighted unit.
    fn clear_highlight(&mut self) {
        if let Some(index) = self.highlighted.take() {
            if let Some(unit) = self.units.get(index) {
                document::set_attribute(&unit.node, "class", WRAPPER_CLASS);
            }
        }
    }
}
