//! Bridging the synchronous handler contract into an asynchronous one.
//!
//! [`AsyncAdapter`] is a [`DialogueHandler`] that pauses the machine at
//! every event instead of requiring the embedder to block inside its own
//! callbacks. Run the machine on a dedicated thread with the adapter as
//! its handler; the wrapped [`AsyncDialogueHandler`] receives each event
//! and the machine stays suspended until [`AsyncAdapter::go`],
//! [`AsyncAdapter::go_with_choice`], or [`AsyncAdapter::abort`] is called
//! — from inside the event callback or from any other thread.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::dialogue::{AsyncDialogueHandler, DialogueHandler, DialogueOption, Line};
use crate::error::{VmError, VmResult};
use crate::vm::VirtualMachine;

/// The lifecycle states of an [`AsyncAdapter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum AdapterState {
    /// The machine is executing; no event is pending.
    Running = 0,
    /// An event other than options was delivered; execution is blocked
    /// until [`AsyncAdapter::go`].
    Paused = 1,
    /// An options event was delivered; execution is blocked until
    /// [`AsyncAdapter::go_with_choice`].
    PausedOptions = 2,
    /// Execution has ended, via [`AsyncAdapter::abort`] or any error.
    Stopped = 3,
}

impl AdapterState {
    fn from_i32(value: i32) -> AdapterState {
        match value {
            0 => AdapterState::Running,
            1 => AdapterState::Paused,
            2 => AdapterState::PausedOptions,
            _ => AdapterState::Stopped,
        }
    }
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdapterState::Running => "Running",
            AdapterState::Paused => "Paused",
            AdapterState::PausedOptions => "PausedOptions",
            AdapterState::Stopped => "Stopped",
        })
    }
}

enum Msg {
    Go,
    Choice(usize),
    Abort(VmError),
}

struct Inner {
    state: AtomicI32,
    handler: Mutex<Box<dyn AsyncDialogueHandler>>,
    tx: Sender<Msg>,
    rx: Receiver<Msg>,
}

/// A [`DialogueHandler`] with explicit pause/continue semantics.
///
/// Cloning is cheap and clones share state, so the machine thread can own
/// one clone as its handler while the embedder keeps another to continue
/// or abort from elsewhere.
#[derive(Clone)]
pub struct AsyncAdapter {
    inner: Arc<Inner>,
}

impl AsyncAdapter {
    /// Wraps an async handler. The adapter starts in
    /// [`AdapterState::Running`], ready for the machine's first event.
    pub fn new(handler: impl AsyncDialogueHandler + 'static) -> Self {
        // The embedder may continue the machine from within an event
        // callback. With an unbuffered slot that send would never
        // complete, because the adapter only receives after the callback
        // returns; a capacity of one lets it through.
        let (tx, rx) = bounded(1);
        AsyncAdapter {
            inner: Arc::new(Inner {
                state: AtomicI32::new(AdapterState::Running as i32),
                handler: Mutex::new(Box::new(handler)),
                tx,
                rx,
            }),
        }
    }

    /// The current state.
    pub fn state(&self) -> AdapterState {
        AdapterState::from_i32(self.inner.state.load(Ordering::SeqCst))
    }

    fn transition(&self, want: AdapterState, next: AdapterState) -> VmResult {
        self.inner
            .state
            .compare_exchange(want as i32, next as i32, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|got| VmError::StateMismatch {
                got: AdapterState::from_i32(got),
                want,
                next,
            })
    }

    fn send(&self, msg: Msg) -> VmResult {
        self.inner
            .tx
            .send(msg)
            .map_err(|_| VmError::Handler("adapter message slot closed".to_string()))
    }

    /// Continues the machine after any event other than options.
    ///
    /// Returns [`VmError::StateMismatch`] if the machine is not paused on
    /// such an event.
    pub fn go(&self) -> VmResult {
        self.transition(AdapterState::Paused, AdapterState::Running)?;
        self.send(Msg::Go)
    }

    /// Continues the machine after an options event by choosing the
    /// option with the given ID.
    ///
    /// Returns [`VmError::StateMismatch`] if the machine is not paused on
    /// an options event.
    pub fn go_with_choice(&self, id: usize) -> VmResult {
        self.transition(AdapterState::PausedOptions, AdapterState::Running)?;
        self.send(Msg::Choice(id))
    }

    /// Stops the machine as soon as possible: within the current event if
    /// one is pending, otherwise at the next event. Passing `None` stops
    /// cleanly with the [`VmError::Stop`] sentinel, so node and dialogue
    /// completion events still fire.
    ///
    /// Returns [`VmError::AlreadyStopped`] if the machine already
    /// stopped.
    pub fn abort(&self, err: Option<VmError>) -> VmResult {
        let old = self
            .inner
            .state
            .swap(AdapterState::Stopped as i32, Ordering::SeqCst);
        if old == AdapterState::Stopped as i32 {
            return Err(VmError::AlreadyStopped);
        }
        self.send(Msg::Abort(err.unwrap_or(VmError::Stop)))
    }

    fn wait_for_go(&self) -> VmResult {
        match self.recv()? {
            Msg::Go => Ok(()),
            Msg::Choice(_) => Err(VmError::Handler(
                "go_with_choice called, but the last event was not options".to_string(),
            )),
            Msg::Abort(err) => Err(err),
        }
    }

    fn wait_for_choice(&self) -> VmResult<usize> {
        match self.recv()? {
            Msg::Choice(id) => Ok(id),
            Msg::Go => Err(VmError::Handler(
                "go called, but the last event was options".to_string(),
            )),
            Msg::Abort(err) => Err(err),
        }
    }

    fn recv(&self) -> VmResult<Msg> {
        self.inner
            .rx
            .recv()
            .map_err(|_| VmError::Handler("adapter message slot closed".to_string()))
    }

    /// Enters a pause state for an incoming event. If an abort landed
    /// between events, its error is surfaced here instead of a bare state
    /// mismatch.
    fn begin_event(&self, next: AdapterState) -> VmResult {
        self.transition(AdapterState::Running, next)
            .map_err(|mismatch| {
                if self.state() == AdapterState::Stopped {
                    match self.inner.rx.try_recv() {
                        Ok(Msg::Abort(err)) => err,
                        _ => mismatch,
                    }
                } else {
                    mismatch
                }
            })
    }
}

impl DialogueHandler for AsyncAdapter {
    fn node_start(&mut self, node_name: &str) -> VmResult {
        self.begin_event(AdapterState::Paused)?;
        self.inner.handler.lock().node_start(self, node_name);
        self.wait_for_go()
    }

    fn prepare_for_lines(&mut self, line_ids: &[String]) -> VmResult {
        self.begin_event(AdapterState::Paused)?;
        self.inner.handler.lock().prepare_for_lines(self, line_ids);
        self.wait_for_go()
    }

    fn line(&mut self, line: &Line) -> VmResult {
        self.begin_event(AdapterState::Paused)?;
        self.inner.handler.lock().line(self, line);
        self.wait_for_go()
    }

    fn options(&mut self, options: &[DialogueOption]) -> VmResult<usize> {
        self.begin_event(AdapterState::PausedOptions)?;
        self.inner.handler.lock().options(self, options);
        self.wait_for_choice()
    }

    fn command(&mut self, _vm: &mut VirtualMachine, command: &str) -> VmResult {
        self.begin_event(AdapterState::Paused)?;
        self.inner.handler.lock().command(self, command);
        self.wait_for_go()
    }

    fn node_complete(&mut self, node_name: &str) -> VmResult {
        match self.begin_event(AdapterState::Paused) {
            Ok(()) => {
                self.inner.handler.lock().node_complete(self, node_name);
                self.wait_for_go()
            }
            Err(VmError::StateMismatch { .. }) if self.state() == AdapterState::Stopped => {
                // Stopped via a clean abort: the completion pair still
                // reaches the handler, without pausing.
                self.inner.handler.lock().node_complete(self, node_name);
                Err(VmError::Stop)
            }
            Err(err) => Err(err),
        }
    }

    fn dialogue_complete(&mut self) -> VmResult {
        match self.begin_event(AdapterState::Paused) {
            Ok(()) => {
                self.inner.handler.lock().dialogue_complete(self);
                self.wait_for_go()
            }
            Err(VmError::StateMismatch { .. }) if self.state() == AdapterState::Stopped => {
                self.inner.handler.lock().dialogue_complete(self);
                Err(VmError::Stop)
            }
            Err(err) => Err(err),
        }
    }
}
