//! Host positioning capability.
//!
//! A [`PositionSource`] is whatever actually owns the device sensor. Once
//! watched it pushes [`SensorEvent`]s into a channel, one at a time and in
//! delivery order, until the watch is cleared.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{errors::SensorError, models::RawFix};

/// What the host sensor hands over: a fix or one of its soft errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum SensorEvent {
    Fix(RawFix),
    Error(SensorError),
}

/// Options passed to the host when a watch is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

pub trait PositionSource {
    /// Whether the device has a positioning capability at all.
    fn is_available(&self) -> bool;

    /// Opens a continuous watch. Any previous watch is replaced.
    fn watch(
        &mut self,
        options: &WatchOptions,
    ) -> Result<UnboundedReceiver<SensorEvent>, SensorError>;

    /// Closes the current watch, if any.
    fn clear_watch(&mut self);
}

impl<S: PositionSource + ?Sized> PositionSource for Box<S> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn watch(
        &mut self,
        options: &WatchOptions,
    ) -> Result<UnboundedReceiver<SensorEvent>, SensorError> {
        (**self).watch(options)
    }

    fn clear_watch(&mut self) {
        (**self).clear_watch()
    }
}

#[derive(Debug)]
struct ChannelState {
    available: bool,
    sender: Option<UnboundedSender<SensorEvent>>,
    options: Option<WatchOptions>,
    watches_opened: usize,
}

/// Channel-backed source. Host glue keeps a [`SourceHandle`] and pushes
/// whatever its native callbacks deliver.
#[derive(Debug, Clone)]
pub struct ChannelSource {
    state: Arc<Mutex<ChannelState>>,
}

impl ChannelSource {
    pub fn new() -> (Self, SourceHandle) {
        let state = Arc::new(Mutex::new(ChannelState {
            available: true,
            sender: None,
            options: None,
            watches_opened: 0,
        }));
        let handle = SourceHandle {
            state: state.clone(),
        };
        (Self { state }, handle)
    }

    /// A source on a device without positioning hardware.
    pub fn unavailable() -> (Self, SourceHandle) {
        let (source, handle) = Self::new();
        handle.set_available(false);
        (source, handle)
    }
}

impl PositionSource for ChannelSource {
    fn is_available(&self) -> bool {
        lock(&self.state).available
    }

    fn watch(
        &mut self,
        options: &WatchOptions,
    ) -> Result<UnboundedReceiver<SensorEvent>, SensorError> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(SensorError::CapabilityUnavailable);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.sender = Some(tx);
        state.options = Some(*options);
        state.watches_opened += 1;
        Ok(rx)
    }

    fn clear_watch(&mut self) {
        let mut state = lock(&self.state);
        state.sender = None;
        state.options = None;
    }
}

#[derive(Debug, Clone)]
pub struct SourceHandle {
    state: Arc<Mutex<ChannelState>>,
}

impl SourceHandle {
    /// Delivers a fix. Returns false when nobody is watching.
    pub fn push_fix(&self, fix: RawFix) -> bool {
        self.push(SensorEvent::Fix(fix))
    }

    pub fn push_error(&self, error: SensorError) -> bool {
        self.push(SensorEvent::Error(error))
    }

    pub fn push(&self, event: SensorEvent) -> bool {
        let state = lock(&self.state);
        match &state.sender {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Ends the watch from the host side. Events already delivered can
    /// still be read.
    pub fn close(&self) {
        lock(&self.state).sender = None;
    }

    pub fn set_available(&self, available: bool) {
        lock(&self.state).available = available;
    }

    pub fn is_watching(&self) -> bool {
        lock(&self.state)
            .sender
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Options of the currently open watch.
    pub fn watch_options(&self) -> Option<WatchOptions> {
        lock(&self.state).options
    }

    pub fn watches_opened(&self) -> usize {
        lock(&self.state).watches_opened
    }
}

fn lock(state: &Mutex<ChannelState>) -> MutexGuard<'_, ChannelState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
