//! Lightweight hooks for observing array and stream I/O.

use std::sync::{Arc, OnceLock};

/// `IoKind` names the operation an event describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IoKind {
    Read,
    Write,
    /// A unit re-derived on the fly from the surviving members.
    Reconstruct,
    /// A recovered disk rewritten stripe by stripe.
    Rebuild,
}

/// `DiskIo` captures an event on one member disk.
#[derive(Copy, Clone, Debug)]
pub struct DiskIo {
    pub disk: usize,
    pub kind: IoKind,
    pub bytes: u64,
    pub error: bool,
}

/// `StreamIo` captures an event at the logical stream surface.
#[derive(Copy, Clone, Debug)]
pub struct StreamIo {
    pub kind: IoKind,
    pub bytes: u64,
    pub error: bool,
}

/// `EventSink` receives disk and stream events from the array.
pub trait EventSink: Send + Sync + 'static {
    /// `record_disk_io` records an event on a member disk.
    fn record_disk_io(&self, io: DiskIo);
    /// `record_stream_io` records an event at the stream surface.
    fn record_stream_io(&self, io: StreamIo);
}

static EVENT_SINK: OnceLock<Arc<dyn EventSink>> = OnceLock::new();

/// `install_event_sink` installs a process-global sink.
///
/// # Returns
/// `true` if the sink was installed, `false` if one was already registered.
pub fn install_event_sink(sink: Arc<dyn EventSink>) -> bool {
    EVENT_SINK.set(sink).is_ok()
}

/// `is_enabled` reports whether a sink has been installed.
pub fn is_enabled() -> bool {
    EVENT_SINK.get().is_some()
}

pub(crate) fn record_disk_io(io: DiskIo) {
    if let Some(sink) = EVENT_SINK.get() {
        sink.record_disk_io(io);
    }
}

pub(crate) fn record_stream_io(io: StreamIo) {
    if let Some(sink) = EVENT_SINK.get() {
        sink.record_stream_io(io);
    }
}
