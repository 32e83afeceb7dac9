use tokio::sync::mpsc;

use crate::{CandidateFile, ValidationResult, validate};

/// Normalized drag event, produced by the embedder at the boundary.
///
/// The embedder is responsible for suppressing the platform's default
/// drag handling before an event reaches the tracker.
#[derive(Debug, Clone)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    Drop(Vec<CandidateFile>),
}

/// Notification emitted while a drag interacts with the zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSignal {
    /// The pointer entered the zone (outermost boundary only).
    Entered,
    /// The pointer is hovering; fired on every over event to keep the
    /// visual affordance alive.
    Over,
    /// The pointer left the zone entirely.
    Left,
}

/// Tracks whether something is being dragged over a drop zone.
///
/// Nested descendants fire their own enter/leave pairs as the pointer
/// crosses element boundaries, so a plain boolean flickers off while the
/// drag is still conceptually over the outer zone. The enter-depth
/// counter keeps the signal stable: it only drops once every enter has
/// been matched by a leave, or a drop lands.
pub struct DropZone {
    depth: u32,
    dragging: bool,
    signals_tx: mpsc::UnboundedSender<DragSignal>,
    signals_rx: Option<mpsc::UnboundedReceiver<DragSignal>>,
}

impl Default for DropZone {
    fn default() -> Self {
        Self::new()
    }
}

impl DropZone {
    pub fn new() -> Self {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        Self {
            depth: 0,
            dragging: false,
            signals_tx,
            signals_rx: Some(signals_rx),
        }
    }

    /// Takes the signal receiver. Can only be called once.
    pub fn take_signals(&mut self) -> Option<mpsc::UnboundedReceiver<DragSignal>> {
        self.signals_rx.take()
    }

    /// Feeds one normalized event through the tracker.
    ///
    /// Returns the validation result when the event is a drop.
    pub fn handle(&mut self, event: DragEvent) -> Option<ValidationResult> {
        match event {
            DragEvent::Enter => {
                self.on_drag_enter();
                None
            }
            DragEvent::Over => {
                self.on_drag_over();
                None
            }
            DragEvent::Leave => {
                self.on_drag_leave();
                None
            }
            DragEvent::Drop(files) => Some(self.on_drop(files)),
        }
    }

    pub fn on_drag_enter(&mut self) {
        self.depth += 1;
        if self.depth == 1 {
            self.dragging = true;
            self.emit(DragSignal::Entered);
        }
    }

    pub fn on_drag_over(&mut self) {
        self.emit(DragSignal::Over);
    }

    pub fn on_drag_leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.dragging = false;
            self.emit(DragSignal::Left);
        }
    }

    /// Handles a drop: resets the drag state and validates the payload.
    ///
    /// Zero dropped files is not an error at this layer — it yields an
    /// invalid result with a single descriptive message.
    pub fn on_drop(&mut self, files: Vec<CandidateFile>) -> ValidationResult {
        self.depth = 0;
        self.dragging = false;

        if files.is_empty() {
            return ValidationResult::rejected("No files were dropped");
        }

        validate(files)
    }

    /// Clears the drag state without emitting a signal.
    pub fn reset(&mut self) {
        self.depth = 0;
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn emit(&self, signal: DragSignal) {
        // A dropped receiver never blocks the tracker.
        let _ = self.signals_tx.send(signal);
    }
}
