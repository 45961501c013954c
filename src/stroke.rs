use crate::surface::{SegmentId, Surfaces};
use eframe::egui::Pos2;

// ── Data Model ──────────────────────────────────────────────────────────────

/// One rendered line between two consecutive pointer samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    id: SegmentId,
    from: Pos2,
    to: Pos2,
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn from(&self) -> Pos2 {
        self.from
    }

    pub fn to(&self) -> Pos2 {
        self.to
    }
}

/// The segments of one drag gesture; the unit of undo.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Action {
    segments: Vec<Segment>,
}

impl Action {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Endpoint of the last segment.
    pub fn end(&self) -> Option<Pos2> {
        self.segments.last().map(Segment::to)
    }
}

// ── Stroke Recorder ─────────────────────────────────────────────────────────

/// Turns pointer samples into segments while a gesture is active.
#[derive(Debug, Default)]
pub struct StrokeRecorder {
    current: Vec<Segment>,
    last: Option<Pos2>,
}

impl StrokeRecorder {
    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }

    pub fn begin(&mut self, pos: Pos2) {
        self.current.clear();
        self.last = Some(pos);
    }

    /// Emit a segment from the previous sample to `pos`. Samples outside a
    /// gesture are ignored.
    pub fn motion(&mut self, pos: Pos2, surfaces: &mut Surfaces) {
        let Some(prev) = self.last else {
            return;
        };
        let id = surfaces.draw_segment(prev, pos);
        self.current.push(Segment {
            id,
            from: prev,
            to: pos,
        });
        self.last = Some(pos);
    }

    /// Finish the gesture, handing any segments to the log. Returns whether an
    /// action was recorded.
    pub fn end(&mut self, log: &mut ActionLog) -> bool {
        if !self.is_active() {
            return false;
        }
        self.last = None;
        let segments = std::mem::take(&mut self.current);
        log.record(Action { segments })
    }

    /// Abandon the gesture in progress. Its segments are dropped and later
    /// samples are ignored until the next `begin`.
    pub fn cancel(&mut self) {
        if self.is_active() {
            tracing::debug!(segments = self.current.len(), "cancelled gesture");
        }
        self.current.clear();
        self.last = None;
    }

    #[cfg(test)]
    pub fn pending(&self) -> &[Segment] {
        &self.current
    }
}

// ── Action Log ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ActionLog {
    actions: Vec<Action>,
}

impl ActionLog {
    /// Append `action` unless it is empty.
    pub fn record(&mut self, action: Action) -> bool {
        if action.is_empty() {
            return false;
        }
        let segments = action.len();
        self.actions.push(action);
        tracing::debug!(segments, total = self.len(), "recorded action");
        true
    }

    /// Drop the most recent action and rebuild both surfaces from what is
    /// left. Does nothing on an empty log.
    pub fn undo(&mut self, surfaces: &mut Surfaces) -> Option<Action> {
        let action = self.actions.pop()?;
        for segment in action.segments() {
            surfaces.canvas.remove(segment.id());
        }
        self.redraw(surfaces);
        tracing::debug!(remaining = self.len(), "undid action");
        Some(action)
    }

    pub fn clear(&mut self, surfaces: &mut Surfaces) {
        self.actions.clear();
        surfaces.wipe();
    }

    /// Wipe both surfaces and replay every segment in insertion order.
    pub fn redraw(&self, surfaces: &mut Surfaces) {
        surfaces.wipe();
        for segment in self.actions().iter().flat_map(Action::segments) {
            surfaces.redraw_segment(segment.id(), segment.from(), segment.to());
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Endpoint of the last segment of the last action.
    pub fn last_endpoint(&self) -> Option<Pos2> {
        self.actions.last().and_then(Action::end)
    }
}
