use crate::stroke::ActionLog;
use crate::surface::Surfaces;
use eframe::egui::{Pos2, Vec2};

/// Offset from the end of the last stroke to where the answer is shown.
pub const ANSWER_OFFSET: Vec2 = Vec2::new(70.0, -20.0);

/// Where an answer goes, if anything has been drawn yet.
pub fn anchor(log: &ActionLog) -> Option<Pos2> {
    log.last_endpoint().map(|end| end + ANSWER_OFFSET)
}

/// Draw `answer` next to the last stroke on both surfaces. Returns the anchor
/// used, or `None` when the log is empty and nothing was drawn.
pub fn render(log: &ActionLog, surfaces: &mut Surfaces, answer: &str) -> Option<Pos2> {
    let Some(at) = anchor(log) else {
        tracing::debug!("no strokes to anchor the answer to");
        return None;
    };
    surfaces.draw_answer(at, answer);
    tracing::info!(answer, x = at.x, y = at.y, "rendered answer");
    Some(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InkStyle;
    use crate::stroke::StrokeRecorder;

    #[test]
    fn empty_log_renders_nothing() {
        let log = ActionLog::default();
        let mut surfaces = Surfaces::new(100, 100, InkStyle::default());
        assert_eq!(render(&log, &mut surfaces, "4"), None);
        assert!(surfaces.canvas.labels().is_empty());
        assert!(surfaces.raster.is_blank());
    }

    #[test]
    fn anchor_is_offset_from_last_endpoint() {
        let mut log = ActionLog::default();
        let mut surfaces = Surfaces::new(400, 300, InkStyle::default());
        let mut recorder = StrokeRecorder::default();
        recorder.begin(Pos2::new(10.0, 200.0));
        recorder.motion(Pos2::new(80.0, 210.0), &mut surfaces);
        recorder.end(&mut log);

        let at = render(&log, &mut surfaces, "12").unwrap();
        assert_eq!(at, Pos2::new(150.0, 190.0));
        assert_eq!(surfaces.canvas.labels()[0].text, "12");
    }

    #[test]
    fn malformed_answer_is_drawn_verbatim() {
        let mut log = ActionLog::default();
        let mut surfaces = Surfaces::new(400, 300, InkStyle::default());
        let mut recorder = StrokeRecorder::default();
        recorder.begin(Pos2::new(10.0, 100.0));
        recorder.motion(Pos2::new(20.0, 100.0), &mut surfaces);
        recorder.end(&mut log);

        render(&log, &mut surfaces, "I cannot tell");
        assert_eq!(surfaces.canvas.labels()[0].text, "I cannot tell");
    }
}
