use crate::answer;
use crate::bindings::Command;
use crate::config::InkStyle;
use crate::recognize::{PendingRecognition, Poll, Recognizer};
use crate::stroke::{ActionLog, StrokeRecorder};
use crate::surface::Surfaces;
use anyhow::{Context, Result};
use eframe::egui::Pos2;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type Waker = Arc<dyn Fn() + Send + Sync>;

/// All drawing and undo state for one canvas, handed explicitly to every
/// event handler.
pub struct Session {
    log: ActionLog,
    recorder: StrokeRecorder,
    surfaces: Surfaces,
    style: InkStyle,
    recognizer: Arc<dyn Recognizer>,
    pending: Option<PendingRecognition>,
    waker: Option<Waker>,
    status: Option<String>,
}

impl Session {
    pub fn new(size: (u32, u32), style: InkStyle, recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            log: ActionLog::default(),
            recorder: StrokeRecorder::default(),
            surfaces: Surfaces::new(size.0, size.1, style),
            style,
            recognizer,
            pending: None,
            waker: None,
            status: None,
        }
    }

    /// Called from the recognition worker once it has a result, so the UI
    /// can wake up and collect it.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    pub fn style(&self) -> &InkStyle {
        &self.style
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_calculating(&self) -> bool {
        self.pending.is_some()
    }

    // ── Pointer ─────────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, pos: Pos2) {
        self.recorder.begin(pos);
    }

    pub fn pointer_move(&mut self, pos: Pos2) {
        self.recorder.motion(pos, &mut self.surfaces);
    }

    pub fn pointer_up(&mut self) {
        self.recorder.end(&mut self.log);
    }

    // ── Commands ────────────────────────────────────────────────────────────

    pub fn dispatch(&mut self, command: Command) {
        tracing::debug!(?command, "dispatch");
        match command {
            Command::Clear => self.clear(),
            Command::Undo => self.undo(),
            Command::Calculate => self.calculate(),
            Command::SaveImage => self.save_image_dialog(),
        }
    }

    pub fn clear(&mut self) {
        self.recorder.cancel();
        self.log.clear(&mut self.surfaces);
        self.status = None;
    }

    pub fn undo(&mut self) {
        self.recorder.cancel();
        self.log.undo(&mut self.surfaces);
    }

    /// Start recognizing the current raster in the background. Ignored while
    /// a previous request is still running.
    pub fn calculate(&mut self) {
        if self.pending.is_some() {
            tracing::debug!("recognition already in flight");
            return;
        }
        let waker = self.waker.clone();
        self.pending = Some(PendingRecognition::spawn(
            self.surfaces.raster.image().clone(),
            Arc::clone(&self.recognizer),
            move || {
                if let Some(wake) = waker {
                    wake();
                }
            },
        ));
        self.status = Some("Calculating…".to_string());
    }

    /// Collect a finished recognition, if any. Returns whether one is still
    /// running.
    pub fn poll_recognition(&mut self) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        match pending.poll() {
            Poll::Pending => true,
            Poll::Done(answer) => {
                self.pending = None;
                self.deliver(answer);
                false
            }
        }
    }

    /// Block until the running recognition finishes and render its answer.
    #[cfg(test)]
    pub fn finish_recognition(&mut self) {
        if let Some(pending) = self.pending.take() {
            let answer = pending.wait();
            self.deliver(answer);
        }
    }

    fn deliver(&mut self, answer: Option<String>) {
        self.status = match answer {
            Some(answer) => {
                answer::render(&self.log, &mut self.surfaces, &answer);
                None
            }
            None => Some("No answer (see log)".to_string()),
        };
    }

    // ── Export ──────────────────────────────────────────────────────────────

    fn save_image_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name("math-notes.png")
            .save_file()
        else {
            return;
        };
        if let Err(err) = self.save_png(&path) {
            tracing::error!("{err:#}");
            self.status = Some("Saving failed (see log)".to_string());
        }
    }

    pub fn save_png(&self, path: &Path) -> Result<PathBuf> {
        let path = if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension("png")
        };
        self.surfaces
            .raster
            .image()
            .save_with_format(&path, image::ImageFormat::Png)
            .with_context(|| format!("saving {}", path.display()))?;
        tracing::info!("saved image to {}", path.display());
        Ok(path)
    }
}
