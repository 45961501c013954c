mod answer;
mod app;
mod bindings;
mod config;
mod logging;
mod raster;
mod recognize;
mod session;
mod stroke;
mod surface;

use anyhow::anyhow;
use config::Config;
use eframe::egui;
use recognize::{GeminiClient, Recognizer};
use session::Session;
use std::sync::Arc;

// ── Main ────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let config = Config::load();
    logging::init(config.debug);
    if let Some(path) = &config.env_file {
        tracing::debug!("loaded environment from {}", path.display());
    }
    if config.api_key.is_none() {
        tracing::warn!(
            "{} is not set; calculations will fail until it is",
            config::API_KEY_VAR
        );
    }
    tracing::info!(model = %config.model, "starting math-notes");

    let recognizer: Arc<dyn Recognizer> = Arc::new(GeminiClient::new(&config)?);
    let size = config.canvas_size;
    let session = Session::new(size, config.style, recognizer);

    let title = "Math Notes - AI";
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([size.0 as f32 + 16.0, size.1 as f32 + 56.0])
            .with_title(title),
        ..Default::default()
    };

    eframe::run_native(
        title,
        options,
        Box::new(move |cc| Ok(Box::new(app::MathNotesApp::new(cc, session, size)))),
    )
    .map_err(|err| anyhow!("failed to run eframe: {err}"))
}
