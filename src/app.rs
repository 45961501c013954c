use crate::bindings::{Bindings, Command};
use crate::session::Session;
use eframe::egui;

// ── App ─────────────────────────────────────────────────────────────────────

pub struct MathNotesApp {
    session: Session,
    bindings: Bindings,
    canvas_size: egui::Vec2,
}

impl MathNotesApp {
    pub fn new(cc: &eframe::CreationContext<'_>, mut session: Session, size: (u32, u32)) -> Self {
        let ctx = cc.egui_ctx.clone();
        session.set_waker(move || ctx.request_repaint());
        Self {
            session,
            bindings: Bindings::default(),
            canvas_size: egui::vec2(size.0 as f32, size.1 as f32),
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) -> Vec<Command> {
        let mut commands = Vec::new();
        ui.horizontal(|ui| {
            for command in Command::BUTTONS {
                let enabled = match command {
                    Command::Calculate => !self.session.is_calculating(),
                    Command::Undo | Command::Clear => !self.session.log().is_empty(),
                    Command::SaveImage => true,
                };
                let mut button = ui.add_enabled(enabled, egui::Button::new(command.label()));
                if let Some(hint) = self.bindings.hint(command) {
                    button = button.on_hover_text(hint);
                }
                if button.clicked() {
                    commands.push(command);
                }
            }
            ui.separator();
            if self.session.is_calculating() {
                ui.spinner();
            }
            if let Some(status) = self.session.status() {
                ui.label(status);
            }
        });
        commands
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(self.canvas_size, egui::Sense::drag());
        let rect = response.rect;
        let style = *self.session.style();
        painter.rect_filled(rect, 0.0, style.background);

        let to_canvas = |pos: egui::Pos2| (pos - rect.min).to_pos2();

        if response.drag_started_by(egui::PointerButton::Primary) {
            let origin = ui.input(|i| i.pointer.press_origin());
            if let Some(origin) = origin {
                self.session.pointer_down(to_canvas(origin));
            }
        }
        let moved = response.drag_delta() != egui::Vec2::ZERO;
        if moved && response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.session.pointer_move(to_canvas(pos));
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.session.pointer_up();
        }

        self.session
            .surfaces()
            .canvas
            .paint(&painter.with_clip_rect(rect), rect.min, &style);
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for MathNotesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.session.poll_recognition() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }

        let mut commands = ctx.input_mut(|i| self.bindings.pressed(i));

        egui::TopBottomPanel::bottom("buttons").show(ctx, |ui| {
            commands.extend(self.toolbar(ui));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas(ui);
        });

        for command in commands {
            self.session.dispatch(command);
        }
    }
}
