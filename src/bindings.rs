use eframe::egui::{Event, InputState, Key, KeyboardShortcut, Modifiers};

/// Everything a button or shortcut can ask the session to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Clear,
    Undo,
    Calculate,
    SaveImage,
}

impl Command {
    /// Toolbar order.
    pub const BUTTONS: [Command; 4] = [
        Command::Clear,
        Command::Undo,
        Command::Calculate,
        Command::SaveImage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Command::Clear => "Clear",
            Command::Undo => "Undo",
            Command::Calculate => "Calculate",
            Command::SaveImage => "Save image…",
        }
    }
}

/// Keyboard shortcut table, checked in registration order.
#[derive(Clone, Debug)]
pub struct Bindings {
    keys: Vec<(KeyboardShortcut, Command)>,
}

impl Default for Bindings {
    fn default() -> Self {
        let mut bindings = Self { keys: Vec::new() };
        bindings.bind(KeyboardShortcut::new(Modifiers::COMMAND, Key::Z), Command::Undo);
        bindings.bind(KeyboardShortcut::new(Modifiers::COMMAND, Key::S), Command::SaveImage);
        bindings.bind(KeyboardShortcut::new(Modifiers::NONE, Key::Enter), Command::Calculate);
        bindings
    }
}

impl Bindings {
    pub fn bind(&mut self, shortcut: KeyboardShortcut, command: Command) {
        self.keys.push((shortcut, command));
    }

    /// Command bound to exactly this key and modifier combination. Cmd and
    /// Ctrl are interchangeable off macOS; any other extra modifier misses.
    pub fn lookup(&self, modifiers: Modifiers, key: Key) -> Option<Command> {
        self.keys
            .iter()
            .find(|(shortcut, _)| {
                shortcut.logical_key == key && modifiers.matches_exact(shortcut.modifiers)
            })
            .map(|(_, command)| *command)
    }

    /// Consume every bound key press of this frame, in event order.
    pub fn pressed(&self, input: &mut InputState) -> Vec<Command> {
        let presses: Vec<(Modifiers, Key)> = input
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Key {
                    key,
                    pressed: true,
                    modifiers,
                    ..
                } => Some((*modifiers, *key)),
                _ => None,
            })
            .collect();

        let mut commands = Vec::new();
        for (modifiers, key) in presses {
            if let Some(command) = self.lookup(modifiers, key) {
                let _ = input.consume_key(modifiers, key);
                commands.push(command);
            }
        }
        commands
    }

    /// Human-readable shortcut for a command, for button tooltips.
    pub fn hint(&self, command: Command) -> Option<String> {
        self.keys
            .iter()
            .find(|(_, c)| *c == command)
            .map(|(shortcut, _)| format_shortcut(shortcut))
    }
}

fn format_shortcut(shortcut: &KeyboardShortcut) -> String {
    let mut out = String::new();
    if shortcut.modifiers.command {
        out.push_str(if cfg!(target_os = "macos") { "Cmd+" } else { "Ctrl+" });
    }
    if shortcut.modifiers.shift {
        out.push_str("Shift+");
    }
    if shortcut.modifiers.alt {
        out.push_str("Alt+");
    }
    out.push_str(shortcut.logical_key.name());
    out
}
