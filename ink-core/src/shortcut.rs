//! Global keyboard shortcuts.

/// A key press as seen by the host window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            meta: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Ctrl/Cmd+S. Runs the same path as the save button.
    Save,
}

impl Shortcut {
    /// Whether the host must suppress the platform's default action.
    pub fn prevent_default(self) -> bool {
        match self {
            Shortcut::Save => true,
        }
    }
}

pub fn match_shortcut(press: &KeyPress) -> Option<Shortcut> {
    if !(press.ctrl || press.meta) {
        return None;
    }
    match press.key.as_str() {
        "s" | "S" => Some(Shortcut::Save),
        _ => None,
    }
}
