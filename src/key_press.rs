use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// The UI element a key press originated from.
///
/// Bindings registered without a target validator never fire while the
/// focused element accepts text, so plain typing can't trigger them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget {
    /// Single-line text input widget.
    TextInput,
    /// Multi-line text area.
    TextArea,
    /// Anything that doesn't accept typed text (tables, panes, app chrome).
    Surface,
}

impl KeyTarget {
    /// Whether typing into this target produces text.
    pub fn accepts_text(&self) -> bool {
        matches!(self, KeyTarget::TextInput | KeyTarget::TextArea)
    }
}

/// A raw key press as delivered to the matcher: the crossterm event plus
/// the target it was aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub event: KeyEvent,
    pub target: KeyTarget,
}

impl KeyPress {
    /// Key press on a non-editable surface.
    pub fn new(event: KeyEvent) -> Self {
        Self {
            event,
            target: KeyTarget::Surface,
        }
    }

    pub fn with_target(event: KeyEvent, target: KeyTarget) -> Self {
        Self { event, target }
    }

    /// The normalized token for this press, e.g. `ctrl+shift+k`.
    pub fn token(&self) -> String {
        normalize_token(&self.event)
    }
}

/// Normalize a key event into a matcher token.
///
/// Fixed segment order: `ctrl` (control or the platform meta/super key),
/// `shift`, `alt`, then the lowercased key name, joined with `+`. A press of
/// a bare modifier key contributes no key-name segment, so holding ctrl is
/// `ctrl`, not `ctrl+control`.
pub fn normalize_token(event: &KeyEvent) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);

    if event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER | KeyModifiers::META)
    {
        parts.push("ctrl".to_string());
    }
    if event.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("shift".to_string());
    }
    if event.modifiers.contains(KeyModifiers::ALT) {
        parts.push("alt".to_string());
    }

    if let Some(name) = key_name(event.code) {
        parts.push(name);
    }

    parts.join("+")
}

/// Lowercase name for a key code, `None` for bare modifier presses and keys
/// with no stable name.
fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_lowercase().to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "escape".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "backtab".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Insert => "insert".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::F(n) => format!("f{}", n),
        KeyCode::Modifier(_) => return None,
        _ => return None,
    };
    Some(name)
}

/// Format a key event for display in indicators and debug panes.
pub fn format_key_for_display(key: &KeyEvent) -> String {
    let mut parts = Vec::new();

    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER | KeyModifiers::META)
    {
        parts.push("Ctrl");
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt");
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("Shift");
    }

    let key_str = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                c.to_uppercase().to_string()
            } else {
                c.to_string()
            }
        }
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Backspace => "⌫".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "BackTab".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::Delete => "Del".to_string(),
        KeyCode::Insert => "Ins".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Modifier(_) => String::new(),
        _ => "?".to_string(),
    };

    if parts.is_empty() {
        key_str
    } else if key_str.is_empty() {
        parts.join("+")
    } else {
        format!("{}-{}", parts.join("+"), key_str)
    }
}
