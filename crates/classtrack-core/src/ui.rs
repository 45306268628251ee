//! Render contract between the workflow engine and the channel layer.
//! The engine emits plain text plus an optional button grid; the channel
//! decides how to put it on the wire (edit in place, or send fresh).

/// One inline button: a label and the structured callback it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub callback: String,
}

impl Button {
    pub fn new(text: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback: callback.into(),
        }
    }
}

/// A button grid, rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a full row of buttons.
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Add a single-button row.
    pub fn button(self, text: impl Into<String>, callback: impl Into<String>) -> Self {
        self.row(vec![Button::new(text, callback)])
    }
}

/// What the operator sees next: message text and an optional keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Render {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Render {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}
