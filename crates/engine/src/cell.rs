use serde::{Deserialize, Serialize};

/// Background color value meaning "unset": fully opaque white in ARGB.
///
/// A cell with this color and empty text carries no persisted state and may
/// be omitted by a serializer.
pub const DEFAULT_BACKGROUND: u32 = 0xFFFF_FFFF;

/// Sentinel error states a cell's value can hold.
///
/// Per the error model, a failed evaluation never surfaces as a Rust error
/// to the editing caller: the edit succeeds and the failure is written into
/// the cell's value as one of these fixed strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    /// Formula names a cell that cannot be resolved.
    BadReference,
    /// Formula directly references its own cell.
    SelfReference,
    /// Formula participates in a reference cycle.
    CircularReference,
    /// Formula references a cell holding a bad/self reference error.
    ReferenceToInvalid,
    /// Formula passed reference validation but failed to evaluate
    /// (division by zero, malformed expression).
    Evaluation,
}

impl CellError {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::BadReference => "!(bad reference)",
            CellError::SelfReference => "!(self reference)",
            CellError::CircularReference => "!(circular reference)",
            CellError::ReferenceToInvalid => "!(reference to invalid)",
            CellError::Evaluation => "!(evaluation error)",
        }
    }

    /// Recognize a sentinel string in a cell value.
    pub fn from_value(value: &str) -> Option<CellError> {
        match value {
            "!(bad reference)" => Some(CellError::BadReference),
            "!(self reference)" => Some(CellError::SelfReference),
            "!(circular reference)" => Some(CellError::CircularReference),
            "!(reference to invalid)" => Some(CellError::ReferenceToInvalid),
            "!(evaluation error)" => Some(CellError::Evaluation),
            _ => None,
        }
    }
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of the grid.
///
/// `text` is the raw user input and the authoritative source of truth;
/// `value` is derived from it (verbatim for literals, evaluation result or
/// error sentinel for formulas). Dependency relations live in the grid's
/// `DepGraph`, not in the cell itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
    pub value: String,
    pub background_color: u32,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            text: String::new(),
            value: String::new(),
            background_color: DEFAULT_BACKGROUND,
        }
    }
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the cell's text makes it a formula cell.
    pub fn is_formula(&self) -> bool {
        self.text.starts_with('=')
    }

    /// True if the cell carries no state worth persisting.
    pub fn is_unset(&self) -> bool {
        self.text.is_empty() && self.background_color == DEFAULT_BACKGROUND
    }

    /// The sentinel error this cell's value holds, if any.
    pub fn error(&self) -> Option<CellError> {
        CellError::from_value(&self.value)
    }

    /// The cell's value as a number; non-numeric values count as zero.
    pub fn as_number(&self) -> f64 {
        self.value.parse().unwrap_or(0.0)
    }
}
