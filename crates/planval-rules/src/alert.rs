use std::fmt;

/// Severity of a rule (`tip_alerta_id`): Blocker invalidates the run's
/// verdict on Fail/Error, Warning never does (spec.md §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    Blocker,
    Warning,
    /// Any other numeric id, kept verbatim for the report (spec.md §6:
    /// "numeric pass-through if unknown").
    Other(u32),
}

impl AlertType {
    pub fn is_blocker(self) -> bool {
        matches!(self, AlertType::Blocker)
    }
}

impl From<u32> for AlertType {
    fn from(id: u32) -> Self {
        match id {
            1 => AlertType::Blocker,
            2 => AlertType::Warning,
            other => AlertType::Other(other),
        }
    }
}

/// Matches `writer.py::_format_alert_type`: known ids become words, anything
/// else round-trips through its original textual form.
impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::Blocker => write!(f, "Blocker"),
            AlertType::Warning => write!(f, "Warning"),
            AlertType::Other(id) => write!(f, "{id}"),
        }
    }
}
