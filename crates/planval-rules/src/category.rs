use std::fmt;

/// Submission category (`categorie_regula_id`), 1..4.
///
/// The original source names these PUG/PUD/PUZ/PATJ; that vocabulary is kept
/// here only for `Display`/debugging. Everywhere else the spec's own "C1..C4"
/// naming is used, since nothing asks this crate to surface the Romanian
/// planning-instrument names as part of its API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// C1 — Plan Urbanistic General.
    Pug = 1,
    /// C2 — Plan Urbanistic de Detaliu.
    Pud = 2,
    /// C3 — Plan Urbanistic Zonal.
    Puz = 3,
    /// C4 — Plan de Amenajare a Teritoriului Judetean.
    Patj = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized submission category id: {0}")]
pub struct UnknownCategory(pub u32);

impl RuleCategory {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for RuleCategory {
    type Error = UnknownCategory;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(RuleCategory::Pug),
            2 => Ok(RuleCategory::Pud),
            3 => Ok(RuleCategory::Puz),
            4 => Ok(RuleCategory::Patj),
            other => Err(UnknownCategory(other)),
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleCategory::Pug => "C1/PUG",
            RuleCategory::Pud => "C2/PUD",
            RuleCategory::Puz => "C3/PUZ",
            RuleCategory::Patj => "C4/PATJ",
        };
        write!(f, "{name}")
    }
}
