use std::fmt;

/// Rule-family bucket (`tip_validare_id`) used for stage ordering (spec.md §4.4).
///
/// Report rows are ordered ascending by stage, then by `numar_regula` within
/// a stage (spec.md §3 "Invariants").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValidationStage {
    ContainerPresence = 1,
    FileLayout = 2,
    ContentSniff = 3,
    SchemaDataGeometry = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized validation stage id: {0}")]
pub struct UnknownStage(pub u32);

impl ValidationStage {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ValidationStage {
    type Error = UnknownStage;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(ValidationStage::ContainerPresence),
            2 => Ok(ValidationStage::FileLayout),
            3 => Ok(ValidationStage::ContentSniff),
            4 => Ok(ValidationStage::SchemaDataGeometry),
            other => Err(UnknownStage(other)),
        }
    }
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {}", self.as_u32())
    }
}
