//! The rule descriptor row, as served by the reference table (spec.md §3).

use planval_rules::{AlertType, RuleCategory, RuleKind, ValidationStage, UnknownCategory, UnknownRuleKind, UnknownStage};
use serde::Deserialize;

/// One row of the remotely-served rule metadata table.
///
/// Field names mirror the wire/report vocabulary verbatim (`numar_regula`,
/// `tip_regula_id`, ...) rather than translating them, since they are the
/// stable contract with the reference service and the report columns.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub numar_regula: i64,
    pub tip_regula_id: u32,
    pub categorie_regula_id: u32,
    pub tip_validare_id: u32,
    pub tip_alerta_id: u32,
    #[serde(default)]
    pub formula_regula: String,
    #[serde(default)]
    pub valoare_regula: String,
    pub descriere: String,
    pub pass_alerta: String,
    pub fail_alerta: String,
    pub error_alerta: String,
    pub mesaj_modificare: String,
    pub eroare_modificare: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleFieldError {
    #[error(transparent)]
    Kind(#[from] UnknownRuleKind),
    #[error(transparent)]
    Category(#[from] UnknownCategory),
    #[error(transparent)]
    Stage(#[from] UnknownStage),
}

impl Rule {
    pub fn kind(&self) -> Result<RuleKind, UnknownRuleKind> {
        RuleKind::try_from(self.tip_regula_id)
    }

    pub fn category(&self) -> Result<RuleCategory, UnknownCategory> {
        RuleCategory::try_from(self.categorie_regula_id)
    }

    pub fn stage(&self) -> Result<ValidationStage, UnknownStage> {
        ValidationStage::try_from(self.tip_validare_id)
    }

    pub fn alert_type(&self) -> AlertType {
        AlertType::from(self.tip_alerta_id)
    }

    pub fn is_blocker(&self) -> bool {
        self.alert_type().is_blocker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Rule {
        Rule {
            numar_regula: 1,
            tip_regula_id: 1,
            categorie_regula_id: 1,
            tip_validare_id: 1,
            tip_alerta_id: 1,
            formula_regula: String::new(),
            valoare_regula: String::new(),
            descriere: "desc".into(),
            pass_alerta: "pass".into(),
            fail_alerta: "fail".into(),
            error_alerta: "error".into(),
            mesaj_modificare: "-".into(),
            eroare_modificare: "-".into(),
        }
    }

    #[test]
    fn decodes_kind_category_stage_and_alert() {
        let rule = sample();
        assert_eq!(rule.kind().unwrap(), RuleKind::SubmissionPathExists);
        assert_eq!(rule.category().unwrap(), RuleCategory::Pug);
        assert_eq!(rule.stage().unwrap(), ValidationStage::ContainerPresence);
        assert!(rule.is_blocker());
    }

    #[test]
    fn unknown_kind_is_reported_not_panicked() {
        let mut rule = sample();
        rule.tip_regula_id = 999;
        assert!(rule.kind().is_err());
    }
}
