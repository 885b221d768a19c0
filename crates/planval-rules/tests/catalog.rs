use planval_rules::{AlertType, RuleCategory, RuleKind, ValidationStage};

#[test]
fn rule_kind_covers_exactly_the_documented_range() {
    assert_eq!(RuleKind::ALL.len(), 46);
    for (i, kind) in RuleKind::ALL.iter().enumerate() {
        assert_eq!(kind.as_u32(), (i + 1) as u32);
    }
}

#[test]
fn categories_map_to_the_four_submission_types() {
    assert_eq!(RuleCategory::try_from(1).unwrap(), RuleCategory::Pug);
    assert_eq!(RuleCategory::try_from(4).unwrap(), RuleCategory::Patj);
    assert!(RuleCategory::try_from(5).is_err());
}

#[test]
fn stages_order_ascending() {
    assert!(ValidationStage::ContainerPresence < ValidationStage::FileLayout);
    assert!(ValidationStage::FileLayout < ValidationStage::ContentSniff);
    assert!(ValidationStage::ContentSniff < ValidationStage::SchemaDataGeometry);
}

#[test]
fn alert_type_formats_like_the_report_writer() {
    assert_eq!(AlertType::from(1).to_string(), "Blocker");
    assert_eq!(AlertType::from(2).to_string(), "Warning");
    assert_eq!(AlertType::from(9).to_string(), "9");
}
