//! Rule-kind catalog for the plan validator.
//!
//! The rule table is served by a remote reference service, so `planval-rules`
//! does not ship the rule *descriptors* (numbers, messages, thresholds) —
//! those arrive at runtime in a [`Rule`](crate::rule::Rule) row. What this
//! crate fixes at compile time is the closed set of *rule kinds* (`tip_regula_id`
//! 1..46) and the small auxiliary enums the dispatcher and report writer key
//! off of. Forty-six kinds is a small, stable catalog, so this is a plain
//! static-data crate: no build script, no generated table.

mod alert;
mod category;
mod kind;
mod stage;
pub mod value_parse;

pub use alert::AlertType;
pub use category::RuleCategory;
pub use kind::RuleKind;
pub use stage::ValidationStage;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_numeric_id() {
        for id in 1..=46u32 {
            let kind = RuleKind::try_from(id).unwrap_or_else(|_| panic!("id {id} should map"));
            assert_eq!(kind.as_u32(), id);
        }
    }

    #[test]
    fn zero_and_out_of_range_ids_are_rejected() {
        assert!(RuleKind::try_from(0).is_err());
        assert!(RuleKind::try_from(47).is_err());
    }
}
