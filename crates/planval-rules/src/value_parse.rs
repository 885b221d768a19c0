//! Parser for the `formula_regula` / `valoare_regula` mini-language.
//!
//! Per spec.md §9 ("Regex and enum parsing of `valoare_regula`"): the field
//! is overloaded across rules as an integer, a regex, a comma list, a
//! `column-dtype` pair list, a `layer-column` or `layer:column` tuple, or a
//! literal enumeration. Each validator calls the shape it expects here
//! instead of scattering ad-hoc `split` calls across `planval-core`.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValueParseError {
    #[error("expected an integer, got {0:?}")]
    NotAnInteger(String),
    #[error("invalid regex {0:?}: {1}")]
    BadRegex(String, regex::Error),
    #[error("expected `a-b`, got {0:?}")]
    NotADashPair(String),
    #[error("expected `a:b`, got {0:?}")]
    NotAColonPair(String),
    #[error("expected at least {1} comma-separated fields, got {0:?}")]
    TooFewFields(String, usize),
}

pub type Result<T> = std::result::Result<T, ValueParseError>;

/// Parse a bare integer (R3, R5, R8, R10, R12, R16, R18).
pub fn as_int(s: &str) -> Result<i64> {
    s.trim()
        .parse()
        .map_err(|_| ValueParseError::NotAnInteger(s.to_string()))
}

/// Compile `s` as a regular expression (R4, R9, R13).
pub fn as_regex(s: &str) -> Result<Regex> {
    Regex::new(s.trim()).map_err(|e| ValueParseError::BadRegex(s.to_string(), e))
}

/// Split on commas and trim each field, dropping empty fields
/// (R6, R7, R11, R19, R21, R23, R40).
pub fn comma_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `"layer-column"` on the first hyphen (R30, R42, R43, R44).
pub fn dash_pair(s: &str) -> Result<(String, String)> {
    let s = s.trim();
    s.split_once('-')
        .map(|(a, b)| (a.trim().to_string(), b.trim().to_string()))
        .ok_or_else(|| ValueParseError::NotADashPair(s.to_string()))
}

/// Split `"layer:column"` on the colon (R26, R38).
pub fn colon_pair(s: &str) -> Result<(String, String)> {
    let s = s.trim();
    s.split_once(':')
        .map(|(a, b)| (a.trim().to_string(), b.trim().to_string()))
        .ok_or_else(|| ValueParseError::NotAColonPair(s.to_string()))
}

/// Parse a comma list of `"column-dtype"` pairs (R22).
pub fn dash_pairs(s: &str) -> Result<Vec<(String, String)>> {
    comma_list(s).iter().map(|field| dash_pair(field)).collect()
}

/// Parse a comma list of `"column-kind"` pairs (R23).
pub fn column_kind_pairs(s: &str) -> Result<Vec<(String, String)>> {
    dash_pairs(s)
}

/// Exactly-N comma-separated fields (R25's `h1,h2,h3` triple).
pub fn exact_fields(s: &str, n: usize) -> Result<Vec<String>> {
    let fields = comma_list(s);
    if fields.len() < n {
        return Err(ValueParseError::TooFewFields(s.to_string(), n));
    }
    Ok(fields)
}

/// Parse R46's `"layer-col,col,col"` shape: a layer name, then a dash, then
/// a comma list of column names.
pub fn layer_and_columns(s: &str) -> Result<(String, Vec<String>)> {
    let (layer, rest) = dash_pair(s)?;
    Ok((layer, comma_list(&rest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_int() {
        assert_eq!(as_int(" 3 ").unwrap(), 3);
        assert!(as_int("three").is_err());
    }

    #[test]
    fn parses_comma_list_trimming_and_dropping_blanks() {
        assert_eq!(
            comma_list(" a, b ,,c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn parses_dash_pair() {
        assert_eq!(
            dash_pair("PlanSpatial-POT").unwrap(),
            ("PlanSpatial".to_string(), "POT".to_string())
        );
        assert!(dash_pair("no-dash-ambiguous-is-fine").is_ok());
        assert!(dash_pair("nodash").is_err());
    }

    #[test]
    fn parses_colon_pair() {
        assert_eq!(
            colon_pair("PlanSpatial:cod_zona").unwrap(),
            ("PlanSpatial".to_string(), "cod_zona".to_string())
        );
    }

    #[test]
    fn parses_dash_pairs_list() {
        let got = dash_pairs("Data_aprob-datetime64[ms],CUT-float").unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].0, "Data_aprob");
    }

    #[test]
    fn rejects_short_field_lists() {
        assert!(exact_fields("a,b", 3).is_err());
        assert!(exact_fields("a,b,c", 3).is_ok());
    }

    #[test]
    fn layer_and_columns_splits_correctly() {
        let (layer, cols) = layer_and_columns("Zone-cod_zona,tip,zona").unwrap();
        assert_eq!(layer, "Zone");
        assert_eq!(cols, vec!["cod_zona", "tip", "zona"]);
    }
}
