//! Line parser for arrow notation:
//! `from -> to, lag, parameter [, start]` and `from <-> to, lag, parameter [, start]`.
//!
//! This stage is purely syntactic. Variable names and lags are kept as raw
//! tokens and resolved by the compiler against the variable universe.
use super::error::SpecError;
use crate::store::ArrowKind;
use std::fmt::Write;

/// Token that marks a missing value (RAM convention).
pub const MISSING: &str = "NA";

/// Classified parameter column.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamToken {
    Symbol(String),
    Literal(f64),
    /// `NA`: fixed at the record's start value.
    Missing,
}

impl ParamToken {
    /// Fails on a token that looks numeric but is not a finite number.
    pub fn classify(token: &str) -> Result<Self, String> {
        if token == MISSING {
            return Ok(ParamToken::Missing);
        }
        Ok(match parse_literal(token)? {
            Some(value) => ParamToken::Literal(value),
            None => ParamToken::Symbol(token.to_string()),
        })
    }
}

/// One syntactically valid arrow line.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowRecord {
    pub line: usize,
    pub text: String,
    pub kind: ArrowKind,
    pub from: String,
    pub to: String,
    pub lag: String,
    pub parameter: ParamToken,
    pub start: Option<f64>,
}

/// Parses a numeric literal. A token starting with a digit, sign or `.` is
/// numeric and must be a finite number; anything else (`inf`, `nan`, names)
/// is `Ok(None)`.
pub(crate) fn parse_literal(token: &str) -> Result<Option<f64>, String> {
    let Some(first) = token.chars().next() else {
        return Ok(None);
    };
    if !(first.is_ascii_digit() || matches!(first, '-' | '+' | '.')) {
        return Ok(None);
    }
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(format!("'{}' is not a finite number", token)),
    }
}

/// Parses a start column. `NA` (or an empty column) means no start value.
pub(crate) fn parse_start(token: &str, line: usize, text: &str) -> Result<Option<f64>, SpecError> {
    if token.is_empty() || token == MISSING {
        return Ok(None);
    }
    match parse_literal(token) {
        Ok(Some(value)) => Ok(Some(value)),
        Ok(None) => Err(SpecError::grammar(
            line,
            text,
            format!("start value '{}' is not a finite number", token),
        )),
        Err(reason) => Err(SpecError::grammar(line, text, format!("start value {}", reason))),
    }
}

/// Strips a trailing `#` comment and surrounding whitespace.
pub(crate) fn strip_comment(raw: &str) -> &str {
    match raw.find('#') {
        Some(pos) => raw[..pos].trim(),
        None => raw.trim(),
    }
}

/// Parses every non-blank, non-comment line of `text`.
pub fn parse_arrows(text: &str) -> Result<Vec<ArrowRecord>, SpecError> {
    let mut records = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let body = strip_comment(raw);
        if body.is_empty() {
            continue;
        }
        records.push(parse_line(i + 1, body)?);
    }
    Ok(records)
}

fn parse_line(line: usize, text: &str) -> Result<ArrowRecord, SpecError> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.len() != 3 && fields.len() != 4 {
        return Err(SpecError::grammar(
            line,
            text,
            format!(
                "expected `from -> to, lag, parameter [, start]`, found {} fields",
                fields.len()
            ),
        ));
    }

    // `<->` must be tried first since it contains `->`.
    let (kind, (from, to)) = if let Some(pair) = fields[0].split_once("<->") {
        (ArrowKind::Covariance, pair)
    } else if let Some(pair) = fields[0].split_once("->") {
        (ArrowKind::Directed, pair)
    } else {
        return Err(SpecError::grammar(line, text, "missing `->` or `<->`"));
    };
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() {
        return Err(SpecError::grammar(line, text, "arrow needs a variable on both ends"));
    }
    if to.contains("->") {
        return Err(SpecError::grammar(line, text, "only one arrow per line"));
    }

    let parameter = match fields[2] {
        "" => return Err(SpecError::grammar(line, text, "empty parameter column")),
        token => {
            ParamToken::classify(token).map_err(|reason| SpecError::grammar(line, text, reason))?
        }
    };
    let start = match fields.get(3) {
        Some(token) => parse_start(token, line, text)?,
        None => None,
    };
    if parameter == ParamToken::Missing && start.is_none() {
        return Err(SpecError::grammar(
            line,
            text,
            "an `NA` parameter needs a start value to be fixed at",
        ));
    }

    Ok(ArrowRecord {
        line,
        text: text.to_string(),
        kind,
        from: from.to_string(),
        to: to.to_string(),
        lag: fields[1].to_string(),
        parameter,
        start,
    })
}

/// Renders records back into arrow notation, one per line.
pub fn render_arrows(records: &[ArrowRecord]) -> String {
    let mut out = String::new();
    for rec in records {
        let param = match &rec.parameter {
            ParamToken::Symbol(name) => name.clone(),
            ParamToken::Literal(value) => value.to_string(),
            ParamToken::Missing => MISSING.to_string(),
        };
        let _ = write!(out, "{} {} {}, {}, {}", rec.from, rec.kind, rec.to, rec.lag, param);
        if let Some(start) = rec.start {
            let _ = write!(out, ", {}", start);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_directed_and_covariance() {
        let text = "
            # dynamics
            wolves -> wolves, 1, arW
            moose  ->  wolves ,1,MtoW, 0.2   # with a start value
            wolves <-> moose, 0, rho
        ";
        let recs = parse_arrows(text).unwrap();
        assert_eq!(recs.len(), 3);

        assert_eq!(recs[0].kind, ArrowKind::Directed);
        assert_eq!(recs[0].line, 3);
        assert_eq!(recs[0].parameter, ParamToken::Symbol("arW".into()));

        assert_eq!(recs[1].from, "moose");
        assert_eq!(recs[1].to, "wolves");
        assert_eq!(recs[1].lag, "1");
        assert_eq!(recs[1].start, Some(0.2));

        assert_eq!(recs[2].kind, ArrowKind::Covariance);
        assert_eq!(recs[2].from, "wolves");
        assert_eq!(recs[2].to, "moose");
    }

    #[rstest]
    #[case("beta", ParamToken::Symbol("beta".into()))]
    #[case("0.5", ParamToken::Literal(0.5))]
    #[case("-1", ParamToken::Literal(-1.0))]
    #[case("1e-3", ParamToken::Literal(0.001))]
    #[case("inf", ParamToken::Symbol("inf".into()))]
    #[case("V[x]", ParamToken::Symbol("V[x]".into()))]
    #[case("NA", ParamToken::Missing)]
    fn test_parameter_classification(#[case] token: &str, #[case] expected: ParamToken) {
        assert_eq!(ParamToken::classify(token), Ok(expected));
    }

    #[rstest]
    #[case("x -> y, 0, 1e400")]
    #[case("x -> y, 0, -")]
    #[case("x -> y, 0, +inf")]
    #[case("x -> y, 0, 1.2.3")]
    #[case("x -> y, 0, b, 1e400")]
    fn test_non_finite_numbers_are_grammar_errors(#[case] line: &str) {
        let err = parse_arrows(line).unwrap_err();
        assert!(matches!(err, SpecError::Grammar { line: 1, .. }), "{:?}", err);
        assert!(err.to_string().contains("not a finite number"));
    }

    #[rstest]
    #[case("x -> y, 0")]
    #[case("x -> y, 0, b, 1, 2")]
    #[case("x y, 0, b")]
    #[case(" -> y, 0, b")]
    #[case("x -> y, 0, ")]
    #[case("x -> y, 0, b, abc")]
    #[case("x -> y, 0, NA")]
    #[case("x -> y -> z, 0, b")]
    fn test_malformed_lines_are_grammar_errors(#[case] line: &str) {
        let err = parse_arrows(line).unwrap_err();
        assert!(matches!(err, SpecError::Grammar { line: 1, .. }), "{:?}", err);
    }

    #[test]
    fn test_error_reports_source_line_number() {
        let text = "x -> y, 0, b\n\n# note\nx => y, 0, c\n";
        let err = parse_arrows(text).unwrap_err();
        assert_eq!(err.line(), Some(4));
        assert!(err.to_string().contains("x => y, 0, c"));
    }

    #[test]
    fn test_na_start_means_no_start() {
        let recs = parse_arrows("x -> y, 0, b, NA").unwrap();
        assert_eq!(recs[0].start, None);
    }

    #[test]
    fn test_render_reparses_identically() {
        let text = "x -> y, 1, b, 0.3\nx <-> x, 0, 2\ny -> x, 0, NA, 0.1\n";
        let recs = parse_arrows(text).unwrap();
        let again = parse_arrows(&render_arrows(&recs)).unwrap();
        for (a, b) in recs.iter().zip(&again) {
            assert_eq!(
                (a.kind, &a.from, &a.to, &a.lag, &a.parameter, a.start),
                (b.kind, &b.from, &b.to, &b.lag, &b.parameter, b.start)
            );
        }
    }
}
