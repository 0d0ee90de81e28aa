//! Normalizes equation notation into arrow records.
//!
//! `y = b1*x + b2(0.3)*lag[y, 1] + 0.5*z + w`
//!
//! Terms are joined with `+` only. A coefficient is a parameter name, a
//! numeric literal (fixed), or a name with a start value in parentheses.
//! Bare terms get a generated name. Lines sharing a response accumulate.
use super::arrows::{parse_start, strip_comment, ArrowRecord, ParamToken};
use super::error::SpecError;
use crate::store::{unique_name, ArrowKind};
use smallvec::SmallVec;
use std::collections::HashSet;

const LAG_OPEN: &str = "lag[";

/// A parsed right-hand-side term before naming.
struct Term<'a> {
    coefficient: Option<(&'a str, Option<f64>)>,
    predictor: &'a str,
    lag: &'a str,
}

/// Converts equation text into arrow records, one per term, in source order.
pub fn normalize_equations(text: &str) -> Result<Vec<ArrowRecord>, SpecError> {
    // Pass 1: parse every line so generated names can avoid every explicit one.
    let mut parsed = Vec::new();
    let mut taken = HashSet::new();
    for (i, raw) in text.lines().enumerate() {
        let body = strip_comment(raw);
        if body.is_empty() {
            continue;
        }
        let (response, terms) = parse_equation(i + 1, body)?;
        for term in &terms {
            if let Some((name, _)) = term.coefficient {
                taken.insert(name.to_string());
            }
        }
        parsed.push((i + 1, body, response, terms));
    }

    // Pass 2: emit records, naming bare terms.
    let mut records = Vec::new();
    for (line, body, response, terms) in parsed {
        for term in terms {
            let (parameter, start) = match term.coefficient {
                Some((token, start)) => {
                    let parameter = ParamToken::classify(token)
                        .map_err(|reason| SpecError::grammar(line, body, reason))?;
                    (parameter, start)
                }
                None => {
                    let mut base = format!("{}_{}", response, term.predictor);
                    if term.lag != "0" {
                        base.push_str("_lag");
                        base.push_str(term.lag);
                    }
                    (ParamToken::Symbol(unique_name(&base, &mut taken)), None)
                }
            };
            if parameter == ParamToken::Missing && start.is_none() {
                return Err(SpecError::grammar(
                    line,
                    body,
                    "an `NA` coefficient needs a start value to be fixed at",
                ));
            }
            records.push(ArrowRecord {
                line,
                text: body.to_string(),
                kind: ArrowKind::Directed,
                from: term.predictor.to_string(),
                to: response.to_string(),
                lag: term.lag.to_string(),
                parameter,
                start,
            });
        }
    }
    Ok(records)
}

fn parse_equation(line: usize, text: &str) -> Result<(&str, SmallVec<[Term<'_>; 4]>), SpecError> {
    let (lhs, rhs) = text
        .split_once('=')
        .ok_or_else(|| SpecError::grammar(line, text, "missing `=`"))?;
    if rhs.contains('=') {
        return Err(SpecError::grammar(line, text, "only one `=` per equation"));
    }
    let response = lhs.trim();
    if response.starts_with(LAG_OPEN) {
        return Err(SpecError::grammar(line, text, "the response cannot be lagged"));
    }
    if !is_name(response) {
        let reason = format!("'{}' is not a valid response variable", response);
        return Err(SpecError::grammar(line, text, reason));
    }

    let mut terms = SmallVec::new();
    for raw in split_terms(rhs) {
        terms.push(parse_term(line, text, raw.trim())?);
    }
    Ok((response, terms))
}

/// Splits on `+` outside brackets and parentheses. A `+` right after the
/// exponent marker of a numeric literal (`1e+3`) does not split.
fn split_terms(rhs: &str) -> SmallVec<[&str; 4]> {
    let mut parts = SmallVec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let bytes = rhs.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'[' | b'(' => depth += 1,
            b']' | b')' => depth -= 1,
            b'+' if depth == 0 => {
                let exponent = i >= 2
                    && matches!(bytes[i - 1], b'e' | b'E')
                    && bytes[i - 2].is_ascii_digit()
                    && parse_prefix_is_numeric(&rhs[start..i - 1]);
                if !exponent {
                    parts.push(&rhs[start..i]);
                    start = i + 1;
                }
            }
            _ => {}
        }
    }
    parts.push(&rhs[start..]);
    parts
}

fn parse_prefix_is_numeric(prefix: &str) -> bool {
    let p = prefix.trim();
    !p.is_empty() && p.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn parse_term<'a>(line: usize, text: &str, term: &'a str) -> Result<Term<'a>, SpecError> {
    if term.is_empty() {
        return Err(SpecError::grammar(line, text, "empty term"));
    }
    if term.starts_with('-') {
        return Err(SpecError::grammar(
            line,
            text,
            format!("unary minus in '{}'; signs are estimated, write the term without `-`", term),
        ));
    }
    if has_top_level_minus(term) {
        let reason = format!("subtraction in '{}'; only `+` combines terms", term);
        return Err(SpecError::grammar(line, text, reason));
    }

    let (coefficient, predictor) = match split_top_level(term, '*') {
        Some((coef, pred)) => (Some(parse_coefficient(line, text, coef.trim())?), pred.trim()),
        None => (None, term),
    };

    let (predictor, lag) = match predictor.strip_prefix(LAG_OPEN) {
        Some(rest) => {
            let inner = rest.strip_suffix(']').ok_or_else(|| {
                SpecError::grammar(line, text, format!("unterminated `lag[` in '{}'", term))
            })?;
            let (var, k) = inner.split_once(',').ok_or_else(|| {
                SpecError::grammar(line, text, "`lag[var, k]` needs a variable and a lag")
            })?;
            (var.trim(), k.trim())
        }
        None => (predictor, "0"),
    };
    if !is_name(predictor) {
        let reason = format!("'{}' is not a valid predictor", predictor);
        return Err(SpecError::grammar(line, text, reason));
    }

    Ok(Term { coefficient, predictor, lag })
}

/// `name`, `literal`, or `name(start)`.
fn parse_coefficient<'a>(
    line: usize,
    text: &str,
    coef: &'a str,
) -> Result<(&'a str, Option<f64>), SpecError> {
    if coef.is_empty() {
        return Err(SpecError::grammar(line, text, "empty coefficient before `*`"));
    }
    match coef.split_once('(') {
        Some((name, rest)) => {
            let inner = rest.strip_suffix(')').ok_or_else(|| {
                SpecError::grammar(line, text, format!("unterminated start value in '{}'", coef))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(SpecError::grammar(
                    line,
                    text,
                    "start value without a coefficient name",
                ));
            }
            Ok((name, parse_start(inner.trim(), line, text)?))
        }
        None => Ok((coef, None)),
    }
}

fn split_top_level(term: &str, sep: char) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, c) in term.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            // A second factor stays in the remainder and fails the predictor check.
            c if c == sep && depth == 0 => return Some((&term[..i], &term[i + 1..])),
            _ => {}
        }
    }
    None
}

/// A `-` outside brackets/parentheses that is not part of a numeric
/// coefficient's exponent.
fn has_top_level_minus(term: &str) -> bool {
    let bytes = term.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'[' | b'(' => depth += 1,
            b']' | b')' => depth -= 1,
            b'-' if depth == 0 => {
                let exponent =
                    i >= 2 && matches!(bytes[i - 1], b'e' | b'E') && bytes[i - 2].is_ascii_digit();
                if !exponent {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

fn is_name(token: &str) -> bool {
    !token.is_empty()
        && !token.chars().any(|c| {
            c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '*' | '+' | '-' | '=' | ',')
        })
}
