use crate::compute::AssemblyError;
use crate::model::Model;
use crate::solver::EffectTable;
use crate::store::ParamRef;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One arrow with its (externally estimated) coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSummary {
    pub path: String,
    pub lag: u32,
    /// Parameter name, `None` for a fixed arrow.
    pub name: Option<String>,
    pub estimate: f64,
    pub std_error: Option<f64>,
    pub z: Option<f64>,
}

/// Keys `estimates` (and optional standard errors) back to the arrows that
/// use them, in arrow order.
pub fn summarize(
    model: &Model,
    estimates: &[f64],
    std_errors: Option<&[f64]>,
) -> Result<Vec<PathSummary>, AssemblyError> {
    let expected = model.n_parameters();
    for actual in std::iter::once(estimates.len()).chain(std_errors.map(|s| s.len())) {
        if actual != expected {
            return Err(AssemblyError::ParameterLength { expected, actual });
        }
    }

    let rows = model
        .arrows()
        .iter()
        .map(|arrow| {
            let (name, std_error) = match arrow.parameter {
                ParamRef::Free(id) => (
                    Some(model.parameters().name(id).to_string()),
                    std_errors.map(|s| s[id.index()]),
                ),
                ParamRef::Fixed(_) => (None, None),
            };
            let estimate = arrow.parameter.resolve(estimates);
            PathSummary {
                path: model.arrow_label(arrow),
                lag: arrow.lag,
                name,
                estimate,
                std_error,
                z: std_error.filter(|se| *se > 0.0).map(|se| estimate / se),
            }
        })
        .collect();
    Ok(rows)
}

pub fn format_summary(rows: &[PathSummary]) -> String {
    let mut output = String::new();
    let width = rows.iter().map(|r| r.path.len()).max().unwrap_or(4).max(4);
    let _ = writeln!(
        output,
        "{:<width$}  {:>3}  {:<12}  {:>10}  {:>10}  {:>8}",
        "path", "lag", "name", "estimate", "std_error", "z"
    );
    let _ = writeln!(output, "{}", "-".repeat(width + 55));
    for r in rows {
        let _ = writeln!(
            output,
            "{:<width$}  {:>3}  {:<12}  {:>10.4}  {:>10}  {:>8}",
            r.path,
            r.lag,
            r.name.as_deref().unwrap_or("(fixed)"),
            r.estimate,
            optional(r.std_error, 4),
            optional(r.z, 3),
        );
    }
    output
}

/// Table of total effects; pairs with no effect at any lag are skipped.
pub fn format_effects(table: &EffectTable) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "TOTAL EFFECTS ({} rows):", table.len());
    let _ = writeln!(output, "--------------------------------------------------");
    let _ = writeln!(output, "{:<24} {:>4} {:>12} {:>12}", "from -> to", "lag", "total", "direct");
    for row in table.rows() {
        if table.pair(&row.from, &row.to).all(|r| r.total_effect == 0.0) {
            continue;
        }
        let label = format!("{} -> {}", row.from, row.to);
        let _ = writeln!(
            output,
            "{:<24} {:>4} {:>12.6} {:>12.6}",
            label, row.lag, row.total_effect, row.direct_effect
        );
    }
    output
}

fn optional(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", digits, v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssemblyOptions, SolverOptions};
    use crate::solver::total_effects;
    use crate::store::Variables;

    fn model() -> Model {
        let vars = Variables::new(["x", "y"]).unwrap();
        Model::from_arrows("x -> y, 0, b\ny -> y, 1, ar\nx <-> x, 0, 1.0", &vars).unwrap()
    }

    #[test]
    fn test_summarize_keys_estimates_to_arrows() {
        let rows = summarize(&model(), &[0.5, 0.25], Some(&[0.25, 0.0][..])).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].path, "x -> y");
        assert_eq!(rows[0].name.as_deref(), Some("b"));
        assert_eq!(rows[0].estimate, 0.5);
        assert_eq!(rows[0].z, Some(2.0));

        // A zero standard error yields no z statistic.
        assert_eq!(rows[1].lag, 1);
        assert_eq!(rows[1].std_error, Some(0.0));
        assert_eq!(rows[1].z, None);

        assert_eq!(rows[2].name, None);
        assert_eq!(rows[2].estimate, 1.0);
        assert_eq!(rows[2].std_error, None);
    }

    #[test]
    fn test_summarize_checks_lengths() {
        let m = model();
        assert_eq!(
            summarize(&m, &[0.5], None),
            Err(AssemblyError::ParameterLength { expected: 2, actual: 1 })
        );
        assert_eq!(
            summarize(&m, &[0.5, 0.1], Some(&[0.1][..])),
            Err(AssemblyError::ParameterLength { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_format_summary() {
        let text = format_summary(&summarize(&model(), &[0.5, 0.25], None).unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("path"));
        assert!(lines[2].contains("0.5000"));
        assert!(lines[4].contains("(fixed)"));
    }

    #[test]
    fn test_format_effects_skips_empty_pairs() {
        let (assembly, solver) = (AssemblyOptions::default(), SolverOptions::default());
        let table = total_effects(&model(), &[0.5, 0.25], 1, &assembly, &solver).unwrap();
        let text = format_effects(&table);
        assert!(text.contains("x -> y"));
        assert!(!text.contains("y -> x"));
    }
}
