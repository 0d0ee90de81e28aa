//! Two-pass compiler from arrow records to a `Model`.
//!
//! Pass 1 builds the parameter symbol table in first-appearance order.
//! Pass 2 resolves every arrow against that table. Nothing is looked up by
//! name after compilation.
use super::warning::CompileWarning;
use super::Model;
use crate::config::{CompileOptions, DefaultVariances};
use crate::store::{
    arrow_key, unique_name, ArrowKey, ArrowKind, ArrowSpec, ParamRef, ParameterTable, VarId,
    Variables,
};
use crate::syntax::{normalize_equations, parse_arrows, ArrowRecord, ParamToken, SpecError};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A record whose variables and lag have been checked.
struct Resolved {
    record: ArrowRecord,
    from: VarId,
    to: VarId,
    lag: u32,
}

impl Resolved {
    fn key(&self) -> ArrowKey { arrow_key(self.record.kind, self.from, self.to, self.lag) }
}

pub struct Compiler<'a> {
    variables: &'a Variables,
    options: &'a CompileOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(variables: &'a Variables, options: &'a CompileOptions) -> Self {
        Self { variables, options }
    }

    pub fn compile_arrows(&self, text: &str) -> Result<Model, SpecError> {
        self.compile(parse_arrows(text)?)
    }

    pub fn compile_equations(&self, text: &str) -> Result<Model, SpecError> {
        self.compile(normalize_equations(text)?)
    }

    /// Compiles records in order. The first error aborts the compilation.
    pub fn compile(&self, records: Vec<ArrowRecord>) -> Result<Model, SpecError> {
        let mut warnings = Vec::new();

        // 1. Validate against the variable universe and drop duplicates.
        let mut resolved = Vec::with_capacity(records.len());
        let mut seen = HashSet::new();
        for record in records {
            let arrow = self.resolve(record)?;
            if !seen.insert(arrow.key()) {
                push_warning(
                    &mut warnings,
                    CompileWarning::DuplicateArrow {
                        line: arrow.record.line,
                        source_line: arrow.record.text.clone(),
                    },
                );
                continue;
            }
            resolved.push(arrow);
        }

        if self.options.default_variances == DefaultVariances::FreeParameters {
            self.append_default_variances(&mut resolved, &seen, &mut warnings);
        }

        // 2. Pass 1: symbol table.
        let mut table = ParameterTable::new();
        for arrow in &resolved {
            let rec = &arrow.record;
            match &rec.parameter {
                ParamToken::Symbol(name) => {
                    let default = match rec.kind {
                        ArrowKind::Directed => self.options.path_start,
                        ArrowKind::Covariance => self.options.covariance_start,
                    };
                    let (_, conflict) = table.intern(name, rec.start, default);
                    if let Some(c) = conflict {
                        push_warning(
                            &mut warnings,
                            CompileWarning::ConflictingStart {
                                parameter: name.clone(),
                                line: rec.line,
                                kept: c.kept,
                                ignored: c.ignored,
                            },
                        );
                    }
                }
                ParamToken::Literal(_) => {
                    if let Some(value) = rec.start {
                        push_warning(
                            &mut warnings,
                            CompileWarning::StartOnFixed { line: rec.line, value },
                        );
                    }
                }
                ParamToken::Missing => {}
            }
        }

        // 3. Pass 2: resolve every arrow against the table.
        let mut arrows = Vec::with_capacity(resolved.len());
        for arrow in resolved {
            let rec = arrow.record;
            let (parameter, start) = match rec.parameter {
                ParamToken::Symbol(name) => {
                    let id = table.get(&name).ok_or_else(|| {
                        let reason = format!("unresolved parameter '{}'", name);
                        SpecError::grammar(rec.line, &rec.text, reason)
                    })?;
                    (ParamRef::Free(id), rec.start)
                }
                ParamToken::Literal(value) => (ParamRef::Fixed(value), None),
                ParamToken::Missing => {
                    let value = rec.start.ok_or_else(|| {
                        let reason = "an `NA` parameter needs a start value";
                        SpecError::grammar(rec.line, &rec.text, reason)
                    })?;
                    (ParamRef::Fixed(value), None)
                }
            };
            arrows.push(ArrowSpec {
                kind: rec.kind,
                from: arrow.from,
                to: arrow.to,
                lag: arrow.lag,
                parameter,
                start,
                line: rec.line,
            });
        }

        debug!(
            arrows = arrows.len(),
            parameters = table.len(),
            warnings = warnings.len(),
            "model compiled"
        );
        Ok(Model::new(self.variables.clone(), arrows, table, warnings))
    }

    fn resolve(&self, record: ArrowRecord) -> Result<Resolved, SpecError> {
        let lookup = |name: &str| {
            self.variables.get(name).ok_or_else(|| SpecError::UnknownVariable {
                line: record.line,
                source_line: record.text.clone(),
                name: name.to_string(),
            })
        };
        let from = lookup(&record.from)?;
        let to = lookup(&record.to)?;

        let lag = record.lag.parse::<u32>().map_err(|_| SpecError::InvalidLag {
            line: record.line,
            source_line: record.text.clone(),
            token: record.lag.clone(),
        })?;

        if record.kind == ArrowKind::Directed && from == to && lag == 0 {
            return Err(SpecError::SelfLoop {
                line: record.line,
                source_line: record.text.clone(),
                variable: record.from.clone(),
            });
        }

        Ok(Resolved { record, from, to, lag })
    }

    /// Appends `x <-> x, 0, V[x]` for each variable without a lag-0 variance.
    fn append_default_variances(
        &self,
        resolved: &mut Vec<Resolved>,
        seen: &HashSet<ArrowKey>,
        warnings: &mut Vec<CompileWarning>,
    ) {
        let mut taken: HashSet<String> = resolved
            .iter()
            .filter_map(|r| match &r.record.parameter {
                ParamToken::Symbol(name) => Some(name.clone()),
                _ => None,
            })
            .collect();

        for (id, name) in self.variables.iter() {
            if seen.contains(&arrow_key(ArrowKind::Covariance, id, id, 0)) {
                continue;
            }
            let parameter = unique_name(&format!("V[{}]", name), &mut taken);
            push_warning(
                warnings,
                CompileWarning::DefaultVariance {
                    variable: name.to_string(),
                    parameter: parameter.clone(),
                },
            );
            resolved.push(Resolved {
                record: ArrowRecord {
                    line: 0,
                    text: format!("{} <-> {}, 0, {}", name, name, parameter),
                    kind: ArrowKind::Covariance,
                    from: name.to_string(),
                    to: name.to_string(),
                    lag: "0".to_string(),
                    parameter: ParamToken::Symbol(parameter),
                    start: None,
                },
                from: id,
                to: id,
                lag: 0,
            });
        }
    }
}

fn push_warning(warnings: &mut Vec<CompileWarning>, warning: CompileWarning) {
    warn!("{}", warning);
    warnings.push(warning);
}
