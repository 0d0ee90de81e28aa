//! The compiled, immutable model: variables, arrows and parameter table.
pub mod compiler;
pub mod warning;

pub use compiler::Compiler;
pub use warning::CompileWarning;

use crate::config::CompileOptions;
use crate::store::{ArrowSpec, ParamRef, ParameterTable, Variables};
use crate::syntax::SpecError;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    variables: Variables,
    arrows: Vec<ArrowSpec>,
    parameters: ParameterTable,
    warnings: Vec<CompileWarning>,

    // Derived from the arrows, recomputed on load
    #[serde(skip)]
    max_lag: u32,
}

impl Model {
    pub(crate) fn new(
        variables: Variables,
        arrows: Vec<ArrowSpec>,
        parameters: ParameterTable,
        warnings: Vec<CompileWarning>,
    ) -> Self {
        let max_lag = largest_lag(&arrows);
        Self { variables, arrows, parameters, warnings, max_lag }
    }

    /// Compiles arrow notation with default options.
    pub fn from_arrows(text: &str, variables: &Variables) -> Result<Self, SpecError> {
        Compiler::new(variables, &CompileOptions::default()).compile_arrows(text)
    }

    /// Compiles equation notation with default options.
    pub fn from_equations(text: &str, variables: &Variables) -> Result<Self, SpecError> {
        Compiler::new(variables, &CompileOptions::default()).compile_equations(text)
    }

    pub fn variables(&self) -> &Variables { &self.variables }
    pub fn arrows(&self) -> &[ArrowSpec] { &self.arrows }
    pub fn parameters(&self) -> &ParameterTable { &self.parameters }
    pub fn warnings(&self) -> &[CompileWarning] { &self.warnings }
    pub fn has_warnings(&self) -> bool { !self.warnings.is_empty() }

    /// Largest lag over all arrows; matrices exist for lags `0..=max_lag`.
    pub fn max_lag(&self) -> u32 { self.max_lag }

    pub fn n_parameters(&self) -> usize { self.parameters.len() }

    /// Starting values in parameter-vector order.
    pub fn start_values(&self) -> Vec<f64> { self.parameters.start_values() }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.get(name).map(|id| id.index())
    }

    /// Arrows constrained to the parameter `name`.
    pub fn arrows_using<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ArrowSpec> + 'a {
        let target = self.parameters.get(name);
        self.arrows
            .iter()
            .filter(move |a| {
                matches!((a.parameter, target), (ParamRef::Free(id), Some(t)) if id == t)
            })
    }

    /// `from -> to` label of an arrow.
    pub fn arrow_label(&self, arrow: &ArrowSpec) -> String {
        let (from, to) = (self.variables.name(arrow.from), self.variables.name(arrow.to));
        format!("{} {} {}", from, arrow.kind, to)
    }

    /// Parameter column of an arrow as it would be written in arrow notation.
    pub fn parameter_label(&self, arrow: &ArrowSpec) -> String {
        match arrow.parameter {
            ParamRef::Free(id) => self.parameters.name(id).to_string(),
            ParamRef::Fixed(value) => value.to_string(),
        }
    }

    /// Canonical arrow notation for the compiled arrows.
    pub fn render_arrows(&self) -> String {
        let mut out = String::new();
        for arrow in &self.arrows {
            let label = self.arrow_label(arrow);
            let _ = write!(out, "{}, {}, {}", label, arrow.lag, self.parameter_label(arrow));
            if let Some(start) = arrow.start {
                let _ = write!(out, ", {}", start);
            }
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> { serde_json::to_string(self) }

    /// Loads a model written by [`Model::to_json`].
    ///
    /// Lookups and the maximum lag are rebuilt from the stored arrows, and
    /// every variable and parameter reference is checked against its table.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut model: Model = serde_json::from_str(json)?;
        model.variables.rebuild_index();
        model.parameters.rebuild_index();
        model.max_lag = largest_lag(&model.arrows);
        model.validate().map_err(<serde_json::Error as serde::de::Error>::custom)?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), String> {
        if self.variables.lookup_len() != self.variables.len() {
            return Err("duplicate variable names".to_string());
        }
        if self.parameters.lookup_len() != self.parameters.len() {
            return Err("duplicate parameter names".to_string());
        }
        let (n_vars, n_params) = (self.variables.len(), self.parameters.len());
        for (i, arrow) in self.arrows.iter().enumerate() {
            if arrow.from.index() >= n_vars || arrow.to.index() >= n_vars {
                return Err(format!(
                    "arrow {} refers to a variable outside the universe of {}",
                    i, n_vars
                ));
            }
            if let ParamRef::Free(id) = arrow.parameter {
                if id.index() >= n_params {
                    let index = id.index();
                    return Err(format!(
                        "arrow {} refers to parameter {} of {}",
                        i, index, n_params
                    ));
                }
            }
        }
        Ok(())
    }
}

fn largest_lag(arrows: &[ArrowSpec]) -> u32 { arrows.iter().map(|a| a.lag).max().unwrap_or(0) }
