use crate::syntax::SpecError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Row/column index of a variable in every model matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl VarId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

/// Position of a free parameter in the flat parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ParamId(pub u32);

impl ParamId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

/// The ordered variable universe. Order defines matrix indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variables {
    names: Vec<String>,

    // Rebuilt after deserialization
    #[serde(skip)]
    index: HashMap<String, VarId>,
}

impl Variables {
    pub fn new<I, S>(names: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vars = Self::default();
        for name in names {
            let name = name.into();
            if vars.index.contains_key(&name) {
                return Err(SpecError::DuplicateVariable { name });
            }
            vars.index.insert(name.clone(), VarId::new(vars.names.len()));
            vars.names.push(name);
        }
        Ok(vars)
    }

    pub fn len(&self) -> usize { self.names.len() }
    pub fn is_empty(&self) -> bool { self.names.is_empty() }

    pub fn get(&self, name: &str) -> Option<VarId> { self.index.get(name).copied() }

    pub fn name(&self, id: VarId) -> &str { &self.names[id.index()] }

    pub fn names(&self) -> &[String] { &self.names }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (VarId::new(i), n.as_str()))
    }

    /// Distinct names in the lookup; short of `len()` when names repeat.
    pub(crate) fn lookup_len(&self) -> usize { self.index.len() }

    /// Rebuilds the name index after deserialization.
    pub fn rebuild_index(&mut self) {
        self.index = self
            .names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), VarId::new(i)))
            .collect();
    }
}

/// Directed path or two-headed covariance arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrowKind {
    Directed,
    Covariance,
}

impl ArrowKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArrowKind::Directed => "->",
            ArrowKind::Covariance => "<->",
        }
    }
}

impl fmt::Display for ArrowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.symbol()) }
}

/// How an arrow obtains its coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamRef {
    /// Estimated; shared by every arrow with the same name.
    Free(ParamId),
    /// Held at a literal value; never part of the parameter vector.
    Fixed(f64),
}

impl ParamRef {
    /// Resolves the coefficient against a parameter vector whose length
    /// has already been checked.
    #[inline(always)]
    pub fn resolve(&self, params: &[f64]) -> f64 {
        match self {
            ParamRef::Free(id) => params[id.index()],
            ParamRef::Fixed(value) => *value,
        }
    }
}

/// One compiled arrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowSpec {
    pub kind: ArrowKind,
    pub from: VarId,
    pub to: VarId,
    pub lag: u32,
    pub parameter: ParamRef,
    /// Start value written on this arrow's own line, if any.
    pub start: Option<f64>,
    /// 1-based source line; 0 for arrows generated by the compiler.
    pub line: usize,
}

impl ArrowSpec {
    pub fn is_free(&self) -> bool { matches!(self.parameter, ParamRef::Free(_)) }

    pub fn key(&self) -> ArrowKey { arrow_key(self.kind, self.from, self.to, self.lag) }
}

pub type ArrowKey = (ArrowKind, VarId, VarId, u32);

/// Identity used for duplicate detection. Covariance arrows are keyed by
/// the unordered pair.
pub fn arrow_key(kind: ArrowKind, from: VarId, to: VarId, lag: u32) -> ArrowKey {
    match kind {
        ArrowKind::Directed => (kind, from, to, lag),
        ArrowKind::Covariance => {
            let (a, b) = if from <= to { (from, to) } else { (to, from) };
            (kind, a, b, lag)
        }
    }
}
