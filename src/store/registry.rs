use super::types::ParamId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub name: String,
    pub start: f64,
    /// False while `start` is still the default for the parameter's first arrow.
    pub explicit_start: bool,
}

/// Outcome of registering a start value for a parameter that already has an
/// explicit one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartConflict {
    pub kept: f64,
    pub ignored: f64,
}

/// Symbol table of free parameters. Position is the index into the flat
/// parameter vector; entries appear in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterTable {
    entries: Vec<ParameterEntry>,

    // Ephemeral lookup (Not serialized, rebuilt on load)
    #[serde(skip)]
    index: HashMap<String, ParamId>,
}

impl ParameterTable {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Distinct names in the lookup; short of `len()` when names repeat.
    pub(crate) fn lookup_len(&self) -> usize { self.index.len() }

    /// Rebuilds the name index after deserialization.
    pub fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), ParamId::new(i)))
            .collect();
    }

    /// Registers `name` (if new) and folds in an optional start value.
    ///
    /// The first explicit start value wins. A later, different explicit value
    /// is reported back as a conflict and otherwise ignored.
    pub fn intern(
        &mut self,
        name: &str,
        start: Option<f64>,
        default_start: f64,
    ) -> (ParamId, Option<StartConflict>) {
        if let Some(&id) = self.index.get(name) {
            let entry = &mut self.entries[id.index()];
            let conflict = match start {
                Some(value) if !entry.explicit_start => {
                    entry.start = value;
                    entry.explicit_start = true;
                    None
                }
                Some(value) if value != entry.start => {
                    Some(StartConflict { kept: entry.start, ignored: value })
                }
                _ => None,
            };
            return (id, conflict);
        }

        let id = ParamId::new(self.entries.len());
        self.entries.push(ParameterEntry {
            name: name.to_string(),
            start: start.unwrap_or(default_start),
            explicit_start: start.is_some(),
        });
        self.index.insert(name.to_string(), id);
        (id, None)
    }

    pub fn get(&self, name: &str) -> Option<ParamId> { self.index.get(name).copied() }

    pub fn entry(&self, id: ParamId) -> &ParameterEntry { &self.entries[id.index()] }

    pub fn name(&self, id: ParamId) -> &str { &self.entries[id.index()].name }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn entries(&self) -> &[ParameterEntry] { &self.entries }

    /// Starting values in parameter-vector order.
    pub fn start_values(&self) -> Vec<f64> { self.entries.iter().map(|e| e.start).collect() }
}

/// Returns `base`, or `base_1`, `base_2`, ... whichever is not yet taken,
/// and records the result as taken.
pub fn unique_name(base: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut counter = 1;
    while taken.contains(&candidate) {
        candidate = format!("{}_{}", base, counter);
        counter += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_appearance_order() {
        let mut table = ParameterTable::new();
        let (b, _) = table.intern("beta", None, 0.0);
        let (a, _) = table.intern("alpha", None, 0.0);
        let (b_again, _) = table.intern("beta", None, 0.0);

        assert_eq!(b, ParamId(0));
        assert_eq!(a, ParamId(1));
        assert_eq!(b_again, b);
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["beta", "alpha"]);
    }

    #[test]
    fn test_first_explicit_start_wins() {
        let mut table = ParameterTable::new();
        table.intern("rho", None, 0.01);
        // First explicit value replaces the default silently.
        let (_, conflict) = table.intern("rho", Some(0.5), 0.01);
        assert!(conflict.is_none());
        // A second, different explicit value is a conflict.
        let (id, conflict) = table.intern("rho", Some(0.9), 0.01);
        assert_eq!(conflict, Some(StartConflict { kept: 0.5, ignored: 0.9 }));
        assert_eq!(table.entry(id).start, 0.5);
        // Repeating the kept value is not a conflict.
        let (_, conflict) = table.intern("rho", Some(0.5), 0.01);
        assert!(conflict.is_none());
    }

    #[test]
    fn test_rebuild_index_after_serde() {
        let mut table = ParameterTable::new();
        table.intern("a", Some(1.0), 0.0);
        table.intern("b", None, 0.0);

        let json = serde_json::to_string(&table).unwrap();
        let mut restored: ParameterTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.get("b"), None);
        restored.rebuild_index();
        assert_eq!(restored.get("b"), Some(ParamId(1)));
        assert_eq!(restored, table);
    }

    #[test]
    fn test_unique_name_appends_counter() {
        let mut taken = HashSet::new();
        assert_eq!(unique_name("y_x", &mut taken), "y_x");
        assert_eq!(unique_name("y_x", &mut taken), "y_x_1");
        assert_eq!(unique_name("y_x", &mut taken), "y_x_2");
    }
}
