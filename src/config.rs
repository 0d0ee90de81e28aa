//! Option structs for each pipeline stage. All are plain data with defaults
//! and round-trip through JSON.
use serde::{Deserialize, Serialize};

pub const DEFAULT_PATH_START: f64 = 0.01;
pub const DEFAULT_COVARIANCE_START: f64 = 1.0;
pub const DEFAULT_VARIANCE_FLOOR: f64 = 0.01;
pub const DEFAULT_SINGULAR_TOLERANCE: f64 = 1e-10;
pub const DEFAULT_STABILITY_MARGIN: f64 = 1e-8;

/// Treatment of lag-0 variances the model text leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefaultVariances {
    /// Leave them to the assembler's fixed variance floor.
    #[default]
    Floor,
    /// Add a free `x <-> x, 0, V[x]` parameter for each of them.
    FreeParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub default_variances: DefaultVariances,
    /// Start value of a free directed path with none given.
    pub path_start: f64,
    /// Start value of a free covariance parameter with none given.
    pub covariance_start: f64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_variances: DefaultVariances::Floor,
            path_start: DEFAULT_PATH_START,
            covariance_start: DEFAULT_COVARIANCE_START,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    /// Value of every lag-0 variance no arrow sets.
    pub variance_floor: f64,
}

impl Default for AssemblyOptions {
    fn default() -> Self { Self { variance_floor: DEFAULT_VARIANCE_FLOOR } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// A block is singular when its smallest singular value is at most this
    /// fraction of its largest.
    pub singular_tolerance: f64,
    /// The companion matrix is stable when its spectral radius is below
    /// `1 - stability_margin`.
    pub stability_margin: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            singular_tolerance: DEFAULT_SINGULAR_TOLERANCE,
            stability_margin: DEFAULT_STABILITY_MARGIN,
        }
    }
}
