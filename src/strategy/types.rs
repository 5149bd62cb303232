use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    Arithmetic,
    Geometric,
}

/// Directional bias of the grid. Long grids accumulate inventory as price
/// falls, short grids as price rises, neutral grids do both around the seed.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    Long,
    Short,
    Neutral,
}

impl std::fmt::Display for GridMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridMode::Long => write!(f, "long"),
            GridMode::Short => write!(f, "short"),
            GridMode::Neutral => write!(f, "neutral"),
        }
    }
}
