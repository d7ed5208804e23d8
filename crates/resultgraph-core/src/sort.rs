//! Sort comparators for result tables.
//!
//! Every column sorts ascending or descending; missing values (no name, no
//! score) always go last, whichever the direction.

use crate::error::EngineError;
use crate::model::{ResultRecord, ResultScore};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Sort Keys
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Name,
    Evidence,
    Paths,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Column plus direction, parsed from UI keys such as `scoreHighLow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortKey {
    pub const fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::new(SortColumn::Score, SortDirection::Desc)
    }
}

impl FromStr for SortKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, rest) = if let Some(rest) = s.strip_prefix("name") {
            (SortColumn::Name, rest)
        } else if let Some(rest) = s.strip_prefix("evidence") {
            (SortColumn::Evidence, rest)
        } else if let Some(rest) = s.strip_prefix("paths") {
            (SortColumn::Paths, rest)
        } else if let Some(rest) = s.strip_prefix("score") {
            (SortColumn::Score, rest)
        } else {
            return Err(EngineError::UnknownSortKey(s.to_string()));
        };
        let direction = match rest {
            "LowHigh" => SortDirection::Asc,
            "HighLow" => SortDirection::Desc,
            _ => return Err(EngineError::UnknownSortKey(s.to_string())),
        };
        Ok(Self::new(column, direction))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = match self.column {
            SortColumn::Name => "name",
            SortColumn::Evidence => "evidence",
            SortColumn::Paths => "paths",
            SortColumn::Score => "score",
        };
        let direction = match self.direction {
            SortDirection::Asc => "LowHigh",
            SortDirection::Desc => "HighLow",
        };
        write!(f, "{column}{direction}")
    }
}

impl TryFrom<String> for SortKey {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}

/// Pathfinder results carry plain numeric scores and slash-delimited names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Standard,
    Pathfinder,
}

// ============================================================================
// Comparators
// ============================================================================

fn missing_last<T>(a: Option<T>, b: Option<T>) -> Result<(T, T), Ordering> {
    match (a, b) {
        (Some(a), Some(b)) => Ok((a, b)),
        (Some(_), None) => Err(Ordering::Less),
        (None, Some(_)) => Err(Ordering::Greater),
        (None, None) => Err(Ordering::Equal),
    }
}

/// Case-insensitive string comparison; `None` and empty strings sort last in
/// both directions.
pub fn compare_with_fallback(a: Option<&str>, b: Option<&str>, direction: SortDirection) -> Ordering {
    let a = a.filter(|s| !s.is_empty());
    let b = b.filter(|s| !s.is_empty());
    match missing_last(a, b) {
        Ok((a, b)) => direction.apply(
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
        ),
        Err(ordering) => ordering,
    }
}

/// Numeric counterpart of [`compare_with_fallback`]; NaN counts as missing.
pub fn compare_numbers_with_fallback(a: Option<f64>, b: Option<f64>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_nan());
    let b = b.filter(|v| !v.is_nan());
    match missing_last(a, b) {
        Ok((a, b)) => direction.apply(a.total_cmp(&b)),
        Err(ordering) => ordering,
    }
}

/// Pathfinder names: fewer `/` segments first, then lexical.
pub fn compare_pathfinder_names(a: Option<&str>, b: Option<&str>, direction: SortDirection) -> Ordering {
    let a = a.filter(|s| !s.is_empty());
    let b = b.filter(|s| !s.is_empty());
    match missing_last(a, b) {
        Ok((a, b)) => {
            let segments = |s: &str| s.split('/').count();
            direction
                .apply(segments(a).cmp(&segments(b)))
                .then_with(|| compare_with_fallback(Some(a), Some(b), direction))
        }
        Err(ordering) => ordering,
    }
}

fn compare_scores(
    a: Option<ResultScore>,
    b: Option<ResultScore>,
    direction: SortDirection,
    mode: SortMode,
) -> Ordering {
    match missing_last(a, b) {
        Ok((a, b)) => {
            let (a_main, a_secondary) = a.sort_key();
            let (b_main, b_secondary) = b.sort_key();
            let primary = direction.apply(a_main.total_cmp(&b_main));
            match mode {
                SortMode::Pathfinder => primary,
                SortMode::Standard => {
                    primary.then_with(|| direction.apply(a_secondary.total_cmp(&b_secondary)))
                }
            }
        }
        Err(ordering) => ordering,
    }
}

// ============================================================================
// Sorting
// ============================================================================

/// Columns a result row exposes to the comparators.
pub trait Sortable {
    fn sort_name(&self) -> Option<&str>;
    fn sort_evidence(&self) -> usize;
    fn sort_paths(&self) -> usize;
    fn sort_score(&self) -> Option<ResultScore>;
}

impl Sortable for ResultRecord {
    fn sort_name(&self) -> Option<&str> {
        Some(self.drug_name.as_str())
    }

    fn sort_evidence(&self) -> usize {
        self.evidence_count
    }

    fn sort_paths(&self) -> usize {
        self.path_count
    }

    fn sort_score(&self) -> Option<ResultScore> {
        self.score
    }
}

pub fn compare<T: Sortable>(a: &T, b: &T, key: SortKey, mode: SortMode) -> Ordering {
    let direction = key.direction;
    match key.column {
        SortColumn::Name => match mode {
            SortMode::Standard => compare_with_fallback(a.sort_name(), b.sort_name(), direction),
            SortMode::Pathfinder => compare_pathfinder_names(a.sort_name(), b.sort_name(), direction),
        },
        SortColumn::Evidence => direction.apply(a.sort_evidence().cmp(&b.sort_evidence())),
        SortColumn::Paths => direction.apply(a.sort_paths().cmp(&b.sort_paths())),
        SortColumn::Score => compare_scores(a.sort_score(), b.sort_score(), direction, mode),
    }
}

/// Stable sort of `items` by `key`.
pub fn sort_results<T: Sortable>(items: &mut [T], key: SortKey, mode: SortMode) {
    items.sort_by(|a, b| compare(a, b, key, mode));
}

/// Pathfinder mode when every scored item carries a plain number.
pub fn detect_mode<'a, T: Sortable + 'a>(items: impl IntoIterator<Item = &'a T>) -> SortMode {
    let mut any_scored = false;
    for item in items {
        match item.sort_score() {
            Some(ResultScore::Plain(_)) => any_scored = true,
            Some(ResultScore::Weighted(_)) => return SortMode::Standard,
            None => {}
        }
    }
    if any_scored {
        SortMode::Pathfinder
    } else {
        SortMode::Standard
    }
}
