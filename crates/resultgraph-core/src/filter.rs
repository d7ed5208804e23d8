//! Filters and filter families.
//!
//! A filter id is a tag id (`role:CHEBI_ROLE_drug`, `ara:infores:aragorn`,
//! `ev:clinical-trials`, ...). The prefix before the first `:` picks the
//! [`FilterFamily`], which decides where the filter applies:
//!
//! - evidence families match edge tags during path ranking,
//! - result-level families match the result itself (name text, user saves),
//! - every other family matches path tags.

use crate::model::{Edge, ResultId, TagMap};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterFamily {
    Role,
    Ara,
    FdaApproval,
    ChemicalCategory,
    Indication,
    OverTheCounter,
    TargetDevelopmentLevel,
    PathType,
    Evidence,
    KnowledgeLevel,
    Text,
    UserSave,
    Other(String),
}

impl FilterFamily {
    /// Grouping key (the id prefix without the colon).
    pub fn key(&self) -> &str {
        match self {
            FilterFamily::Role => "role",
            FilterFamily::Ara => "ara",
            FilterFamily::FdaApproval => "fda",
            FilterFamily::ChemicalCategory => "cc",
            FilterFamily::Indication => "di",
            FilterFamily::OverTheCounter => "otc",
            FilterFamily::TargetDevelopmentLevel => "tdl",
            FilterFamily::PathType => "pt",
            FilterFamily::Evidence => "ev",
            FilterFamily::KnowledgeLevel => "kl",
            FilterFamily::Text => "str",
            FilterFamily::UserSave => "sv",
            FilterFamily::Other(prefix) => prefix,
        }
    }

    /// Families that describe evidence; they are matched against edges.
    pub fn is_evidence(&self) -> bool {
        matches!(self, FilterFamily::Evidence | FilterFamily::KnowledgeLevel)
    }

    /// Families evaluated on the result rather than on its paths.
    pub fn is_result_level(&self) -> bool {
        matches!(self, FilterFamily::Text | FilterFamily::UserSave)
    }
}

/// Family of a tag id, derived from its prefix.
pub fn family(tag_id: &str) -> FilterFamily {
    let prefix = tag_id.split_once(':').map(|(p, _)| p).unwrap_or("");
    match prefix {
        "role" => FilterFamily::Role,
        "ara" => FilterFamily::Ara,
        "fda" => FilterFamily::FdaApproval,
        "cc" => FilterFamily::ChemicalCategory,
        "di" => FilterFamily::Indication,
        "otc" => FilterFamily::OverTheCounter,
        "tdl" => FilterFamily::TargetDevelopmentLevel,
        "pt" => FilterFamily::PathType,
        "ev" => FilterFamily::Evidence,
        "kl" => FilterFamily::KnowledgeLevel,
        "str" => FilterFamily::Text,
        "sv" => FilterFamily::UserSave,
        other => FilterFamily::Other(other.to_string()),
    }
}

// ============================================================================
// Filter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub id: String,
    /// Display label.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub negated: bool,
    /// Explicit OR-group; defaults to the id's family key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(
        default,
        rename = "excludeWeight",
        skip_serializing_if = "Option::is_none"
    )]
    pub exclude_weight: Option<f64>,
}

impl Filter {
    pub fn include(id: &str) -> Self {
        Self {
            id: id.to_string(),
            value: id.to_string(),
            negated: false,
            family: None,
            exclude_weight: None,
        }
    }

    pub fn exclude(id: &str) -> Self {
        Self {
            negated: true,
            ..Self::include(id)
        }
    }

    pub fn with_family(mut self, family: &str) -> Self {
        self.family = Some(family.to_string());
        self
    }

    pub fn with_exclude_weight(mut self, weight: f64) -> Self {
        self.exclude_weight = Some(weight);
        self
    }

    pub fn family(&self) -> FilterFamily {
        family(&self.id)
    }

    /// Key used to OR filters together during inclusion scoring.
    pub fn group_key(&self) -> String {
        match &self.family {
            Some(explicit) => explicit.clone(),
            None => self.family().key().to_string(),
        }
    }

    /// The part of the id after the family prefix.
    pub fn suffix(&self) -> &str {
        self.id.split_once(':').map(|(_, s)| s).unwrap_or(&self.id)
    }

    pub fn matches_tags(&self, tags: &TagMap) -> bool {
        tags.contains_key(&self.id)
    }

    /// Evidence match: an edge tag, or for knowledge-level filters the edge's
    /// own `knowledge_level`.
    pub fn matches_edge(&self, edge: &Edge) -> bool {
        if self.matches_tags(&edge.tags) {
            return true;
        }
        self.family() == FilterFamily::KnowledgeLevel
            && edge
                .knowledge_level
                .as_deref()
                .is_some_and(|level| level.eq_ignore_ascii_case(self.suffix()))
    }

    /// Case-insensitive substring match of a text filter against a name.
    pub fn matches_text(&self, name: &str) -> bool {
        let needle = if self.suffix().is_empty() {
            self.value.as_str()
        } else {
            self.suffix()
        };
        name.to_lowercase().contains(&needle.to_lowercase())
    }
}

// ============================================================================
// User saves
// ============================================================================

/// Bookmark / note markers the user attached to results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSaves {
    #[serde(default)]
    pub bookmarked: AHashSet<ResultId>,
    #[serde(default)]
    pub annotated: AHashSet<ResultId>,
}

impl UserSaves {
    pub fn bookmark(mut self, result_id: &str) -> Self {
        self.bookmarked.insert(result_id.to_string());
        self
    }

    pub fn annotate(mut self, result_id: &str) -> Self {
        self.annotated.insert(result_id.to_string());
        self
    }

    pub fn is_bookmarked(&self, result_id: &str) -> bool {
        self.bookmarked.contains(result_id)
    }

    pub fn is_annotated(&self, result_id: &str) -> bool {
        self.annotated.contains(result_id)
    }

    /// `sv:bookmarked` and `sv:notes`; unknown save kinds never match.
    pub fn matches(&self, filter: &Filter, result_id: &str) -> bool {
        match filter.suffix() {
            "bookmarked" => self.is_bookmarked(result_id),
            "notes" => self.is_annotated(result_id),
            other => {
                tracing::debug!(save = %other, "unknown user-save filter");
                false
            }
        }
    }
}

// ============================================================================
// Partitioning
// ============================================================================

/// Active filters split by where they apply.
#[derive(Debug, Clone, Default)]
pub struct PartitionedFilters<'a> {
    pub evidence: Vec<&'a Filter>,
    pub other: Vec<&'a Filter>,
    pub result_level: Vec<&'a Filter>,
}

impl<'a> PartitionedFilters<'a> {
    pub fn new(filters: &'a [Filter]) -> Self {
        let mut out = Self::default();
        for filter in filters {
            let family = filter.family();
            if family.is_result_level() {
                out.result_level.push(filter);
            } else if family.is_evidence() {
                out.evidence.push(filter);
            } else {
                out.other.push(filter);
            }
        }
        out
    }

    /// Any filter that ranks paths rather than whole results.
    pub fn has_path_level(&self) -> bool {
        !self.evidence.is_empty() || !self.other.is_empty()
    }

    /// At least one non-negated evidence filter is active.
    pub fn has_positive_evidence(&self) -> bool {
        self.evidence.iter().any(|f| !f.negated)
    }

    /// Non-negated path-tag filters grouped by OR-group key.
    pub fn positive_other_groups(&self) -> BTreeMap<String, Vec<&'a Filter>> {
        let mut groups: BTreeMap<String, Vec<&'a Filter>> = BTreeMap::new();
        for filter in self.other.iter().filter(|f| !f.negated) {
            groups.entry(filter.group_key()).or_default().push(filter);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Edge;

    #[test]
    fn family_follows_prefix() {
        assert_eq!(family("role:CHEBI_ROLE_drug"), FilterFamily::Role);
        assert_eq!(family("ara:infores:aragorn"), FilterFamily::Ara);
        assert_eq!(family("ev:clinical-trials"), FilterFamily::Evidence);
        assert_eq!(family("str:aspirin"), FilterFamily::Text);
        assert_eq!(family("zz:thing"), FilterFamily::Other("zz".into()));
        assert_eq!(family("bare"), FilterFamily::Other(String::new()));
    }

    #[test]
    fn partition_splits_by_scope() {
        let filters = vec![
            Filter::include("ev:pubs"),
            Filter::exclude("fda:approved"),
            Filter::include("str:asp"),
            Filter::include("kl:knowledge_assertion"),
        ];
        let parts = PartitionedFilters::new(&filters);
        assert_eq!(parts.evidence.len(), 2);
        assert_eq!(parts.other.len(), 1);
        assert_eq!(parts.result_level.len(), 1);
        assert!(parts.has_positive_evidence());
    }

    #[test]
    fn explicit_family_overrides_group_key() {
        let a = Filter::include("role:a").with_family("roles-and-cats");
        let b = Filter::include("cc:b").with_family("roles-and-cats");
        let filters = vec![a, b, Filter::include("ara:x")];
        let groups = PartitionedFilters::new(&filters).positive_other_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["roles-and-cats"].len(), 2);
    }

    #[test]
    fn knowledge_level_matches_edge_field() {
        let mut edge = Edge::new("e1", "n1", "treats", "n2");
        edge.knowledge_level = Some("knowledge_assertion".into());
        assert!(Filter::include("kl:knowledge_assertion").matches_edge(&edge));
        assert!(!Filter::include("kl:prediction").matches_edge(&edge));
    }

    #[test]
    fn text_match_is_case_insensitive() {
        let filter = Filter::include("str:ASPI");
        assert!(filter.matches_text("Aspirin"));
        assert!(!filter.matches_text("Ibuprofen"));
    }
}
