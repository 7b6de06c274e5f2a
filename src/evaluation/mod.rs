use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub mod context;

pub use context::{build_context, static_context, EvaluationContext};

// Why the backend returned a given value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReasonKind {
    RuleMatch,
    TargetMatch,
    Fallthrough,
    Off,
    PrerequisiteFailed,
    Error,
    /// Kinds this service does not know about are carried through verbatim.
    Other(String),
}

impl ReasonKind {
    pub fn as_str(&self) -> &str {
        match self {
            ReasonKind::RuleMatch => "RULE_MATCH",
            ReasonKind::TargetMatch => "TARGET_MATCH",
            ReasonKind::Fallthrough => "FALLTHROUGH",
            ReasonKind::Off => "OFF",
            ReasonKind::PrerequisiteFailed => "PREREQUISITE_FAILED",
            ReasonKind::Error => "ERROR",
            ReasonKind::Other(kind) => kind,
        }
    }
}

impl From<String> for ReasonKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "RULE_MATCH" => ReasonKind::RuleMatch,
            "TARGET_MATCH" => ReasonKind::TargetMatch,
            "FALLTHROUGH" => ReasonKind::Fallthrough,
            "OFF" => ReasonKind::Off,
            "PREREQUISITE_FAILED" => ReasonKind::PrerequisiteFailed,
            "ERROR" => ReasonKind::Error,
            _ => ReasonKind::Other(kind),
        }
    }
}

impl From<ReasonKind> for String {
    fn from(kind: ReasonKind) -> Self {
        match kind {
            ReasonKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ReasonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Experiment membership as reported by the backend.
///
/// The wire field is an optional boolean; a missing field and an explicit
/// `false` are kept apart so callers never have to guess from truthiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum ExperimentMembership {
    #[default]
    Absent,
    NotIn,
    In,
}

impl ExperimentMembership {
    pub fn is_in(&self) -> bool {
        matches!(self, ExperimentMembership::In)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ExperimentMembership::Absent)
    }
}

impl From<Option<bool>> for ExperimentMembership {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => ExperimentMembership::Absent,
            Some(false) => ExperimentMembership::NotIn,
            Some(true) => ExperimentMembership::In,
        }
    }
}

impl From<ExperimentMembership> for Option<bool> {
    fn from(value: ExperimentMembership) -> Self {
        match value {
            ExperimentMembership::Absent => None,
            ExperimentMembership::NotIn => Some(false),
            ExperimentMembership::In => Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReason {
    pub kind: ReasonKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "ExperimentMembership::is_absent")]
    pub in_experiment: ExperimentMembership,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl EvaluationReason {
    #[cfg(test)]
    pub fn new(kind: ReasonKind) -> Self {
        Self {
            kind,
            rule_index: None,
            rule_id: None,
            in_experiment: ExperimentMembership::Absent,
            error_kind: None,
        }
    }

    /// True when the flag was specifically targeted at the context, as opposed
    /// to serving its fallthrough or off variation.
    pub fn targets_context(&self) -> bool {
        matches!(self.kind, ReasonKind::RuleMatch | ReasonKind::TargetMatch)
    }
}

/// Human readable reason, e.g. `RULE_MATCH (rule 2)`.
impl fmt::Display for EvaluationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule_index {
            Some(index) => write!(f, "{} (rule {})", self.kind, index),
            None => write!(f, "{}", self.kind),
        }
    }
}

// Value and reason for one flag
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlagState {
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<EvaluationReason>,
}

impl FlagState {
    pub fn is_relevant(&self) -> bool {
        self.reason
            .as_ref()
            .map(EvaluationReason::targets_context)
            .unwrap_or(false)
    }

    pub fn in_experiment(&self) -> bool {
        self.reason
            .as_ref()
            .map(|reason| reason.in_experiment.is_in())
            .unwrap_or(false)
    }
}

/// Snapshot of every flag evaluated for one context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlagsState {
    #[serde(default)]
    pub flags: BTreeMap<String, FlagState>,
}

impl FlagsState {
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FlagState)> {
        self.flags.iter()
    }

    /// Keys of flags whose reason says they targeted the context.
    pub fn relevant_keys(&self) -> Vec<&str> {
        self.flags
            .iter()
            .filter(|(_, state)| state.is_relevant())
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

impl FromIterator<(String, FlagState)> for FlagsState {
    fn from_iter<I: IntoIterator<Item = (String, FlagState)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}
