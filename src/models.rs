use serde::{Deserialize, Serialize};
use std::fmt;

/// A trigger subscribed to the requested entity and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMatch {
    pub trigger_name: String,
    pub event_label: String,
    pub scope_label: String,
    pub entity_name: String,
    pub file_name: String,
}

/// An action performing the requested operation on the requested entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMatch {
    pub action_name: String,
    pub action_type: String,
    pub operation_id: String,
    pub entity_name: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Trigger,
    Action,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Trigger => "Trigger",
            SourceKind::Action => "Action",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a field reference was found, from most to least precise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    FilterAttribute,   // trigger filteringattributes list
    Condition,         // trigger condition expression text
    DirectParameter,   // action parameter key item/<field>
    ExpressionValue,   // action parameter value text
    InputString,       // shorthand string inputs
    FallbackUnknown,   // anywhere else in the action
}

impl DependencyKind {
    pub fn label(&self) -> &'static str {
        match self {
            DependencyKind::FilterAttribute => "Filter Attribute",
            DependencyKind::Condition => "Condition",
            DependencyKind::DirectParameter => "Direct Parameter",
            DependencyKind::ExpressionValue => "Expression/Value",
            DependencyKind::InputString => "Input String",
            DependencyKind::FallbackUnknown => "Fallback/Unknown",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A trigger or action that references the requested field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDependency {
    pub file_name: String,
    pub source_kind: SourceKind,
    pub source_name: String,
    pub dependency_kind: DependencyKind,
    pub entity_name: String,
    pub field_name: String,
    pub details: String,
}
