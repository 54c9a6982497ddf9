//! Column dependency analysis.
//!
//! Finds every trigger and action in a flow that depends on one field of an
//! entity. Structural signals (trigger filtering attributes, `item/<field>`
//! parameters) are precise; everything else is found by scanning expression
//! text with [`FieldReferenceMatcher`] and is reported as such, so callers can
//! tell a certain dependency from one that needs a manual check.

use crate::analysis::DefinitionAnalyzer;
use crate::document::{
    action_type, render_without_scopes, walk_actions, ActionInputs, NodeMap, TriggerSubscription,
    WorkflowDocument,
};
use crate::error::{require_non_blank, AnalysisError};
use crate::matcher::FieldReferenceMatcher;
use crate::models::{DependencyKind, FieldDependency, SourceKind};
use crate::naming::{eq_ignore_case, EntityName, UNKNOWN_ENTITY};
use crate::translate::{translate_message, translate_scope, translated_metadata};
use serde_json::Value;
use tracing::debug;

/// Parameter key prefix Dataverse actions use for row columns.
const FIELD_PARAMETER_PREFIX: &str = "item/";

/// Which parts of a flow to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisScope {
    #[default]
    All,
    ActionsOnly,
    TriggersOnly,
}

impl AnalysisScope {
    /// From the `--actions-only` / `--triggers-only` flag pair.
    pub fn from_flags(actions_only: bool, triggers_only: bool) -> Result<Self, AnalysisError> {
        match (actions_only, triggers_only) {
            (true, true) => Err(AnalysisError::ConflictingScope),
            (true, false) => Ok(AnalysisScope::ActionsOnly),
            (false, true) => Ok(AnalysisScope::TriggersOnly),
            (false, false) => Ok(AnalysisScope::All),
        }
    }

    pub fn includes_triggers(&self) -> bool {
        !matches!(self, AnalysisScope::ActionsOnly)
    }

    pub fn includes_actions(&self) -> bool {
        !matches!(self, AnalysisScope::TriggersOnly)
    }
}

pub struct FieldDependencyAnalyzer {
    entity: EntityName,
    matcher: FieldReferenceMatcher,
    action_type_filter: Option<String>,
    scope: AnalysisScope,
}

impl FieldDependencyAnalyzer {
    pub fn new(entity: &str, field: &str) -> Result<Self, AnalysisError> {
        require_non_blank(entity, "Entity name")?;
        require_non_blank(field, "Field name")?;

        Ok(Self {
            entity: EntityName::new(entity),
            matcher: FieldReferenceMatcher::new(field)?,
            action_type_filter: None,
            scope: AnalysisScope::All,
        })
    }

    /// Only evaluate actions of this `type` (nested actions are still visited).
    pub fn with_action_type(mut self, action_type: Option<String>) -> Self {
        self.action_type_filter = action_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn with_scope(mut self, scope: AnalysisScope) -> Self {
        self.scope = scope;
        self
    }

    fn field(&self) -> &str {
        self.matcher.field()
    }

    fn dependency(
        &self,
        file_name: &str,
        source_kind: SourceKind,
        source_name: &str,
        dependency_kind: DependencyKind,
        entity_name: &str,
        details: String,
    ) -> FieldDependency {
        FieldDependency {
            file_name: file_name.to_string(),
            source_kind,
            source_name: source_name.to_string(),
            dependency_kind,
            entity_name: entity_name.to_string(),
            field_name: self.field().to_string(),
            details,
        }
    }

    fn check_trigger(&self, name: &str, trigger: &Value, file_name: &str, out: &mut Vec<FieldDependency>) {
        let Some(subscription) = TriggerSubscription::of(trigger) else {
            return;
        };
        if !subscription.entity_name.is_some_and(|entity| self.entity.matches(entity)) {
            return;
        }

        if let Some(attributes) = subscription.filtering_attributes {
            if self.matcher.in_attribute_list(attributes) {
                let message = translated_metadata(
                    subscription.parameters,
                    "subscriptionRequest/message",
                    translate_message,
                );
                let scope = translated_metadata(
                    subscription.parameters,
                    "subscriptionRequest/scope",
                    translate_scope,
                );
                out.push(self.dependency(
                    file_name,
                    SourceKind::Trigger,
                    name,
                    DependencyKind::FilterAttribute,
                    self.entity.singular(),
                    format!("Message: {}, Scope: {}", message, scope),
                ));
            }
        }

        let Some(conditions) = trigger.get("conditions") else {
            return;
        };
        if !self.matcher.is_match(&conditions.to_string()) {
            return;
        }
        if recorded(out, SourceKind::Trigger, name, Some(&[DependencyKind::FilterAttribute])) {
            return;
        }
        out.push(self.dependency(
            file_name,
            SourceKind::Trigger,
            name,
            DependencyKind::Condition,
            self.entity.singular(),
            "Field referenced in condition logic (manual check recommended)".to_string(),
        ));
    }

    fn check_action(&self, name: &str, action: &Value, file_name: &str, out: &mut Vec<FieldDependency>) {
        let kind = action_type(action);
        if let Some(filter) = &self.action_type_filter {
            if !eq_ignore_case(kind, filter) {
                return;
            }
        }

        let inputs = ActionInputs::of(action);
        match (inputs, inputs.parameters()) {
            (_, Some(parameters)) => self.check_parameters(name, kind, parameters, file_name, out),
            (ActionInputs::Text(text), None) => {
                if self.matcher.is_match(text) {
                    out.push(self.dependency(
                        file_name,
                        SourceKind::Action,
                        name,
                        DependencyKind::InputString,
                        UNKNOWN_ENTITY,
                        format!("Type: {}, Field referenced in input content/expression", kind),
                    ));
                }
            }
            (ActionInputs::Structured(_) | ActionInputs::Absent, None) => {
                if !self.matcher.is_match(&render_without_scopes(action)) {
                    return;
                }
                if recorded(out, SourceKind::Action, name, None) {
                    return;
                }
                out.push(self.dependency(
                    file_name,
                    SourceKind::Action,
                    name,
                    DependencyKind::FallbackUnknown,
                    UNKNOWN_ENTITY,
                    format!("Type: {}, Field reference found in action structure/expression", kind),
                ));
            }
        }
    }

    fn check_parameters(
        &self,
        name: &str,
        kind: &str,
        parameters: &NodeMap,
        file_name: &str,
        out: &mut Vec<FieldDependency>,
    ) {
        let known_entity = parameters
            .get("entityName")
            .and_then(Value::as_str)
            .filter(|entity| self.entity.matches(entity))
            .map(|_| self.entity.singular());

        for key in parameters.keys() {
            let Some(column) = strip_field_prefix(key) else {
                continue;
            };
            if eq_ignore_case(column, self.field()) {
                out.push(self.dependency(
                    file_name,
                    SourceKind::Action,
                    name,
                    DependencyKind::DirectParameter,
                    known_entity.unwrap_or(UNKNOWN_ENTITY),
                    format!("Type: {}", kind),
                ));
            }
        }

        // Direct parameters are collected first so an expression hit never
        // shadows them, whatever the parameter order.
        if recorded(out, SourceKind::Action, name, Some(&[DependencyKind::DirectParameter])) {
            return;
        }

        for (key, value) in parameters {
            let Some(text) = value.as_str() else {
                continue;
            };
            if !self.matcher.is_match(text) {
                continue;
            }
            let entity = known_entity.unwrap_or_else(|| self.entity.infer_from_parameter(key));
            out.push(self.dependency(
                file_name,
                SourceKind::Action,
                name,
                DependencyKind::ExpressionValue,
                entity,
                format!("Type: {}, Parameter: '{}'", kind, key),
            ));
        }
    }
}

/// `item/<column>` -> `<column>`, prefix matched case-insensitively.
fn strip_field_prefix(key: &str) -> Option<&str> {
    let prefix = key.get(..FIELD_PARAMETER_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(FIELD_PARAMETER_PREFIX)
        .then(|| &key[FIELD_PARAMETER_PREFIX.len()..])
}

/// Whether `source` already has a dependency recorded, optionally of one of `kinds`.
fn recorded(
    out: &[FieldDependency],
    source_kind: SourceKind,
    source_name: &str,
    kinds: Option<&[DependencyKind]>,
) -> bool {
    out.iter().any(|d| {
        d.source_kind == source_kind
            && d.source_name == source_name
            && kinds.map_or(true, |kinds| kinds.contains(&d.dependency_kind))
    })
}

impl DefinitionAnalyzer for FieldDependencyAnalyzer {
    type Match = FieldDependency;

    fn describe(&self) -> String {
        format!("dependencies on '{}.{}'", self.entity.singular(), self.field())
    }

    fn analyze_document(&self, document: &WorkflowDocument, file_name: &str) -> Vec<FieldDependency> {
        let mut out = Vec::new();

        if self.scope.includes_triggers() {
            if let Some(triggers) = document.triggers() {
                for (name, trigger) in triggers {
                    self.check_trigger(name, trigger, file_name, &mut out);
                }
            }
        }

        if self.scope.includes_actions() {
            if let Some(actions) = document.actions() {
                walk_actions(actions, &mut |name, action| {
                    self.check_action(name, action, file_name, &mut out);
                });
            }
        }

        if !out.is_empty() {
            debug!("{}: {} references to '{}'", file_name, out.len(), self.field());
        }
        out
    }
}
