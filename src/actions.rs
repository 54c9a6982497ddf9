// Finds actions that perform a CRUD operation on an entity, at any nesting depth
use crate::analysis::DefinitionAnalyzer;
use crate::document::{action_type, walk_actions, ActionInputs, WorkflowDocument};
use crate::error::{require_non_blank, AnalysisError};
use crate::models::ActionMatch;
use crate::naming::{eq_ignore_case, EntityName};
use crate::translate::{known_verbs, operation_ids};
use serde_json::Value;
use tracing::debug;

/// Dataverse connector actions are the only ones that carry an entity.
const CONNECTOR_ACTION_TYPE: &str = "OpenApiConnection";

pub struct ActionOperationAnalyzer {
    entity: EntityName,
    verb: String,
    operation_ids: Option<&'static [&'static str]>,
}

impl ActionOperationAnalyzer {
    pub fn new(entity: &str, verb: &str) -> Result<Self, AnalysisError> {
        require_non_blank(entity, "Entity name")?;
        require_non_blank(verb, "Target action name")?;

        Ok(Self {
            entity: EntityName::new(entity),
            verb: verb.trim().to_string(),
            operation_ids: operation_ids(verb),
        })
    }

    /// The match for a single action node, ignoring anything nested in it.
    fn match_action(&self, name: &str, action: &Value, file_name: &str) -> Option<ActionMatch> {
        let operation_ids = self.operation_ids?;

        if action.get("type").and_then(Value::as_str) != Some(CONNECTOR_ACTION_TYPE) {
            return None;
        }

        let inputs = ActionInputs::of(action);
        let operation_id = inputs.operation_id()?;
        if !operation_ids.iter().any(|id| eq_ignore_case(id, operation_id)) {
            return None;
        }
        if !self.entity.matches(inputs.entity_name()?) {
            return None;
        }

        Some(ActionMatch {
            action_name: name.to_string(),
            action_type: action_type(action).to_string(),
            operation_id: operation_id.to_string(),
            entity_name: self.entity.singular().to_string(),
            file_name: file_name.to_string(),
        })
    }
}

impl DefinitionAnalyzer for ActionOperationAnalyzer {
    type Match = ActionMatch;

    fn describe(&self) -> String {
        format!("actions performing {} on '{}'", self.verb, self.entity.singular())
    }

    fn vocabulary_warning(&self) -> Option<String> {
        self.operation_ids.is_none().then(|| {
            format!(
                "Action name '{}' not recognized or has no mapped operations. Allowed keys are: {}",
                self.verb,
                known_verbs().join(", ")
            )
        })
    }

    fn analyze_document(&self, document: &WorkflowDocument, file_name: &str) -> Vec<ActionMatch> {
        let Some(actions) = document.actions() else {
            return Vec::new();
        };

        let mut matches = Vec::new();
        walk_actions(actions, &mut |name, action| {
            if let Some(found) = self.match_action(name, action, file_name) {
                debug!("{}: action '{}' runs {}", file_name, name, found.operation_id);
                matches.push(found);
            }
        });
        matches
    }
}
