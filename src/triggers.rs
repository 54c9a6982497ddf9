// Finds flows triggered by a given entity message (Create, Update, ...)
use crate::analysis::DefinitionAnalyzer;
use crate::document::{TriggerSubscription, WorkflowDocument};
use crate::error::{require_non_blank, AnalysisError};
use crate::models::TriggerMatch;
use crate::naming::EntityName;
use crate::translate::{matching_message_codes, translate_message, translate_scope, translated_metadata};
use tracing::debug;

pub struct TriggerEventAnalyzer {
    entity: EntityName,
    event: String,
    message_codes: Vec<i64>,
}

impl TriggerEventAnalyzer {
    pub fn new(entity: &str, event: &str) -> Result<Self, AnalysisError> {
        require_non_blank(entity, "Entity name")?;
        require_non_blank(event, "Event name")?;

        Ok(Self {
            entity: EntityName::new(entity),
            event: event.trim().to_string(),
            message_codes: matching_message_codes(event),
        })
    }
}

impl DefinitionAnalyzer for TriggerEventAnalyzer {
    type Match = TriggerMatch;

    fn describe(&self) -> String {
        format!("triggers firing on {} of '{}'", self.event, self.entity.singular())
    }

    fn vocabulary_warning(&self) -> Option<String> {
        self.message_codes.is_empty().then(|| {
            format!(
                "Event name '{}' not recognized or no related events found.",
                self.event
            )
        })
    }

    fn analyze_document(&self, document: &WorkflowDocument, file_name: &str) -> Vec<TriggerMatch> {
        let Some(triggers) = document.triggers() else {
            return Vec::new();
        };

        let mut matches = Vec::new();
        for (trigger_name, trigger) in triggers {
            let Some(subscription) = TriggerSubscription::of(trigger) else {
                continue;
            };
            if !subscription.entity_name.is_some_and(|name| self.entity.matches(name)) {
                continue;
            }
            let Some(message) = subscription.message else {
                continue;
            };
            if !self.message_codes.contains(&message) {
                continue;
            }

            debug!("{}: trigger '{}' matches message {}", file_name, trigger_name, message);
            matches.push(TriggerMatch {
                trigger_name: trigger_name.clone(),
                event_label: translate_message(message),
                scope_label: translated_metadata(
                    subscription.parameters,
                    "subscriptionRequest/scope",
                    translate_scope,
                ),
                entity_name: self.entity.singular().to_string(),
                file_name: file_name.to_string(),
            });
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn trigger(entity: &str, message: Value, scope: Option<i64>) -> Value {
        let mut parameters = json!({
            "subscriptionRequest/entityname": entity,
            "subscriptionRequest/message": message,
        });
        if let Some(scope) = scope {
            parameters["subscriptionRequest/scope"] = json!(scope);
        }
        json!({
            "type": "OpenApiConnectionWebhook",
            "inputs": { "host": { "operationId": "SubscribeWebhookTrigger" }, "parameters": parameters }
        })
    }

    fn flow(triggers: Value) -> WorkflowDocument {
        WorkflowDocument::from_value(json!({
            "properties": { "definition": { "triggers": triggers, "actions": {} } }
        }))
    }

    #[test]
    fn test_update_trigger_on_plural_entity() {
        let doc = flow(json!({ "When_a_contact_changes": trigger("contacts", json!(3), Some(4)) }));
        let analyzer = TriggerEventAnalyzer::new("contact", "Update").unwrap();
        let matches = analyzer.analyze_document(&doc, "ContactSync.json");

        assert_eq!(
            matches,
            vec![TriggerMatch {
                trigger_name: "When_a_contact_changes".to_string(),
                event_label: "Update".to_string(),
                scope_label: "Organization".to_string(),
                entity_name: "contact".to_string(),
                file_name: "ContactSync.json".to_string(),
            }]
        );
    }

    #[test]
    fn test_composite_message_matches_each_part() {
        let doc = flow(json!({ "On_upsert": trigger("account", json!(4), None) }));
        for event in ["Update", "create", "Create or Update"] {
            let analyzer = TriggerEventAnalyzer::new("account", event).unwrap();
            let matches = analyzer.analyze_document(&doc, "f.json");
            assert_eq!(matches.len(), 1, "event {}", event);
            assert_eq!(matches[0].event_label, "Create or Update");
            assert_eq!(matches[0].scope_label, "Unknown");
        }

        let analyzer = TriggerEventAnalyzer::new("account", "Delete").unwrap();
        assert!(analyzer.analyze_document(&doc, "f.json").is_empty());
    }

    #[test]
    fn test_incomplete_triggers_are_skipped() {
        let doc = flow(json!({
            "Recurrence": { "type": "Recurrence", "recurrence": { "frequency": "Day" } },
            "Other_entity": trigger("leads", json!(3), None),
            "Message_as_text": trigger("contacts", json!("3"), None),
            "No_parameters": { "type": "OpenApiConnectionWebhook", "inputs": {} },
            "Good": trigger("Contact", json!(7), Some(1)),
        }));
        let analyzer = TriggerEventAnalyzer::new("contact", "update").unwrap();
        let matches = analyzer.analyze_document(&doc, "f.json");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].trigger_name, "Good");
        assert_eq!(matches[0].event_label, "Create, Update or Delete");
        assert_eq!(matches[0].scope_label, "User");
    }

    #[test]
    fn test_describe_reads_as_summary() {
        let analyzer = TriggerEventAnalyzer::new("contact", " Create ").unwrap();
        assert_eq!(analyzer.describe(), "triggers firing on Create of 'contact'");
    }

    #[test]
    fn test_unknown_event_and_blank_arguments() {
        let analyzer = TriggerEventAnalyzer::new("contact", "Archive").unwrap();
        assert!(analyzer.message_codes.is_empty());
        assert!(analyzer.vocabulary_warning().unwrap().contains("Archive"));

        assert!(matches!(
            TriggerEventAnalyzer::new(" ", "Update"),
            Err(AnalysisError::InvalidArgument { .. })
        ));
        assert!(TriggerEventAnalyzer::new("contact", "").is_err());
    }

    #[test]
    fn test_document_without_triggers() {
        let doc = WorkflowDocument::from_value(json!({ "properties": { "definition": {} } }));
        let analyzer = TriggerEventAnalyzer::new("contact", "Update").unwrap();
        assert!(analyzer.analyze_document(&doc, "f.json").is_empty());
    }
}
