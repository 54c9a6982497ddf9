//! Navigation over exported cloud flow definitions.
//!
//! A definition file looks like
//! `{ "properties": { "definition": { "triggers": {..}, "actions": {..} } } }`.
//! Everything here fails closed: a missing key or a node of the wrong shape
//! means "not present", never an error.

use serde_json::{Map, Value};

pub type NodeMap = Map<String, Value>;

const DEFAULT_ACTION_TYPE: &str = "Unknown Type";

/// One parsed definition file.
#[derive(Debug, Clone)]
pub struct WorkflowDocument {
    root: Value,
}

impl WorkflowDocument {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self::from_value)
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// `properties.definition.<name>`, if it is an object.
    pub fn try_get_collection(&self, name: &str) -> Option<&NodeMap> {
        self.root
            .get("properties")?
            .get("definition")?
            .get(name)?
            .as_object()
    }

    pub fn triggers(&self) -> Option<&NodeMap> {
        self.try_get_collection("triggers")
    }

    pub fn actions(&self) -> Option<&NodeMap> {
        self.try_get_collection("actions")
    }
}

/// The declared `type` of an action, or "Unknown Type".
pub fn action_type(node: &Value) -> &str {
    node.get("type")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ACTION_TYPE)
}

/// Shape of an action's `inputs` property.
#[derive(Debug, Clone, Copy)]
pub enum ActionInputs<'a> {
    /// `inputs` is an object (connector calls, compose with object body, ...).
    Structured(&'a NodeMap),
    /// Shorthand: `inputs` is a single expression string.
    Text(&'a str),
    /// Missing, or a shape nothing here inspects (array, number, ...).
    Absent,
}

impl<'a> ActionInputs<'a> {
    pub fn of(action: &'a Value) -> Self {
        match action.get("inputs") {
            Some(Value::Object(map)) => ActionInputs::Structured(map),
            Some(Value::String(text)) => ActionInputs::Text(text.as_str()),
            _ => ActionInputs::Absent,
        }
    }

    /// `inputs.parameters`, when it is an object.
    pub fn parameters(&self) -> Option<&'a NodeMap> {
        match self {
            ActionInputs::Structured(map) => map.get("parameters")?.as_object(),
            _ => None,
        }
    }

    /// `inputs.host.operationId`, when it is a string.
    pub fn operation_id(&self) -> Option<&'a str> {
        match self {
            ActionInputs::Structured(map) => map.get("host")?.as_object()?.get("operationId")?.as_str(),
            _ => None,
        }
    }

    /// `inputs.parameters.entityName`, when it is a string.
    pub fn entity_name(&self) -> Option<&'a str> {
        self.parameters()?.get("entityName")?.as_str()
    }
}

/// Dataverse "when a row is added, modified or deleted" subscription fields.
#[derive(Debug, Clone, Copy)]
pub struct TriggerSubscription<'a> {
    pub parameters: &'a NodeMap,
    pub entity_name: Option<&'a str>,
    pub message: Option<i64>,
    pub filtering_attributes: Option<&'a str>,
}

impl<'a> TriggerSubscription<'a> {
    /// Requires `inputs.parameters` to be an object.
    pub fn of(trigger: &'a Value) -> Option<Self> {
        let parameters = trigger.get("inputs")?.get("parameters")?.as_object()?;
        Some(Self {
            parameters,
            entity_name: parameters
                .get("subscriptionRequest/entityname")
                .and_then(Value::as_str),
            message: parameters
                .get("subscriptionRequest/message")
                .and_then(Value::as_i64),
            filtering_attributes: parameters
                .get("subscriptionRequest/filteringattributes")
                .and_then(Value::as_str),
        })
    }
}

/// Which branch of a container a nested scope came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind<'a> {
    /// `actions` directly on the node: If (true branch), Scope, Foreach, Until.
    Sequential,
    /// `else.actions` on a condition.
    Else,
    /// `cases.<name>.actions` on a switch.
    Case(&'a str),
    /// `default.actions` on a switch.
    Default,
}

/// Nested action scopes attached to an action, in document order.
pub fn child_scopes(action: &Value) -> Vec<(ScopeKind<'_>, &NodeMap)> {
    let mut scopes = Vec::new();

    if let Some(actions) = action.get("actions").and_then(Value::as_object) {
        scopes.push((ScopeKind::Sequential, actions));
    }

    if let Some(actions) = action
        .get("else")
        .and_then(|branch| branch.get("actions"))
        .and_then(Value::as_object)
    {
        scopes.push((ScopeKind::Else, actions));
    }

    if let Some(cases) = action.get("cases").and_then(Value::as_object) {
        for (case_name, case) in cases {
            if let Some(actions) = case.get("actions").and_then(Value::as_object) {
                scopes.push((ScopeKind::Case(case_name.as_str()), actions));
            }
        }

        if let Some(actions) = action
            .get("default")
            .and_then(|branch| branch.get("actions"))
            .and_then(Value::as_object)
        {
            scopes.push((ScopeKind::Default, actions));
        }
    }

    scopes
}

/// Depth-first, pre-order walk over every action in `scope` and below.
pub fn walk_actions<'a, F>(scope: &'a NodeMap, visit: &mut F)
where
    F: FnMut(&'a str, &'a Value),
{
    for (name, action) in scope {
        visit(name.as_str(), action);
        for (_, nested) in child_scopes(action) {
            walk_actions(nested, visit);
        }
    }
}

/// The action rendered as JSON text without its nested scopes, which are
/// visited on their own.
pub fn render_without_scopes(action: &Value) -> String {
    match action {
        Value::Object(map) => {
            let mut own = map.clone();
            own.remove("actions");
            own.remove("else");
            if own.remove("cases").is_some() {
                own.remove("default");
            }
            Value::Object(own).to_string()
        }
        other => other.to_string(),
    }
}
