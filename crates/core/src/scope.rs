//! What part of the page an audit covers

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A page-side expression that evaluates to a DOM node,
/// e.g. `document.querySelector('main')`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn expression(&self) -> &str {
        &self.0
    }
}

/// Audit scope.
///
/// Typed values are taken as given: an empty selector or an empty list is a
/// real (if odd) scope and reaches the engine unchanged. Only
/// [`Scope::resolve`] applies the structural "is this nothing" rule, for
/// contexts that arrive untyped from YAML or JSON.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scope {
    /// Audit the entire current document
    #[default]
    WholeDocument,
    Selector(String),
    Element(ElementRef),
    Elements(Vec<Scope>),
    /// Engine-native context object, such as `{ include, exclude }`
    Context(Value),
}

impl Scope {
    /// Resolve an untyped context.
    ///
    /// Absent, `null` and `{}` mean the whole document. Everything else passes
    /// through: strings become selectors, arrays become element lists, and any
    /// other value is handed to the engine as its own context form. The empty
    /// rule applies to the context as a whole, never to list items: a `null`
    /// or `{}` item stays in the list as given.
    pub fn resolve(context: Option<&Value>) -> Self {
        match context {
            None | Some(Value::Null) => Scope::WholeDocument,
            Some(Value::Object(map)) if map.is_empty() => Scope::WholeDocument,
            Some(Value::String(selector)) => Scope::Selector(selector.clone()),
            Some(Value::Array(items)) => {
                Scope::Elements(items.iter().map(list_item).collect())
            }
            Some(other) => Scope::Context(other.clone()),
        }
    }

    pub fn is_whole_document(&self) -> bool {
        matches!(self, Scope::WholeDocument)
    }
}

fn list_item(item: &Value) -> Scope {
    match item {
        Value::String(selector) => Scope::Selector(selector.clone()),
        other => Scope::Context(other.clone()),
    }
}

impl From<&str> for Scope {
    fn from(selector: &str) -> Self {
        Scope::Selector(selector.to_string())
    }
}

impl From<String> for Scope {
    fn from(selector: String) -> Self {
        Scope::Selector(selector)
    }
}

impl From<ElementRef> for Scope {
    fn from(element: ElementRef) -> Self {
        Scope::Element(element)
    }
}

impl From<Vec<Scope>> for Scope {
    fn from(items: Vec<Scope>) -> Self {
        Scope::Elements(items)
    }
}

impl From<Option<Scope>> for Scope {
    fn from(scope: Option<Scope>) -> Self {
        scope.unwrap_or_default()
    }
}
