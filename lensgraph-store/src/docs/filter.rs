use serde_json::{Map, Value};

use crate::error::StoreError;

/// Follow a dotted path (`imdb.rating`) through nested objects
pub fn resolve<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, key| current.as_object()?.get(key))
}

/// Equality the way document stores do it: an array field matches when the
/// whole array or any element equals the target, a missing field matches null
pub(crate) fn eq_matches(field: Option<&Value>, target: &Value) -> bool {
    match field {
        None => target.is_null(),
        Some(Value::Array(items)) => {
            field == Some(target) || items.iter().any(|item| item == target)
        }
        Some(value) => value == target,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    /// Array field contains every value
    All(Vec<Value>),
    In(Vec<Value>),
}

impl Condition {
    fn matches(&self, field: Option<&Value>) -> bool {
        match self {
            Condition::Eq(target) => eq_matches(field, target),
            Condition::All(targets) => {
                !targets.is_empty() && targets.iter().all(|target| eq_matches(field, target))
            }
            Condition::In(targets) => targets.iter().any(|target| eq_matches(field, target)),
        }
    }
}

/// Conjunction of per-field conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((path.to_string(), Condition::Eq(value.into())));
        self
    }

    pub fn all<I, V>(mut self, path: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push((path.to_string(), Condition::All(values)));
        self
    }

    pub fn is_in<I, V>(mut self, path: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push((path.to_string(), Condition::In(values)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(path, condition)| condition.matches(resolve(doc, path)))
    }
}

/// `$set`-style assignments on dotted paths
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    sets: Vec<(String, Value)>,
}

impl Update {
    pub fn set(path: &str, value: impl Into<Value>) -> Self {
        Self::default().and_set(path, value)
    }

    pub fn and_set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.sets.push((path.to_string(), value.into()));
        self
    }

    /// Apply to a document in place; returns whether anything changed
    pub fn apply(&self, doc: &mut Value) -> Result<bool, StoreError> {
        let mut changed = false;
        for (path, value) in &self.sets {
            if path == "_id" || path.starts_with("_id.") {
                return Err(StoreError::InvalidDocument("_id cannot be updated".to_string()));
            }
            changed |= set_path(doc, path, value.clone())?;
        }
        Ok(changed)
    }
}

fn set_path(doc: &mut Value, path: &str, value: Value) -> Result<bool, StoreError> {
    let mut keys = path.split('.').peekable();
    let mut current = doc;

    while let Some(key) = keys.next() {
        let object = current
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument(format!("cannot set '{}' on a non-object", path)))?;

        if keys.peek().is_none() {
            let changed = object.get(key) != Some(&value);
            object.insert(key.to_string(), value);
            return Ok(changed);
        }

        current = object
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    Ok(false)
}
