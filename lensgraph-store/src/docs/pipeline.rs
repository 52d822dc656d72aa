use anyhow::Result;
use serde_json::{Map, Value};

use super::filter::{eq_matches, resolve, Filter};
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    /// Emit `{field: n}` for the incoming documents; nothing when there are none
    Count(String),
    /// Output fields are expressions: `"$path"` reads the input, numbers and
    /// booleans include/exclude the same-named field, anything else is literal
    Project(Map<String, Value>),
    /// Embed matching documents of another collection as an array
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
}

impl Stage {
    pub fn count(field: &str) -> Self {
        Stage::Count(field.to_string())
    }

    /// Build a projection from a JSON object; non-objects project nothing
    pub fn project(fields: Value) -> Self {
        match fields {
            Value::Object(fields) => Stage::Project(fields),
            _ => Stage::Project(Map::new()),
        }
    }

    pub fn lookup(from: &str, local_field: &str, foreign_field: &str, as_field: &str) -> Self {
        Stage::Lookup {
            from: from.to_string(),
            local_field: local_field.to_string(),
            foreign_field: foreign_field.to_string(),
            as_field: as_field.to_string(),
        }
    }
}

/// Run stages over `docs`; `load` fetches the documents of another collection
pub fn run_pipeline(
    mut docs: Vec<Value>,
    stages: &[Stage],
    load: &mut dyn FnMut(&str) -> Result<Vec<Value>>,
) -> Result<Vec<Value>> {
    for stage in stages {
        docs = match stage {
            Stage::Match(filter) => docs.into_iter().filter(|doc| filter.matches(doc)).collect(),
            Stage::Count(field) => count(docs, field)?,
            Stage::Project(fields) => docs.iter().map(|doc| project(doc, fields)).collect(),
            Stage::Lookup {
                from,
                local_field,
                foreign_field,
                as_field,
            } => {
                let foreign = load(from)?;
                docs.into_iter()
                    .map(|doc| lookup(doc, &foreign, local_field, foreign_field, as_field))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
    }
    Ok(docs)
}

fn count(docs: Vec<Value>, field: &str) -> Result<Vec<Value>, StoreError> {
    if field.is_empty() || field.starts_with('$') || field.contains('.') {
        return Err(StoreError::InvalidDocument(format!(
            "invalid count field '{}'",
            field
        )));
    }
    if docs.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Map::new();
    out.insert(field.to_string(), Value::from(docs.len()));
    Ok(vec![Value::Object(out)])
}

fn project(doc: &Value, fields: &Map<String, Value>) -> Value {
    let mut out = Map::new();

    if !fields.contains_key("_id") {
        if let Some(id) = doc.get("_id") {
            out.insert("_id".to_string(), id.clone());
        }
    }

    for (field, expr) in fields {
        match expr {
            Value::Bool(include) => {
                if *include {
                    include_field(&mut out, doc, field);
                }
            }
            Value::Number(flag) => {
                if flag.as_f64() != Some(0.0) {
                    include_field(&mut out, doc, field);
                }
            }
            _ => {
                if let Some(value) = evaluate(expr, doc) {
                    out.insert(field.clone(), value);
                }
            }
        }
    }

    Value::Object(out)
}

fn include_field(out: &mut Map<String, Value>, doc: &Value, field: &str) {
    if let Some(value) = resolve(doc, field) {
        out.insert(field.to_string(), value.clone());
    }
}

/// `"$path"` references resolve against `doc`; missing references yield `None`
fn evaluate(expr: &Value, doc: &Value) -> Option<Value> {
    match expr {
        Value::String(s) => match s.strip_prefix('$') {
            Some(path) => resolve(doc, path).cloned(),
            None => Some(expr.clone()),
        },
        Value::Object(fields) => Some(Value::Object(
            fields
                .iter()
                .filter_map(|(k, v)| evaluate(v, doc).map(|value| (k.clone(), value)))
                .collect(),
        )),
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| evaluate(item, doc).unwrap_or(Value::Null))
                .collect(),
        )),
        _ => Some(expr.clone()),
    }
}

fn lookup(
    mut doc: Value,
    foreign: &[Value],
    local_field: &str,
    foreign_field: &str,
    as_field: &str,
) -> Result<Value, StoreError> {
    let local = resolve(&doc, local_field).cloned().unwrap_or(Value::Null);
    let local_values = match local {
        Value::Array(items) if !items.is_empty() => items,
        other => vec![other],
    };

    let joined: Vec<Value> = foreign
        .iter()
        .filter(|candidate| {
            let field = resolve(candidate, foreign_field);
            local_values.iter().any(|value| eq_matches(field, value))
        })
        .cloned()
        .collect();

    let object = doc
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("lookup input is not an object".to_string()))?;
    object.insert(as_field.to_string(), Value::Array(joined));
    Ok(doc)
}
