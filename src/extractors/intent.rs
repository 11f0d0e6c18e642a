//! Extract the raw query intent from the URL query string.
//!
//! Accepted forms, which may be mixed:
//! - bracket notation: `filters[0][name]=topSpeed&filters[0][operation]=>&filters[0][value]=200`
//! - JSON-encoded sections: `filters=[{"name":"topSpeed","operation":">","value":200}]`
//! - plain `limit=10&offset=5`
//!
//! Bracket-notation values arrive as strings; SQLite's column affinity handles numeric comparison.

use crate::error::AppError;
use crate::intent::RawQuery;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

const SECTIONS: &[&str] = &["fields", "filters", "order"];

fn bracket_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(fields|filters|order)\[(\d+)\]\[([A-Za-z]+)\]$").expect("valid bracket key regex")
    })
}

/// Extractor for the raw (unvalidated) intent of a table query.
#[derive(Clone, Debug)]
pub struct IntentQuery(pub RawQuery);

#[async_trait]
impl<S> FromRequestParts<S> for IntentQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        raw_query_from_pairs(pairs).map(IntentQuery)
    }
}

/// Assemble `{fields, filters, order, limit, offset}` from decoded query pairs. Unknown keys are ignored.
pub fn raw_query_from_pairs(pairs: Vec<(String, String)>) -> Result<RawQuery, AppError> {
    let mut top = Map::new();
    let mut indexed: BTreeMap<&'static str, BTreeMap<usize, Map<String, Value>>> = BTreeMap::new();

    for (key, value) in pairs {
        if let Some(caps) = bracket_key_re().captures(&key) {
            let section = SECTIONS
                .iter()
                .copied()
                .find(|s| *s == &caps[1])
                .ok_or_else(|| AppError::BadRequest(format!("unknown section in {key:?}")))?;
            let index: usize = caps[2]
                .parse()
                .map_err(|_| AppError::BadRequest(format!("bad index in {key:?}")))?;
            indexed
                .entry(section)
                .or_default()
                .entry(index)
                .or_default()
                .insert(caps[3].to_string(), Value::String(value));
            continue;
        }
        match key.as_str() {
            "limit" | "offset" => {
                top.insert(key, Value::String(value));
            }
            k if SECTIONS.contains(&k) => {
                let parsed: Value = serde_json::from_str(&value)
                    .map_err(|e| AppError::BadRequest(format!("{k} must be a JSON array: {e}")))?;
                if !parsed.is_array() {
                    return Err(AppError::BadRequest(format!("{k} must be a JSON array")));
                }
                top.insert(key, parsed);
            }
            _ => {}
        }
    }

    for (section, entries) in indexed {
        let items = top
            .entry(section.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = items {
            items.extend(entries.into_values().map(Value::Object));
        }
    }

    serde_json::from_value(Value::Object(top)).map_err(|e| AppError::BadRequest(format!("malformed query: {e}")))
}
