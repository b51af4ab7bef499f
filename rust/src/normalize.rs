//! Normalization of persisted or shared plan state.
//!
//! Whatever the source (storage, file, decompressed link), input goes through
//! here before the scheduler sees it. Nothing is rejected: malformed numbers
//! become null or 0, unknown discipline keys are dropped, and hierarchy and
//! dependency references are repaired so the data-model invariants hold.

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};

use crate::models::{
    Capacities, ItemId, LineItem, Override, Overrides, PlanSnapshot, Requirements, MAX_MONTHS,
};

/// Finite number from a JSON number or numeric string.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Finite, non-negative number; anything else is `None`.
fn coerce_non_negative(value: &Value) -> Option<f64> {
    coerce_number(value).filter(|n| *n >= 0.0)
}

/// Positive integral id.
fn coerce_id(value: &Value) -> Option<ItemId> {
    coerce_number(value)
        .filter(|n| *n >= 1.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
        .map(|n| n as ItemId)
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => s == "true",
        _ => false,
    }
}

fn coerce_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn field<'v>(object: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    object.get(key).filter(|v| !v.is_null())
}

/// Discipline names, trimmed, non-empty and unique, in input order.
///
/// Accepts plain strings or objects with a `name` field.
fn normalize_disciplines(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };
    let mut seen = FxHashSet::default();
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(o) => o.get("name").and_then(Value::as_str).map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

/// Capacity for every known discipline; unknown keys dropped, bad values 0.
fn normalize_capacities(value: Option<&Value>, disciplines: &[String]) -> Capacities {
    let table = value.and_then(Value::as_object);
    disciplines
        .iter()
        .map(|name| {
            let capacity = table
                .and_then(|t| t.get(name))
                .and_then(coerce_non_negative)
                .unwrap_or(0.0);
            (name.clone(), capacity)
        })
        .collect()
}

fn normalize_requirements(value: Option<&Value>, known: &FxHashSet<&str>) -> Requirements {
    let Some(Value::Object(map)) = value else {
        return Requirements::new();
    };
    map.iter()
        .filter(|(name, _)| known.contains(name.as_str()))
        .map(|(name, fte)| (name.clone(), coerce_non_negative(fte).unwrap_or(0.0)))
        .collect()
}

fn normalize_item(value: &Value, known: &FxHashSet<&str>) -> Option<LineItem> {
    let object = value.as_object()?;
    let id = field(object, "id").and_then(coerce_id)?;

    let dependency_ids = match field(object, "dependencyIds") {
        Some(Value::Array(ids)) => ids.iter().filter_map(coerce_id).collect(),
        _ => Vec::new(),
    };

    Some(LineItem {
        id,
        name: coerce_name(field(object, "name")),
        parent_id: field(object, "parentId").and_then(coerce_id),
        dependency_ids,
        priority: field(object, "priority").and_then(coerce_number),
        duration_months: field(object, "durationMonths")
            .and_then(coerce_non_negative)
            .map(|months| months.min(MAX_MONTHS as f64)),
        requirements: normalize_requirements(field(object, "requirements"), known),
    })
}

/// Repair hierarchy and dependency references in place.
///
/// * duplicate ids: first occurrence wins
/// * a parent must be an existing top-level item, otherwise it is cleared
/// * phases carry no priority
/// * dependencies must exist, must not be the item itself, and are de-duplicated
fn repair_items(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut seen = FxHashSet::default();
    let mut items: Vec<LineItem> = items.into_iter().filter(|i| seen.insert(i.id)).collect();

    let top_level: FxHashSet<ItemId> = items
        .iter()
        .filter(|i| i.parent_id.is_none())
        .map(|i| i.id)
        .collect();
    let existing: FxHashSet<ItemId> = items.iter().map(|i| i.id).collect();

    for item in &mut items {
        if let Some(parent_id) = item.parent_id {
            if parent_id == item.id || !top_level.contains(&parent_id) {
                item.parent_id = None;
            }
        }
        if item.parent_id.is_some() {
            item.priority = None;
        }
        let own_id = item.id;
        let mut seen_deps = FxHashSet::default();
        item.dependency_ids
            .retain(|dep| *dep != own_id && existing.contains(dep) && seen_deps.insert(*dep));
    }

    items
}

fn normalize_overrides(value: Option<&Value>, items: &[LineItem]) -> Overrides {
    let Some(Value::Object(map)) = value else {
        return Overrides::new();
    };
    let existing: FxHashSet<ItemId> = items.iter().map(|i| i.id).collect();

    map.iter()
        .filter_map(|(key, entry)| {
            let id = coerce_id(&Value::String(key.clone()))?;
            if !existing.contains(&id) {
                return None;
            }
            let entry = entry.as_object()?;
            let start = field(entry, "startMonth").and_then(coerce_number)?;
            let frozen = field(entry, "frozen").map(coerce_bool).unwrap_or(false);
            Some((
                id,
                Override {
                    start_month: start.floor().clamp(0.0, MAX_MONTHS as f64) as i64,
                    frozen,
                },
            ))
        })
        .collect()
}

/// Build a valid snapshot from arbitrary JSON.
pub fn snapshot_from_value(value: &Value) -> PlanSnapshot {
    let empty = Map::new();
    let root = value.as_object().unwrap_or(&empty);

    let disciplines = normalize_disciplines(field(root, "disciplines"));
    let team_capacities = normalize_capacities(field(root, "teamCapacities"), &disciplines);

    let known: FxHashSet<&str> = disciplines.iter().map(|d| d.as_str()).collect();
    let raw_items: Vec<LineItem> = match field(root, "lineItems") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| normalize_item(entry, &known))
            .collect(),
        _ => Vec::new(),
    };
    let line_items = repair_items(raw_items);
    let scheduler_overrides = normalize_overrides(field(root, "schedulerOverrides"), &line_items);

    PlanSnapshot {
        line_items,
        disciplines,
        team_capacities,
        scheduler_overrides,
    }
}

/// Parse and normalize a JSON document.
pub fn snapshot_from_json(json: &str) -> Result<PlanSnapshot, serde_json::Error> {
    let value: Value = serde_json::from_str(json)?;
    Ok(snapshot_from_value(&value))
}

/// Re-normalize an in-memory snapshot (e.g. one assembled by hand).
pub fn normalize_snapshot(snapshot: &PlanSnapshot) -> PlanSnapshot {
    let value = serde_json::to_value(snapshot).unwrap_or(Value::Null);
    snapshot_from_value(&value)
}
