//! Deep merge of layered configuration trees.
//!
//! Layers are plain `serde_json::Value` trees. Objects merge key by key,
//! arrays concatenate and then dedupe, and every other conflict is won by the
//! higher-priority layer. Array elements that are objects with a string
//! `name` are keyed by that name: the element keeps the position where the
//! name first appeared and takes the value of the last layer that defined it.

use serde_json::{Map, Value};

/// Merge `source` over `target`, returning a new tree
pub fn merge(target: &Value, source: &Value) -> Value {
    match (target, source) {
        (Value::Object(base), Value::Object(overlay)) => {
            Value::Object(merge_objects(base, overlay))
        }
        (Value::Array(base), Value::Array(overlay)) => {
            let combined: Vec<Value> = base.iter().chain(overlay.iter()).cloned().collect();
            Value::Array(dedupe(combined))
        }
        _ => source.clone(),
    }
}

/// Fold layers left to right, lowest priority first
pub fn merge_layers<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    layers
        .into_iter()
        .fold(Value::Object(Map::new()), |acc, layer| merge(&acc, layer))
}

fn merge_objects(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in overlay {
        let next = match base.get(key) {
            Some(existing) => merge(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

/// Remove duplicates from a list while keeping first-seen order.
///
/// Named objects collapse onto one slot whose value is the last definition.
pub fn dedupe(items: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        let slot = match element_name(&item) {
            Some(name) => out
                .iter()
                .position(|existing| element_name(existing) == Some(name)),
            None => out.iter().position(|existing| existing == &item),
        };
        match slot {
            Some(index) => out[index] = item,
            None => out.push(item),
        }
    }
    out
}

fn element_name(value: &Value) -> Option<&str> {
    value.as_object()?.get("name")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_overwrite_and_recursion() {
        let base = json!({"preCommit": {"enabled": true, "timeout": 10000}});
        let env = json!({"preCommit": {"timeout": 15000}});
        let merged = merge(&base, &env);
        assert_eq!(merged, json!({"preCommit": {"enabled": true, "timeout": 15000}}));
    }

    #[test]
    fn test_layer_order_decides_winner() {
        let base = json!({"timeout": 10000});
        let env = json!({"timeout": 15000});
        let project = json!({"timeout": 20000});

        assert_eq!(merge_layers([&base, &env])["timeout"], 15000);
        assert_eq!(merge_layers([&base, &env, &project])["timeout"], 20000);
        assert_eq!(merge_layers([&base, &project, &env])["timeout"], 15000);
    }

    #[test]
    fn test_check_lists_dedupe_by_name() {
        let base = json!({"checks": [{"name": "a", "enabled": true}]});
        let user = json!({"checks": [
            {"name": "a", "enabled": false},
            {"name": "b", "enabled": true}
        ]});

        let merged = merge(&base, &user);
        assert_eq!(
            merged["checks"],
            json!([
                {"name": "a", "enabled": false},
                {"name": "b", "enabled": true}
            ])
        );
    }

    #[test]
    fn test_named_entry_is_replaced_not_field_merged() {
        let base = json!({
            "checks": [{"name": "build", "critical": true, "options": {"command": "make"}}]
        });
        let over = json!({"checks": [{"name": "build", "critical": false}]});

        let merged = merge(&base, &over);
        assert_eq!(merged["checks"], json!([{"name": "build", "critical": false}]));
    }

    #[test]
    fn test_first_seen_position_is_kept() {
        let base = json!(["x", {"name": "a", "v": 1}, {"name": "b", "v": 1}]);
        let over = json!([{"name": "b", "v": 2}, {"name": "a", "v": 2}, "x", "y"]);

        let merged = merge(&base, &over);
        assert_eq!(
            merged,
            json!(["x", {"name": "a", "v": 2}, {"name": "b", "v": 2}, "y"])
        );
    }

    #[test]
    fn test_plain_values_dedupe_by_equality() {
        let merged = merge(&json!({"types": ["feat", "fix"]}), &json!({"types": ["fix", "wip"]}));
        assert_eq!(merged["types"], json!(["feat", "fix", "wip"]));

        let merged = merge(&json!([{"a": 1}]), &json!([{"a": 1}, {"a": 2}]));
        assert_eq!(merged, json!([{"a": 1}, {"a": 2}]));
    }

    #[test]
    fn test_type_mismatch_source_wins() {
        let merged = merge(&json!({"skip": ["main"]}), &json!({"skip": "main"}));
        assert_eq!(merged["skip"], json!("main"));

        let merged = merge(&json!({"general": {"debug": true}}), &json!({"general": null}));
        assert_eq!(merged["general"], Value::Null);
    }

    #[test]
    fn test_inputs_are_untouched() {
        let base = json!({"a": {"b": [1]}});
        let over = json!({"a": {"b": [2], "c": true}});
        let base_before = base.clone();
        let over_before = over.clone();

        let _ = merge(&base, &over);
        assert_eq!(base, base_before);
        assert_eq!(over, over_before);
    }

    #[test]
    fn test_dedupe_single_list() {
        let list = vec![json!({"name": "a", "v": 1}), json!({"name": "a", "v": 2})];
        assert_eq!(dedupe(list), vec![json!({"name": "a", "v": 2})]);
    }
}
