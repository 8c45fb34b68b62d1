use serde_json::{Map, Value};

/// Formatting attributes attached to an insert or retain
pub type AttributeMap = Map<String, Value>;

/// Collapse an empty attribute map to `None`
pub fn normalize(attributes: Option<AttributeMap>) -> Option<AttributeMap> {
    attributes.filter(|attrs| !attrs.is_empty())
}

/// Attributes that turn `old` into `new` when applied with a retain.
///
/// Keys whose value changed or that only exist in `new` carry the new value;
/// keys dropped by `new` map to `null` so that applying the retain clears them.
pub fn diff(old: Option<&AttributeMap>, new: Option<&AttributeMap>) -> Option<AttributeMap> {
    let empty = AttributeMap::new();
    let old = old.unwrap_or(&empty);
    let new = new.unwrap_or(&empty);

    let mut changed = AttributeMap::new();
    for (key, value) in new {
        if old.get(key) != Some(value) {
            changed.insert(key.clone(), value.clone());
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            changed.insert(key.clone(), Value::Null);
        }
    }

    normalize(Some(changed))
}

/// Layer `overlay` on top of `base`. A `null` in `overlay` removes the key.
pub fn compose(
    base: Option<&AttributeMap>,
    overlay: Option<&AttributeMap>,
) -> Option<AttributeMap> {
    let mut merged = base.cloned().unwrap_or_default();
    if let Some(overlay) = overlay {
        for (key, value) in overlay {
            if value.is_null() {
                merged.remove(key);
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    normalize(Some(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("attributes must be an object"),
        }
    }

    #[test]
    fn test_diff_reports_changed_added_and_removed() {
        let old = attrs(json!({"bold": true, "color": "red", "italic": true}));
        let new = attrs(json!({"bold": true, "color": "blue", "link": "x"}));

        let changed = diff(Some(&old), Some(&new)).unwrap();
        assert_eq!(
            Value::Object(changed),
            json!({"color": "blue", "link": "x", "italic": null})
        );
    }

    #[test]
    fn test_diff_of_equal_maps_is_none() {
        let old = attrs(json!({"bold": true}));
        assert_eq!(diff(Some(&old), Some(&old.clone())), None);
        assert_eq!(diff(None, Some(&AttributeMap::new())), None);
        assert_eq!(diff(None, None), None);
    }

    #[test]
    fn test_compose_removes_null_keys() {
        let base = attrs(json!({"bold": true, "color": "red"}));
        let overlay = attrs(json!({"bold": null, "italic": true}));

        let merged = compose(Some(&base), Some(&overlay)).unwrap();
        assert_eq!(Value::Object(merged), json!({"color": "red", "italic": true}));

        // Removing a key the base never had leaves nothing behind
        let added = compose(None, Some(&attrs(json!({"link": null, "bold": true})))).unwrap();
        assert_eq!(Value::Object(added), json!({"bold": true}));
    }

    #[test]
    fn test_compose_to_empty_is_none() {
        let base = attrs(json!({"bold": true}));
        let overlay = attrs(json!({"bold": null}));
        assert_eq!(compose(Some(&base), Some(&overlay)), None);
        assert_eq!(compose(Some(&base), None), Some(base.clone()));
    }
}
