use serde_json::{json, Map, Value};

pub const DEFAULT_SOUND: &str = "default";
pub const DEFAULT_BADGE: u32 = 1;

/// Build the APNs JSON body: an `aps` block with alert, sound and badge,
/// with custom data merged at the top level. Data keys overwrite `aps`.
pub fn build_payload(title: &str, body: &str, data: Option<&Map<String, Value>>) -> Value {
    let mut payload = Map::new();
    payload.insert(
        "aps".to_string(),
        json!({
            "alert": { "title": title, "body": body },
            "sound": DEFAULT_SOUND,
            "badge": DEFAULT_BADGE,
        }),
    );

    if let Some(data) = data {
        for (key, value) in data {
            payload.insert(key.clone(), value.clone());
        }
    }

    Value::Object(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = build_payload("Hello", "World", None);
        assert_eq!(payload["aps"]["alert"]["title"], "Hello");
        assert_eq!(payload["aps"]["alert"]["body"], "World");
        assert_eq!(payload["aps"]["sound"], "default");
        assert_eq!(payload["aps"]["badge"], 1);
        assert_eq!(payload.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_data_merged_at_top_level() {
        let mut data = Map::new();
        data.insert("conversation_id".to_string(), json!("c-42"));
        data.insert("nested".to_string(), json!({ "depth": 2 }));

        let payload = build_payload("t", "b", Some(&data));
        assert_eq!(payload["conversation_id"], "c-42");
        assert_eq!(payload["nested"]["depth"], 2);
        assert_eq!(payload["aps"]["badge"], 1);
    }
}
