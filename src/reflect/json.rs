use {
    super::keyed_record,
    crate::{introspect::Introspect, value::Value},
    serde_json::Number,
    tap::Pipe,
};

fn number(number: &Number) -> Value {
    number
        .as_u64()
        .map(Value::from)
        .or_else(|| number.as_i64().map(Value::from))
        .or_else(|| number.as_f64().map(Value::from))
        .unwrap_or_else(|| Value::str(number.to_string()))
}

/// Objects are records keyed by their member names, in document order.
impl Introspect for serde_json::Value {
    fn introspect(&self) -> Value {
        match self {
            serde_json::Value::Null => Value::Indirection(None),
            serde_json::Value::Bool(v) => Value::from(*v),
            serde_json::Value::Number(v) => number(v),
            serde_json::Value::String(v) => Value::str(v.as_str()),
            serde_json::Value::Array(items) => items.as_slice().introspect(),
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(key, value)| (key.clone(), value.introspect()))
                .pipe(keyed_record),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{flatten, node::Node},
        serde_json::json,
    };

    #[test_log::test]
    fn test_flatten_json_document() {
        let document = json!({
            "user": {
                "name": "John",
                "address": {
                    "city": "NYC",
                    "zip": "10001"
                }
            },
            "tags": ["a", "b"],
            "orders": [{"id": 1}, {"id": 2}],
            "missing": null,
            "empty": [],
            "active": true,
            "ratio": 0.5
        });
        assert_eq!(
            flatten(&document).unwrap().iter().map(Node::to_string).collect::<Vec<_>>(),
            [
                "name=John",
                "city=NYC",
                "zip=10001",
                r#"tags=["a", "b"]"#,
                "id=1",
                "id=2",
                "empty=",
                "active=true",
                "ratio=0.5",
            ]
        );
    }

    #[test]
    fn test_null_document_is_invalid() {
        assert!(flatten(&serde_json::Value::Null).is_err());
    }
}
