//! Introspection for anything that implements [`serde::Serialize`].
//!
//! The serde data model already describes records, sequences, maps and optionals,
//! so driving a [`Serialize`] impl into a [`Value`] is enough to flatten it
//! without hand-written [`Introspect`] impls. Serde keys (after `rename`) are used
//! as field identifiers; fields skipped with `skip_serializing_if` become
//! unexported fields.

use {
    crate::{
        introspect::Introspect,
        value::{Record, RecordType, Value},
    },
    serde::Serialize,
    tap::Pipe,
    tracing::debug,
};

const OBJECT_TYPE: &str = "object";

mod json;
mod serializer;

pub use serializer::Error;

/// Borrows a [`Serialize`] value so it can be flattened.
#[derive(Debug)]
pub struct Reflected<'a, T: ?Sized>(pub &'a T);

pub fn to_value<T>(value: &T) -> Result<Value, Error>
where
    T: Serialize + ?Sized,
{
    value.serialize(serializer::ValueSerializer)
}

impl<T> Introspect for Reflected<'_, T>
where
    T: Serialize + ?Sized,
{
    fn introspect(&self) -> Value {
        to_value(self.0).unwrap_or_else(|e| {
            debug!(?e, "value could not be reflected");
            Value::Invalid(e.to_string())
        })
    }
}

/// Builds a record whose field identifiers are the given keys, in order.
fn keyed_record(entries: impl Iterator<Item = (String, Value)>) -> Value {
    let (keys, values): (Vec<_>, Vec<_>) = entries.unzip();
    keys.into_iter()
        .fold(RecordType::new(OBJECT_TYPE), RecordType::field)
        .shared()
        .pipe(|ty| Record::value(ty, values))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{flatten, flatten::Error as FlattenError, node::Node},
        serde::{Serialize, Serializer},
        serde_json::json,
        std::collections::{BTreeMap, HashMap},
        tap::Pipe,
    };

    fn rendered(nodes: Vec<Node>) -> Vec<String> {
        nodes.iter().map(Node::to_string).collect()
    }

    #[derive(Serialize)]
    struct Example {
        #[serde(rename = "valueA")]
        value_a: String,
        #[serde(rename = "ValueB")]
        value_b: i32,
        #[serde(rename = "ValueC")]
        value_c: bool,
        #[serde(rename = "ValueD")]
        value_d: f32,
    }

    #[test_log::test]
    fn test_reflected_record() {
        let example = Example {
            value_a: "Hello".into(),
            value_b: 1,
            value_c: true,
            value_d: 22.2,
        };
        assert_eq!(
            flatten(&Reflected(&example)).unwrap().pipe(rendered),
            ["valueA=Hello", "ValueB=1", "ValueC=true", "ValueD=22.2"]
        );
    }

    #[derive(Serialize)]
    struct Leaf {
        value_e: String,
    }

    #[derive(Serialize)]
    struct Middle {
        value_a: String,
        leaf: Option<Box<Leaf>>,
    }

    #[derive(Serialize)]
    struct Root {
        middle: Middle,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        scores: Vec<u16>,
        children: Vec<Leaf>,
        labels: BTreeMap<String, u8>,
        bytes: Option<Vec<u8>>,
    }

    #[test_log::test]
    fn test_reflected_nesting() {
        let root = Root {
            middle: Middle {
                value_a: "abc".into(),
                leaf: Some(Box::new(Leaf { value_e: "cde".into() })),
            },
            note: None,
            scores: vec![1, 2, 3],
            children: vec![Leaf { value_e: "x".into() }, Leaf { value_e: "y".into() }],
            labels: BTreeMap::from([("b".to_string(), 2), ("a".to_string(), 1)]),
            bytes: None,
        };
        assert_eq!(
            flatten(&Reflected(&root)).unwrap().pipe(rendered),
            [
                "value_a=abc",
                "value_e=cde",
                "scores=[1, 2, 3]",
                "value_e=x",
                "value_e=y",
                "a=1",
                "b=2",
            ]
        );
    }

    #[derive(Serialize)]
    enum Payload {
        Text(String),
        Point { x: i32, y: i32 },
        Empty,
        Pair(u8, u8),
    }

    #[derive(Serialize)]
    struct Envelope {
        payloads: Vec<Payload>,
        kind: Payload,
    }

    #[test]
    fn test_reflected_enums() {
        let envelope = Envelope {
            payloads: vec![Payload::Text("hi".into()), Payload::Point { x: 1, y: 2 }],
            kind: Payload::Empty,
        };
        assert_eq!(
            flatten(&Reflected(&envelope)).unwrap().pipe(rendered),
            ["Text=hi", "x=1", "y=2", "kind=Empty"]
        );
        let pair = Envelope {
            payloads: vec![Payload::Pair(1, 2)],
            kind: Payload::Text("t".into()),
        };
        assert_eq!(
            flatten(&Reflected(&pair)).unwrap().pipe(rendered),
            ["Pair=[1, 2]", "Text=t"]
        );
    }

    #[test]
    fn test_record_types_are_shared() {
        let children = vec![Leaf { value_e: "x".into() }, Leaf { value_e: "y".into() }];
        let Value::Sequence(Some(items)) = to_value(&children).unwrap() else {
            panic!("expected a sequence");
        };
        let [Value::Record(first), Value::Record(second)] = items.as_slice() else {
            panic!("expected two records");
        };
        assert!(std::ptr::eq(first.record_type(), second.record_type()));
    }

    #[derive(Serialize)]
    struct Meta {
        region: String,
    }

    #[derive(Serialize)]
    struct Event {
        id: u8,
        #[serde(flatten)]
        meta: Meta,
    }

    #[derive(Serialize)]
    struct Batch {
        event: Event,
        n: u8,
    }

    #[test_log::test]
    fn test_flattened_struct_fields_are_records() {
        let event = || Event {
            id: 1,
            meta: Meta { region: "eu".into() },
        };
        assert_eq!(
            flatten(&Reflected(&event())).unwrap().pipe(rendered),
            ["id=1", "region=eu"]
        );
        assert_eq!(
            flatten(&Reflected(&Batch { event: event(), n: 2 })).unwrap().pipe(rendered),
            ["id=1", "region=eu", "n=2"]
        );
    }

    #[test]
    fn test_reflected_json_object_is_record() {
        assert_eq!(
            flatten(&Reflected(&json!({"a": {"b": 1}}))).unwrap().pipe(rendered),
            ["b=1"]
        );
    }

    #[test]
    fn test_map_keyed_by_numbers_stays_a_map() {
        let err = flatten(&Reflected(&HashMap::from([(1u8, "one")]))).unwrap_err();
        assert!(matches!(err, FlattenError::InvalidValue(_)));
        assert_eq!(
            to_value(&BTreeMap::from([(2u8, "two"), (1, "one")]))
                .unwrap()
                .to_string(),
            r#"{1: "one", 2: "two"}"#
        );
    }

    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("lock poisoned"))
        }
    }

    #[test]
    fn test_serialize_failure_is_invalid_value() {
        let err = flatten(&Reflected(&Broken)).unwrap_err();
        assert!(matches!(err, FlattenError::InvalidValue(ref reason) if reason.as_ref() == "lock poisoned"));
    }
}
