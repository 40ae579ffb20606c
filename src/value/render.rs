use {
    super::{Record, Scalar, Value},
    crate::flatten::field_name,
    itertools::Itertools,
    std::fmt,
    tap::Pipe,
};

/// Renders a value sitting inside a collection; text gets quoted there.
struct Nested<'a>(&'a Value);

impl fmt::Display for Nested<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.resolve() {
            Some(Value::Scalar(Scalar::Str(v))) => write!(f, "{v:?}"),
            Some(Value::Scalar(Scalar::Char(v))) => write!(f, "{v:?}"),
            Some(other) => fmt::Display::fmt(other, f),
            None => f.write_str("null"),
        }
    }
}

fn write_record(record: &Record, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let ty = record.record_type();
    let fields = record
        .fields()
        .filter(|(_, descriptor, _)| descriptor.exported)
        .map(|(idx, _, value)| format!("{}: {}", field_name(ty, idx).unwrap_or_default(), Nested(value)))
        .collect::<Vec<_>>();
    if fields.is_empty() {
        f.write_str(ty.name())
    } else {
        write!(f, "{} {{ {} }}", ty.name(), fields.join(", "))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Invalid(_) => f.write_str("<invalid>"),
            Value::Scalar(scalar) => fmt::Display::fmt(scalar, f),
            Value::Record(record) => write_record(record, f),
            Value::Sequence(None) => Ok(()),
            Value::Sequence(Some(items)) => write!(f, "[{}]", items.iter().map(Nested).join(", ")),
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| (Nested(k).to_string(), Nested(v).to_string()))
                .sorted()
                .map(|(k, v)| format!("{k}: {v}"))
                .join(", ")
                .pipe(|entries| write!(f, "{{{entries}}}")),
            Value::Indirection(Some(inner)) => fmt::Display::fmt(inner, f),
            Value::Indirection(None) => f.write_str("null"),
            Value::Unsupported(kind) => write!(f, "<{kind}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::value::RecordType};

    #[test]
    fn test_render_scalars() {
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(22.2f32).to_string(), "22.2");
        assert_eq!(Value::from(-5i8).to_string(), "-5");
        assert_eq!(Value::str("Hello").to_string(), "Hello");
    }

    #[test]
    fn test_render_sequences() {
        let numbers = Value::Sequence(Some(vec![1u8.into(), 2u8.into(), 3u8.into()]));
        assert_eq!(numbers.to_string(), "[1, 2, 3]");
        let strings = Value::Sequence(Some(vec!["a".into(), "b".into()]));
        assert_eq!(strings.to_string(), r#"["a", "b"]"#);
        let nested = Value::Sequence(Some(vec![
            Value::Sequence(Some(vec![1i32.into()])),
            Value::Sequence(Some(vec![2i32.into()])),
        ]));
        assert_eq!(nested.to_string(), "[[1], [2]]");
        assert_eq!(Value::Sequence(None).to_string(), "");
    }

    #[test]
    fn test_render_map_is_sorted() {
        let map = Value::Map(vec![("b".into(), 2i32.into()), ("a".into(), Value::Indirection(None))]);
        assert_eq!(map.to_string(), r#"{"a": null, "b": 2}"#);
    }

    #[test]
    fn test_render_record() {
        let ty = RecordType::new("Point")
            .tagged_field("X", "varint,1,opt,name=x")
            .field("Y")
            .private_field("hidden")
            .shared();
        let point = Record::value(ty, vec![1i32.into(), 2i32.into(), 3i32.into()]);
        assert_eq!(point.to_string(), "Point { x: 1, Y: 2 }");
    }
}
