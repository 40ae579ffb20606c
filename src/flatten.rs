use {
    crate::{
        introspect::Introspect,
        node::Node,
        value::{Kind, Record, RecordType, Value},
    },
    tap::TapFallible,
    tracing::{debug, instrument, trace},
};

const NAME_MARKER: &str = "name=";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value: {0}")]
    InvalidValue(Box<str>),
    #[error("unsupported type: {0}")]
    UnsupportedType(Kind),
    #[error("flattening field '{field}' of {record}")]
    Field {
        record: Box<str>,
        field: Box<str>,
        #[source]
        source: Box<Error>,
    },
    #[error("flattening element #{idx}")]
    Element {
        idx: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The failure that started it all, with the field/element context peeled off.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Field { source, .. } | Error::Element { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

type Result<T> = std::result::Result<T, self::Error>;

/// Name a field is published under: the `name=` segment of its tag when
/// present and non-empty, the declared identifier otherwise.
/// `None` only when `index` is out of range.
pub fn field_name(record_type: &RecordType, index: usize) -> Option<&str> {
    let field = record_type.fields().get(index)?;
    field
        .tag
        .as_deref()
        .filter(|tag| !tag.is_empty())
        .and_then(|tag| tag.split(',').rfind(|segment| segment.contains(NAME_MARKER)))
        .and_then(|segment| segment.split('=').nth(1))
        .filter(|name| !name.is_empty())
        .or(Some(field.ident.as_ref()))
}

/// Flattens a message into its leaf nodes, depth first, in declaration order.
#[instrument(skip_all)]
pub fn flatten<T>(message: &T) -> Result<Vec<Node>>
where
    T: Introspect + ?Sized,
{
    flatten_value(&message.introspect())
}

#[instrument(skip_all, fields(kind = value.kind_name()))]
pub fn flatten_value(value: &Value) -> Result<Vec<Node>> {
    match value.resolve() {
        Some(Value::Map(_)) => Err(Error::InvalidValue(Box::from("message is a map, not a record"))),
        Some(root) => visit(root, ""),
        None => Err(Error::InvalidValue(Box::from("message points to nothing"))),
    }
    .tap_ok(|nodes| debug!(nodes = nodes.len(), "flattened"))
}

fn emit(name: &str, value: impl Into<String>) -> Vec<Node> {
    Node::new(name, value).into_iter().collect()
}

fn visit(value: &Value, name: &str) -> Result<Vec<Node>> {
    trace!(name, kind = value.kind_name(), "visiting");
    match value {
        Value::Invalid(reason) => Err(Error::InvalidValue(Box::from(reason.as_str()))),
        Value::Indirection(_) => match value.resolve() {
            Some(target) => visit(target, name),
            None => {
                trace!(name, "indirection points to nothing");
                Ok(Vec::new())
            }
        },
        Value::Record(record) => flatten_record(record),
        Value::Sequence(items) => flatten_sequence(value, items.as_deref(), name),
        Value::Unsupported(kind) => Err(Error::UnsupportedType(*kind)),
        leaf @ (Value::Scalar(_) | Value::Map(_)) => Ok(emit(name, leaf.to_string())),
    }
}

fn flatten_record(record: &Record) -> Result<Vec<Node>> {
    let ty = record.record_type();
    record
        .fields()
        .try_fold(Vec::new(), |mut nodes, (idx, descriptor, value)| {
            match (value, descriptor.exported) {
                (Value::Invalid(_), _) => visit(value, ""),
                (_, false) => {
                    trace!(field = %descriptor.ident, "skipping unexported field");
                    Ok(Vec::new())
                }
                (_, true) => visit(value, field_name(ty, idx).unwrap_or_default()),
            }
            .map_err(|source| Error::Field {
                record: Box::from(ty.name()),
                field: Box::from(descriptor.ident.as_ref()),
                source: Box::new(source),
            })
            .map(|found| {
                nodes.extend(found);
                nodes
            })
        })
}

fn flatten_sequence(sequence: &Value, items: Option<&[Value]>, name: &str) -> Result<Vec<Node>> {
    match items {
        None | Some([]) => Ok(emit(name, "")),
        Some(items @ [Value::Record(_) | Value::Indirection(_), ..]) => {
            items
                .iter()
                .enumerate()
                .try_fold(Vec::new(), |mut nodes, (idx, item)| {
                    visit(item, name)
                        .map_err(|source| Error::Element {
                            idx,
                            source: Box::new(source),
                        })
                        .map(|found| {
                            nodes.extend(found);
                            nodes
                        })
                })
        }
        Some(_) => Ok(emit(name, sequence.to_string())),
    }
}
