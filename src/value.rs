use {
    std::{borrow::Cow, fmt, sync::Arc},
    tap::Pipe,
};

mod render;

/// Kinds the flattener refuses to stringify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Channel,
    RawPointer,
    Function,
    /// machine-word sized integer carrying an address rather than a number
    Address,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Channel => "channel",
            Kind::RawPointer => "raw pointer",
            Kind::Function => "function",
            Kind::Address => "address",
        }
        .pipe(|kind| f.write_str(kind))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i128),
    Uint(u128),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => fmt::Display::fmt(v, f),
            Scalar::Int(v) => fmt::Display::fmt(v, f),
            Scalar::Uint(v) => fmt::Display::fmt(v, f),
            Scalar::F32(v) => fmt::Display::fmt(v, f),
            Scalar::F64(v) => fmt::Display::fmt(v, f),
            Scalar::Char(v) => fmt::Display::fmt(v, f),
            Scalar::Str(v) => fmt::Display::fmt(v, f),
        }
    }
}

/// Static description of a single record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub ident: Cow<'static, str>,
    /// serialization alias metadata, e.g. `bytes,1,opt,name=valueA,proto3`
    pub tag: Option<Cow<'static, str>>,
    pub exported: bool,
}

impl FieldDescriptor {
    pub fn new(ident: impl Into<Cow<'static, str>>) -> Self {
        Self {
            ident: ident.into(),
            tag: None,
            exported: true,
        }
    }

    pub fn tagged(mut self, tag: impl Into<Cow<'static, str>>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }
}

/// Shape shared by every record of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RecordType {
    name: Cow<'static, str>,
    fields: Vec<FieldDescriptor>,
}

impl RecordType {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a public field without alias metadata.
    pub fn field(self, ident: impl Into<Cow<'static, str>>) -> Self {
        self.with(FieldDescriptor::new(ident))
    }

    pub fn tagged_field(self, ident: impl Into<Cow<'static, str>>, tag: impl Into<Cow<'static, str>>) -> Self {
        self.with(FieldDescriptor::new(ident).tagged(tag))
    }

    pub fn private_field(self, ident: impl Into<Cow<'static, str>>) -> Self {
        self.with(FieldDescriptor::new(ident).private())
    }

    pub fn with(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("record type '{type_name}' declares {expected} fields, got {found} values")]
pub struct FieldCountMismatch {
    pub type_name: Box<str>,
    pub expected: usize,
    pub found: usize,
}

/// A record value: its type plus one value per declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: Arc<RecordType>,
    values: Vec<Value>,
}

impl Record {
    pub fn new(ty: Arc<RecordType>, values: Vec<Value>) -> Result<Self, FieldCountMismatch> {
        if ty.fields.len() != values.len() {
            return Err(FieldCountMismatch {
                type_name: Box::from(ty.name()),
                expected: ty.fields.len(),
                found: values.len(),
            });
        }
        Ok(Self { ty, values })
    }

    /// Same as [`Record::new`], with a count mismatch reported as [`Value::Invalid`].
    pub fn value(ty: Arc<RecordType>, values: Vec<Value>) -> Value {
        Self::new(ty, values)
            .map(Value::Record)
            .unwrap_or_else(|e| Value::Invalid(e.to_string()))
    }

    pub fn record_type(&self) -> &RecordType {
        &self.ty
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn fields(&self) -> impl Iterator<Item = (usize, &FieldDescriptor, &Value)> + '_ {
        self.ty
            .fields
            .iter()
            .zip(&self.values)
            .enumerate()
            .map(|(idx, (descriptor, value))| (idx, descriptor, value))
    }
}

/// Everything the flattener can encounter while walking a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// a value that could not be inspected
    Invalid(String),
    Scalar(Scalar),
    Record(Record),
    /// `None` is an absent (null) sequence
    Sequence(Option<Vec<Value>>),
    Map(Vec<(Value, Value)>),
    /// pointer, optional or interface-like wrapper; `None` points to nothing
    Indirection(Option<Box<Value>>),
    Unsupported(Kind),
}

impl Value {
    pub fn str(value: impl Into<String>) -> Self {
        value.into().pipe(Scalar::Str).pipe(Value::Scalar)
    }

    pub fn some(value: Value) -> Self {
        Value::Indirection(Some(Box::new(value)))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Invalid(_) => "invalid",
            Value::Scalar(_) => "scalar",
            Value::Record(_) => "record",
            Value::Sequence(_) => "sequence",
            Value::Map(_) => "map",
            Value::Indirection(_) => "indirection",
            Value::Unsupported(_) => "unsupported",
        }
    }

    /// Follows indirections until a concrete value is reached.
    /// Returns `None` when the chain ends in nothing.
    pub fn resolve(&self) -> Option<&Value> {
        let mut current = self;
        loop {
            match current {
                Value::Indirection(Some(inner)) => current = inner,
                Value::Indirection(None) => return None,
                other => return Some(other),
            }
        }
    }
}

macro_rules! scalar_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Scalar(Scalar::$variant(value.into()))
                }
            }
        )+
    };
}

scalar_from!(Bool: bool);
scalar_from!(Int: i8, i16, i32, i64, i128);
scalar_from!(Uint: u8, u16, u32, u64, u128);
scalar_from!(F32: f32);
scalar_from!(F64: f64);
scalar_from!(Char: char);
scalar_from!(Str: String, &str);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Value::Scalar(Scalar::Int(value as i128))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Scalar(Scalar::Uint(value as u128))
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_follows_chain() {
        let value = Value::some(Value::some(Value::from(3u8)));
        assert_eq!(value.resolve(), Some(&Value::from(3u8)));
        assert_eq!(Value::some(Value::Indirection(None)).resolve(), None);
    }

    #[test]
    fn test_record_checks_field_count() {
        let ty = RecordType::new("Pair").field("a").field("b").shared();
        let err = Record::new(ty.clone(), vec![Value::from(1i32)]).unwrap_err();
        assert_eq!(err.expected, 2);
        assert_eq!(err.found, 1);
        assert!(matches!(Record::value(ty, vec![]), Value::Invalid(_)));
    }
}
