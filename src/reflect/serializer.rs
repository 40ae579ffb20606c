use {
    crate::value::{FieldDescriptor, Record, RecordType, Scalar, Value},
    serde::{Serialize, Serializer, ser},
    std::{cell::RefCell, collections::HashMap, fmt, sync::Arc},
    tap::Pipe,
};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Error(Box<str>);

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string().pipe(Box::from))
    }
}

type Result<T> = std::result::Result<T, self::Error>;

type TypeKey = (&'static str, Vec<(&'static str, bool)>);

/// Record types keyed by serde's static struct name and field list, so every
/// element of a `Vec<Struct>` points at the same [`RecordType`].
#[derive(Debug, Default)]
struct RecordTypes(HashMap<TypeKey, Arc<RecordType>>);

impl RecordTypes {
    fn intern(&mut self, name: &'static str, fields: Vec<(&'static str, bool)>) -> Arc<RecordType> {
        self.0
            .entry((name, fields))
            .or_insert_with_key(|(name, fields)| {
                fields
                    .iter()
                    .map(|(ident, exported)| {
                        FieldDescriptor::new(*ident).pipe(|field| if *exported { field } else { field.private() })
                    })
                    .fold(RecordType::new(*name), RecordType::with)
                    .shared()
            })
            .clone()
    }
}

thread_local! {
    static RECORD_TYPES: RefCell<RecordTypes> = Default::default();
}

fn record(name: &'static str, fields: Vec<(&'static str, bool)>, values: Vec<Value>) -> Value {
    RECORD_TYPES
        .with_borrow_mut(|types| types.intern(name, fields))
        .pipe(|ty| Record::value(ty, values))
}

/// Enum variants carrying data are wrapped like a one-of: an indirection to a
/// record whose only field is named after the variant.
fn variant(name: &'static str, variant: &'static str, value: Value) -> Value {
    record(name, vec![(variant, true)], vec![value]).pipe(Value::some)
}

pub(super) struct ValueSerializer;

impl Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SerializeSequence;
    type SerializeTuple = SerializeSequence;
    type SerializeTupleStruct = SerializeSequence;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeRecord;
    type SerializeStructVariant = SerializeRecord;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(v.into())
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::str(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        v.iter().copied().map(Value::from).collect::<Vec<_>>().pipe(Some).pipe(Value::Sequence).pipe(Ok)
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Indirection(None))
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self).map(Value::some)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(record("()", vec![], vec![]))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        Ok(record(name, vec![], vec![]))
    }

    fn serialize_unit_variant(self, _name: &'static str, _variant_index: u32, variant: &'static str) -> Result<Value> {
        Ok(Value::str(variant))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self).map(|value| self::variant(name, variant, value))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeSequence> {
        Ok(SerializeSequence(Vec::with_capacity(len.unwrap_or_default())))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeSequence> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeSequence> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            name,
            variant,
            items: SerializeSequence(Vec::with_capacity(len)),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            entries: Vec::with_capacity(len.unwrap_or_default()),
            key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<SerializeRecord> {
        Ok(SerializeRecord::new(name, len, false))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeRecord> {
        Ok(SerializeRecord::new(variant, len, true))
    }
}

pub(super) struct SerializeSequence(Vec<Value>);

impl ser::SerializeSeq for SerializeSequence {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(ValueSerializer).map(|value| self.0.push(value))
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Sequence(Some(self.0)))
    }
}

impl ser::SerializeTuple for SerializeSequence {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeSequence {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

pub(super) struct SerializeTupleVariant {
    name: &'static str,
    variant: &'static str,
    items: SerializeSequence,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(&mut self.items, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self.items).map(|items| variant(self.name, self.variant, items))
    }
}

pub(super) struct SerializeMap {
    entries: Vec<(Value, Value)>,
    key: Option<Value>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        key.serialize(ValueSerializer).map(|key| self.key = Some(key))
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| <Error as ser::Error>::custom("map value serialized before its key"))?;
        value.serialize(ValueSerializer).map(|value| self.entries.push((key, value)))
    }

    /// Maps keyed by text (including structs with `#[serde(flatten)]` fields)
    /// are records; any other key type stays a map.
    fn end(self) -> Result<Value> {
        let keyed_by_text = !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|(key, _)| matches!(key, Value::Scalar(Scalar::Str(_))));
        if !keyed_by_text {
            return Ok(Value::Map(self.entries));
        }
        self.entries
            .into_iter()
            .filter_map(|(key, value)| match key {
                Value::Scalar(Scalar::Str(key)) => Some((key, value)),
                _ => None,
            })
            .pipe(super::keyed_record)
            .pipe(Ok)
    }
}

pub(super) struct SerializeRecord {
    name: &'static str,
    fields: Vec<(&'static str, bool)>,
    values: Vec<Value>,
    is_variant: bool,
}

impl SerializeRecord {
    fn new(name: &'static str, len: usize, is_variant: bool) -> Self {
        Self {
            name,
            fields: Vec::with_capacity(len),
            values: Vec::with_capacity(len),
            is_variant,
        }
    }

    fn push<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(ValueSerializer).map(|value| {
            self.fields.push((key, true));
            self.values.push(value);
        })
    }

    /// Skipped fields stay in the record type but are not exported.
    fn skip(&mut self, key: &'static str) {
        self.fields.push((key, false));
        self.values.push(Value::Indirection(None));
    }

    fn finish(self) -> Value {
        let is_variant = self.is_variant;
        record(self.name, self.fields, self.values).pipe(|record| if is_variant { Value::some(record) } else { record })
    }
}

impl ser::SerializeStruct for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<()> {
        self.skip(key);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<()> {
        self.skip(key);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}
