//! The capability a message needs to be flattened: describe yourself as a [`Value`].
//!
//! Records implement it by hand against a shared [`RecordType`](crate::value::RecordType):
//!
//! ```
//! use {
//!     flat_nodes::{
//!         flatten,
//!         introspect::Introspect,
//!         value::{Record, RecordType, Value},
//!     },
//!     std::sync::{Arc, LazyLock},
//! };
//!
//! struct Reading {
//!     sensor: String,
//!     celsius: f32,
//! }
//!
//! static READING: LazyLock<Arc<RecordType>> = LazyLock::new(|| {
//!     RecordType::new("Reading")
//!         .tagged_field("Sensor", "bytes,1,opt,name=sensor,proto3")
//!         .field("Celsius")
//!         .shared()
//! });
//!
//! impl Introspect for Reading {
//!     fn introspect(&self) -> Value {
//!         Record::value(READING.clone(), vec![self.sensor.introspect(), self.celsius.introspect()])
//!     }
//! }
//!
//! let reading = Reading { sensor: "porch".into(), celsius: 22.5 };
//! let nodes = flatten(&reading).unwrap();
//! assert_eq!(nodes[0].to_string(), "sensor=porch");
//! assert_eq!(nodes[1].to_string(), "Celsius=22.5");
//! ```

use {
    crate::value::{Kind, Value},
    std::{
        collections::{BTreeMap, HashMap},
        ptr::NonNull,
        rc::Rc,
        sync::{Arc, mpsc},
    },
    tap::Pipe,
};

/// References and smart pointers are transparent; `Option` is the indirection.
pub trait Introspect {
    fn introspect(&self) -> Value;
}

impl Introspect for Value {
    fn introspect(&self) -> Value {
        self.clone()
    }
}

macro_rules! introspect_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Introspect for $ty {
                fn introspect(&self) -> Value {
                    Value::from(*self)
                }
            }
        )+
    };
}

introspect_scalar!(bool, char, f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Introspect for str {
    fn introspect(&self) -> Value {
        Value::str(self)
    }
}

impl Introspect for String {
    fn introspect(&self) -> Value {
        Value::str(self.as_str())
    }
}

impl<T: Introspect + ?Sized> Introspect for &T {
    fn introspect(&self) -> Value {
        (**self).introspect()
    }
}

impl<T: Introspect + ?Sized> Introspect for Box<T> {
    fn introspect(&self) -> Value {
        (**self).introspect()
    }
}

impl<T: Introspect + ?Sized> Introspect for Rc<T> {
    fn introspect(&self) -> Value {
        (**self).introspect()
    }
}

impl<T: Introspect + ?Sized> Introspect for Arc<T> {
    fn introspect(&self) -> Value {
        (**self).introspect()
    }
}

impl<T: Introspect> Introspect for Option<T> {
    fn introspect(&self) -> Value {
        self.as_ref()
            .map(|inner| Value::some(inner.introspect()))
            .unwrap_or(Value::Indirection(None))
    }
}

impl<T: Introspect> Introspect for [T] {
    fn introspect(&self) -> Value {
        Value::Sequence(Some(self.iter().map(Introspect::introspect).collect()))
    }
}

impl<T: Introspect, const N: usize> Introspect for [T; N] {
    fn introspect(&self) -> Value {
        self.as_slice().introspect()
    }
}

impl<T: Introspect> Introspect for Vec<T> {
    fn introspect(&self) -> Value {
        self.as_slice().introspect()
    }
}

fn map_value<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> Value
where
    K: Introspect + 'a,
    V: Introspect + 'a,
{
    entries
        .map(|(k, v)| (k.introspect(), v.introspect()))
        .collect::<Vec<_>>()
        .pipe(Value::Map)
}

impl<K: Introspect, V: Introspect, S> Introspect for HashMap<K, V, S> {
    fn introspect(&self) -> Value {
        map_value(self.iter())
    }
}

impl<K: Introspect, V: Introspect> Introspect for BTreeMap<K, V> {
    fn introspect(&self) -> Value {
        map_value(self.iter())
    }
}

impl<T> Introspect for *const T {
    fn introspect(&self) -> Value {
        Value::Unsupported(Kind::RawPointer)
    }
}

impl<T> Introspect for *mut T {
    fn introspect(&self) -> Value {
        Value::Unsupported(Kind::RawPointer)
    }
}

impl<T> Introspect for NonNull<T> {
    fn introspect(&self) -> Value {
        Value::Unsupported(Kind::RawPointer)
    }
}

impl<T> Introspect for mpsc::Sender<T> {
    fn introspect(&self) -> Value {
        Value::Unsupported(Kind::Channel)
    }
}

impl<T> Introspect for mpsc::SyncSender<T> {
    fn introspect(&self) -> Value {
        Value::Unsupported(Kind::Channel)
    }
}

impl<T> Introspect for mpsc::Receiver<T> {
    fn introspect(&self) -> Value {
        Value::Unsupported(Kind::Channel)
    }
}

impl<R> Introspect for fn() -> R {
    fn introspect(&self) -> Value {
        Value::Unsupported(Kind::Function)
    }
}

impl<A, R> Introspect for fn(A) -> R {
    fn introspect(&self) -> Value {
        Value::Unsupported(Kind::Function)
    }
}

impl<A, B, R> Introspect for fn(A, B) -> R {
    fn introspect(&self) -> Value {
        Value::Unsupported(Kind::Function)
    }
}
