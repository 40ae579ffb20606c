pub mod flatten;
pub mod flattened_csv;
pub mod introspect;
pub mod node;
pub mod reflect;
pub mod value;

pub use {
    flatten::{field_name, flatten},
    introspect::Introspect,
    node::Node,
    reflect::Reflected,
};

/// Serializes as the list of nodes the wrapped message flattens into.
#[derive(Debug)]
pub struct Flattened<T>(pub T);

/// [`flatten`] for any [`serde::Serialize`] message.
pub fn flatten_serialize<T>(message: &T) -> Result<Vec<Node>, flatten::Error>
where
    T: serde::Serialize + ?Sized,
{
    flatten(&Reflected(message))
}

mod flattened;
