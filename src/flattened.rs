use {
    crate::{Flattened, flatten::flatten, introspect::Introspect},
    serde::Serialize,
    tracing::instrument,
};

impl<T> Serialize for Flattened<T>
where
    T: Introspect,
{
    #[instrument(skip_all)]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        flatten(&self.0)
            .map_err(serde::ser::Error::custom)
            .and_then(|nodes| serializer.collect_seq(&nodes))
    }
}
