use {
    crate::{flatten::flatten, introspect::Introspect, node::Node},
    std::{io::Write, marker::PhantomData},
    tap::Pipe,
    tracing::{debug, instrument},
};

pub struct FlattenedCsvWriter<W: Write, T: Introspect + ?Sized> {
    writer: csv::Writer<W>,
    headers: Option<Vec<String>>,
    count: usize,
    _marker: PhantomData<fn(&T)>,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Could not convert into inner error:\n{0}")]
    IntoInner(Box<str>),
    #[error("Flattening record #{idx}")]
    Flattening {
        idx: usize,
        #[source]
        source: crate::flatten::Error,
    },
    #[error("Could not write headers")]
    WritingHeaders(#[source] csv::Error),
    #[error("Writing record #{idx}")]
    WritingRecord {
        idx: usize,
        #[source]
        source: csv::Error,
    },
    #[error("Could not flush the underlying writer")]
    Flushing(#[source] std::io::Error),
    #[error("Record #{idx} does not match the headers line:\nexpected: {expected:?}\nfound: {found:?}")]
    HeaderMismatch {
        idx: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

type Result<T> = std::result::Result<T, self::Error>;

#[extension_traits::extension(pub trait CsvWriterFlattenExt)]
impl<W: Write> csv::Writer<W> {
    fn flattening<T: Introspect + ?Sized>(self) -> FlattenedCsvWriter<W, T> {
        FlattenedCsvWriter::new(self)
    }
}

impl<W, T> FlattenedCsvWriter<W, T>
where
    W: Write,
    T: Introspect + ?Sized,
{
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| self::Error::IntoInner(format!("{e:#?}").pipe(Box::from)))
    }

    pub fn new(writer: csv::Writer<W>) -> Self {
        Self {
            writer,
            count: 0usize,
            headers: None,
            _marker: PhantomData,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// Flattens `item` and writes it as one row. The first item fixes the header line.
    #[instrument(skip_all, fields(idx = self.count))]
    pub fn serialize(&mut self, item: &T) -> Result<()> {
        let idx = self.count;
        let (names, values): (Vec<String>, Vec<String>) = flatten(item)
            .map_err(|source| self::Error::Flattening { idx, source })?
            .into_iter()
            .map(Node::into_parts)
            .unzip();
        if self.headers.is_none() {
            debug!(headers = names.len(), "writing headers");
            self.writer
                .write_record(&names)
                .map_err(self::Error::WritingHeaders)?;
            self.headers = Some(names.clone());
        }
        self.headers
            .as_ref()
            .filter(|headers| **headers == names)
            .ok_or_else(|| self::Error::HeaderMismatch {
                idx,
                expected: self.headers.clone().unwrap_or_default(),
                found: names,
            })?;
        self.writer
            .write_record(&values)
            .map_err(|source| self::Error::WritingRecord { idx, source })?;
        self.count += 1;
        Ok(())
    }
}

/// Flattens every item into one CSV row, returning the number of rows written.
pub fn write_flattened_csv<'a, W, T>(writer: &mut W, items: impl IntoIterator<Item = &'a T>) -> Result<usize>
where
    W: Write,
    T: Introspect + ?Sized + 'a,
{
    FlattenedCsvWriter::<_, T>::new(csv::WriterBuilder::new().from_writer(writer)).pipe_ref_mut(|w| {
        items
            .into_iter()
            .try_for_each(|i| w.serialize(i))
            .and_then(|()| w.flush().map_err(self::Error::Flushing))
            .map(|()| w.count)
    })
}
