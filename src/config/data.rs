/// A data source `D` for a batch workload.
///
/// Mirrors the source system's distinction between a finite, indexable
/// collection and a lazy, single-pass sequence: the sampler can draw a
/// sample from a `Finite` source without consuming it, but must buffer and
/// splice for a `Lazy` one (see [`crate::sampler`]).
pub enum Data<T> {
    /// A finite, indexable collection. Sampling never consumes it.
    Finite(Vec<T>),

    /// A lazy, single-pass sequence. Sampling buffers the first `k` items
    /// and hands back an iterator that replays them before delegating to
    /// whatever remains of the original.
    Lazy(Box<dyn Iterator<Item = T>>),
}

impl<T> Data<T> {
    /// Known length, if this source is finite.
    pub fn len(&self) -> Option<usize> {
        match self {
            Data::Finite(v) => Some(v.len()),
            Data::Lazy(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Data::Lazy(_))
    }
}

impl<T> From<Vec<T>> for Data<T> {
    fn from(v: Vec<T>) -> Self {
        Data::Finite(v)
    }
}

impl<T: 'static> Data<T> {
    /// Wraps any single-pass iterator as a lazy data source.
    pub fn lazy<I>(iter: I) -> Self
    where
        I: Iterator<Item = T> + 'static,
    {
        Data::Lazy(Box::new(iter))
    }
}
