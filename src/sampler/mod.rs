//! Safe sampling: draw a bounded prefix from `D` without destroying it for
//! the caller, and check whether sampled items can cross a process boundary.

pub(crate) mod pickle;

pub use pickle::PickleStatus;

use crate::config::Data;

/// Result of [`sample`]: the drawn items, the reconstructed data source for
/// the caller to use downstream, whether `D` was lazy, and item
/// picklability.
pub struct SamplerOutput<T> {
    pub items: Vec<T>,
    pub reconstructed: Data<T>,
    pub is_lazy: bool,
    pub items_picklable: PickleStatus,
}

/// Draws up to `k` items from `data`, preserving it for the caller.
///
/// - `Finite` sources are sliced, never consumed: `reconstructed` is the
///   original data, unchanged.
/// - `Lazy` sources are drawn into a buffer; `reconstructed` replays the
///   buffered prefix followed by whatever remains of the original
///   iterator, so the caller sees every item exactly once, in order.
///
/// Never panics: a picklability failure is recorded in the output rather
/// than propagated.
pub fn sample<T>(data: Data<T>, k: usize) -> SamplerOutput<T>
where
    T: serde::Serialize + Clone + 'static,
{
    match data {
        Data::Finite(items) => {
            let k = k.min(items.len());
            let head: Vec<T> = items[..k].to_vec();
            let items_picklable = pickle::check_items(&head);
            SamplerOutput {
                items: head,
                reconstructed: Data::Finite(items),
                is_lazy: false,
                items_picklable,
            }
        }
        Data::Lazy(mut iter) => {
            let mut head = Vec::with_capacity(k);
            for _ in 0..k {
                match iter.next() {
                    Some(item) => head.push(item),
                    None => break,
                }
            }
            let items_picklable = pickle::check_items(&head);
            let replay = head.clone().into_iter().chain(iter);
            SamplerOutput {
                items: head,
                reconstructed: Data::lazy(replay),
                is_lazy: true,
                items_picklable,
            }
        }
    }
}
