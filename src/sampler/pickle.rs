//! Picklability checks: whether a value can cross a process boundary.
//!
//! Rust has no universal object-serialization mechanism; this crate
//! substitutes `bincode` as the concrete wire format and treats
//! "picklable" as "serializes with `bincode`".

use serde::Serialize;

/// Picklability of the sampled items, with enough detail to explain a
/// failure in `Decision::warnings`.
#[derive(Clone, Debug, PartialEq)]
pub enum PickleStatus {
    Ok,
    Failed { index: usize, error: String },
    /// No items were sampled; picklability is vacuously unknown.
    NoItems,
}

pub fn check_items<T: Serialize>(items: &[T]) -> PickleStatus {
    if items.is_empty() {
        return PickleStatus::NoItems;
    }
    for (index, item) in items.iter().enumerate() {
        if let Err(error) = bincode::serialize(item) {
            return PickleStatus::Failed {
                index,
                error: error.to_string(),
            };
        }
    }
    PickleStatus::Ok
}

/// Checks whether a single value serializes, used by the dry-run to
/// establish `F_is_picklable` from the function's *result* (the only
/// observable proxy for "is `F` picklable" once `F` has already been
/// invoked).
pub fn check_value<T: Serialize>(value: &T) -> PickleStatus {
    match bincode::serialize(value) {
        Ok(_) => PickleStatus::Ok,
        Err(error) => PickleStatus::Failed {
            index: 0,
            error: error.to_string(),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_slice_is_no_items() {
        let items: Vec<u32> = vec![];
        assert_eq!(check_items(&items), PickleStatus::NoItems);
    }

    #[test]
    fn serializable_items_are_ok() {
        assert_eq!(check_items(&[1u32, 2, 3]), PickleStatus::Ok);
    }

    #[test]
    fn check_value_reports_ok_for_plain_data() {
        assert_eq!(check_value(&42u32), PickleStatus::Ok);
    }
}
