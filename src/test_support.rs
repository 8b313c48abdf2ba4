//! `PERFOPT_TESTING_MODE` is a process-wide env var set/unset by tests in
//! `optimizer::nested`, `optimizer::test` and `execute::test`. Cargo's unit
//! test binary runs these concurrently on separate threads, so every test
//! that touches the var must hold this guard for the duration of its
//! `set_var`/`remove_var`/`optimize`/`execute` call.

use std::sync::Mutex;

pub(crate) static TESTING_MODE_GUARD: Mutex<()> = Mutex::new(());
