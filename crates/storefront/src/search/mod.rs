//! Product search support.
//!
//! Search itself is performed by the backend (`GET /products/search`). This
//! module holds the per-session debouncer that collapses bursts of
//! keystrokes into a single backend request.

mod debounce;

pub use debounce::{DEFAULT_SEARCH_DEBOUNCE, SearchDebouncer};
