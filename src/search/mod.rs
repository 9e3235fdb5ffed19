pub mod app;
pub mod coordinator;
pub mod debounce;

pub use app::{AppSettings, SearchApp};
pub use coordinator::{MovieSearch, SearchState, FETCH_ERROR_MESSAGE};
pub use debounce::Debouncer;
