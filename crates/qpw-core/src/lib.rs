// qpw-core: lookup aggregation, criteria model, and connection facade over qpw-api.

pub mod config;
pub mod connection;
pub mod error;
pub mod lookup;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ConnectionConfig;
pub use connection::Connection;
pub use error::CoreError;
pub use lookup::{
    LOOKUP_SPECS, LookupAggregator, LookupFailure, LookupKind, LookupLoad, LookupSet, LookupSpec,
};
pub use model::{
    Advanced, Criteria, DateRange, Direction, DurationBounds, LookupOption, MediaType,
};

// Session and login types consumers need without depending on qpw-api directly.
pub use qpw_api::{Identity, LoginOutcome, MemoryStorage, RedirectLocation, SessionStorage};
