// ── Domain model ──

pub mod criteria;
pub mod option;

pub use criteria::{Advanced, Criteria, DateRange, Direction, DurationBounds, MediaType};
pub use option::LookupOption;
