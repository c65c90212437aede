mod clock;
mod counter_store;
mod identity;

pub use clock::{Clock, SystemClock};
pub use counter_store::{CounterReading, CounterStore};
pub use identity::IdentityResolver;
