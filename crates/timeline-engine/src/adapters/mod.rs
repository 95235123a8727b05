pub mod events;

pub use events::{NoopEventsPort, TracingEventsPort};
