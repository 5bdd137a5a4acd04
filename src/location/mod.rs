mod provider;
mod source;

pub use provider::{DEFAULT_LOCATION_TIMEOUT, LocationProvider};
pub use source::{FixedPositionSource, LastKnownPosition, LocationError, PositionSource};

#[cfg(test)]
pub(crate) use provider::tests::{Behaviour, ScriptedSource};
