//! Primitives shared by every restaurant service: identifiers, versions,
//! the error taxonomy, the clock and the per-request context.

pub mod clock;
pub mod context;
pub mod error;
pub mod id;
pub mod serde_secs;
pub mod version;
pub mod wire;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{Context, Interrupted};
pub use error::{Classify, ErrorKind, ParseEnumError, codes};
pub use id::*;
pub use version::Version;
