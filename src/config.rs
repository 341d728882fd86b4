//! Project configuration: a layered loader over `conf/<env>` folders and the
//! parameter mapping it resolves to.
pub mod loader;
pub mod parameters;

pub use loader::{ConfigLoader, PARAMETER_PATTERNS};
pub use parameters::Parameters;
