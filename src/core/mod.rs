//! Shared building blocks: error taxonomy, the listener gate flag and the
//! identifier-keyed registry used for views and modes.

pub mod atomic_flag;
pub mod error;
pub mod registry;

pub use atomic_flag::AtomicFlag;
pub use error::{CoreError, Result, MISSING_PARAMETER, UNIMPLEMENTED_METHOD};
pub use registry::{Disposable, IdentifierRegistry};
