pub mod fingerprint;
pub mod paths;
pub mod protocol;

pub use fingerprint::{fingerprint, Fingerprint};
pub use paths::{PathError, ScriptRoot};
