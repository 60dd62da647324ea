//! Auth-domain identifiers, scope lists, and verified profiles.

pub mod id;
pub mod profile;
pub mod scope;

pub use id::*;
pub use profile::*;
pub use scope::*;
