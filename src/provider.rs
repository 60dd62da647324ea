//! Provider-facing descriptors (data), the static catalog, and handshake strategies
//! (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering the handshake
//! kind, the configuration keys a provider needs, requested scopes, endpoints, and the
//! per-provider quirks (entry/callback verbs, bridging route, request-context passing).
//! `catalog` is the read-only table of known descriptors and `strategy` defines
//! [`HandshakeStrategy`], the seam behind which provider protocols live.

pub mod catalog;
pub mod descriptor;
pub mod strategy;

pub use catalog::*;
pub use descriptor::*;
pub use strategy::*;
