//! One HTTP surface for signing in through many identity providers. Redirect-style OAuth
//! handshakes and direct token exchanges both end in a single identity-service call and a
//! provider-agnostic response.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod completion;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handshake;
pub mod http;
pub mod identity;
pub mod obs;
pub mod provider;
pub mod routes;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)]
use {color_eyre as _, http_body_util as _, httpmock as _, parking_lot as _, tower as _};
