//! Auto-refreshing credentials for assumed roles and custom credential sources, served through
//! a singleflight cache that refreshes ahead of expiry.
//!
//! The crate assembles [`config::ServiceConfig`] copies whose credential source is a
//! [`cache::CredentialsCache`]. Use [`config::assume_role_config`] to delegate to an IAM role
//! through an injected [`identity::IdentityService`] client, or
//! [`config::custom_function_config`] to cache credentials produced by any async function.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod obs;
pub mod provider;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{BoxError, Error, Result};
}

pub use url;
#[cfg(test)] use color_eyre as _;
