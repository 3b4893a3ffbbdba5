//! Grubsmith parameter catalog
//!
//! Static registry describing every recognized `/etc/default/grub` setting:
//! value type, allowed values, bounds, default, and help text. The catalog
//! is wired at compile time and immutable after load. This crate also owns
//! the [`SettingsSnapshot`] the session holds in memory, and the optional
//! discovery cache that learns which parameters the running system's GRUB
//! documentation mentions.

pub mod catalog;
pub mod discovery;
pub mod error;
pub mod snapshot;
pub mod types;

pub use catalog::ParamCatalog;
pub use discovery::{DiscoveryCache, DiscoveryState, ParamDiscovery};
pub use error::{CatalogError, CatalogResult};
pub use snapshot::{is_quoted, is_truthy, unquote, SettingsSnapshot};
pub use types::{AllowedValue, Category, IntBounds, ParameterSpec, ValueType};
