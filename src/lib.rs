// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # propscope
//!
//! Reflection-driven property access for game editors and engine tooling. `propscope`
//! indexes the types a host exposes, turns editor-level type paths into concrete field
//! kinds, and reads and writes arbitrarily nested properties of live objects through
//! dotted, bracketed path strings, converting every value to and from JSON.
//!
//! ## Features
//!
//! - **Type catalog** - Snapshot-isolated, queryable index of every reflected type with
//!   TTL-based refresh and explicit invalidation
//! - **Field type resolution** - Canonical type paths plus container descriptors resolved to
//!   a single [`reflection::FieldKind`] discriminant, with memoized registry lookups
//! - **Property paths** - `Party[0].Stats.Health`, `Loadout["main.hand"]` and friends,
//!   resolved segment by segment with precise error codes
//! - **JSON marshalling** - A closed allow-list of field kinds; anything else fails loudly
//! - **Command facade** - `{ "action": ... }` requests answered with a uniform
//!   `{ success, data | error }` envelope
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use propscope::prelude::*;
//! use serde_json::json;
//!
//! let registry = Arc::new(ReflectionRegistry::new());
//! registry.register(ReflectedType::class("/Script/Engine", "Actor"));
//! registry.register(
//!     ReflectedType::structure("/Script/Game", "Stats")
//!         .with_field("Health", FieldKind::Float)
//!         .with_field("Mana", FieldKind::Float),
//! );
//!
//! let mut world = World::new(registry.clone());
//! world.create_owner("/Game/BP_Hero", "BP_Hero", "/Script/Engine.Actor")?;
//!
//! let service = CommandService::new(registry, ServiceConfig::default());
//! service.execute(&mut world, &json!({
//!     "action": "create",
//!     "owner_name": "BP_Hero",
//!     "variable_config": { "variable_name": "Stats", "type_path": "/Script/Game.Stats" },
//! }));
//! service.execute(&mut world, &json!({
//!     "action": "set_property", "owner_name": "BP_Hero", "path": "Stats.Health", "value": 42.5,
//! }));
//!
//! let stats = service.execute(&mut world, &json!({
//!     "action": "get_property", "owner_name": "BP_Hero", "path": "Stats",
//! }));
//! assert_eq!(stats["data"]["value"], json!({ "Health": 42.5, "Mana": 0.0 }));
//! # Ok::<(), propscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`reflection`] - Host type registry, field kinds, slot storage and object identities
//! - [`catalog`] - Type catalog over the registry
//! - [`fieldtype`] - Type path to [`reflection::FieldKind`] resolution
//! - [`property`] - Path grammar, resolution and JSON marshalling
//! - [`host`] - In-process host: owners, variables, live instances and compilation
//! - [`commands`] - JSON command facade
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result`]. Each [`Error`] variant carries a stable
//! SCREAMING_SNAKE_CASE code available through [`Error::code`]; the command facade wraps
//! these into its own failure codes and reports the original one as `details.cause`.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and leaves the choice of logger to the
//! application. Catalog rebuilds and compiles are logged at `info`, downgraded compile
//! failures at `warn`, cache misses and command dispatch at `debug`.
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! cargo +nightly fuzz run property_path --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use propscope::prelude::*;
///
/// let path = PropertyPath::parse("Party[0].Stats.Health")?;
/// assert_eq!(path.segments().len(), 3);
/// # Ok::<(), propscope::Error>(())
/// ```
pub mod prelude;

/// Configuration of the type catalog and the command facade
pub mod config;

/// Reflection model of the host: types, fields, slot data and objects
pub mod reflection;

/// Cached, snapshot-isolated index of reflected types
///
/// # Key Types
///
/// - [`catalog::TypeCatalog`] - The cache itself
/// - [`catalog::TypeDescriptor`] - One cached entry
/// - [`catalog::TypeQuery`] - Filters and pagination
pub mod catalog;

/// Resolution of editor-level type paths to field kinds
pub mod fieldtype;

/// Property paths, slot resolution and JSON marshalling
pub mod property;

/// In-process host: owners, variables, live instances and compilation
pub mod host;

/// JSON command facade
pub mod commands;

/// `propscope` Error type
///
/// The main error type for all operations in this crate. Provides detailed error information
/// and a stable error code per variant.
///
/// # Example
///
/// ```rust
/// use propscope::{property::PropertyPath, Error};
///
/// match PropertyPath::parse("   ") {
///     Err(Error::PathEmpty) => println!("nothing to resolve"),
///     Err(e) => println!("Error: {}", e),
///     Ok(_) => unreachable!(),
/// }
/// ```
pub use error::Error;

/// `propscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`]. This is used consistently throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration types, see [`config`]
pub use config::{CatalogConfig, ServiceConfig};
