//! In-process host model.
//!
//! The command layer needs somewhere to find owners, live objects and a place to run the
//! post-mutation compile step. [`World`] provides all three on top of the
//! [`crate::reflection`] primitives:
//!
//! - [`Owner`]: a user asset with [`VariableDefinition`]s and a generated class
//! - [`World::compile`]: regenerates the class, migrates live data, applies default values
//! - [`World::property_scope`]: property access to an owner's default object
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use propscope::{
//!     host::{VariableDefinition, World},
//!     reflection::{FieldKind, ReflectedType, ReflectionRegistry},
//! };
//! use serde_json::json;
//!
//! let registry = ReflectionRegistry::new();
//! registry.register(ReflectedType::class("/Script/Engine", "Actor"));
//!
//! let mut world = World::new(Arc::new(registry));
//! world.create_owner("/Game/BP_Door", "BP_Door", "/Script/Engine.Actor")?;
//!
//! let mut open = VariableDefinition::new("IsOpen", "/Script/Core.Bool", FieldKind::Bool);
//! open.default_value = "true".into();
//! world.owner_mut("BP_Door").unwrap().add_variable(open)?;
//! world.compile("BP_Door").unwrap();
//!
//! assert_eq!(world.property_scope("BP_Door")?.get_property("IsOpen")?, json!(true));
//! # Ok::<(), propscope::Error>(())
//! ```

mod owner;
mod world;

pub use owner::{Owner, VariableDefinition, RESERVED_NAME_CHARS};
pub use world::{CompileHook, World};
