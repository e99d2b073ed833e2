//! Host reflection model.
//!
//! This module is the in-process stand-in for the host application's reflection system: the
//! live type registry, the field kind discriminant, slot storage and object identities. The
//! catalog, the field type resolver and the property resolver are all written against these
//! types and never against a concrete host.
//!
//! # Key Components
//!
//! - [`ReflectionRegistry`]: Live registry of classes, structs, enums and interfaces
//! - [`ReflectedType`]: One registered type with its declared fields or enum values
//! - [`FieldKind`]: Tagged-union kind of a field, computed once per field
//! - [`Data`]: Owned runtime value of a slot
//! - [`ObjectDirectory`]: Textual identities of objects, loaded or not
//! - [`Instance`]: Live field storage of one object

mod data;
mod kind;
mod objects;
mod registry;
mod types;

pub use data::{Data, StructData};
pub use kind::FieldKind;
pub use objects::{Instance, ObjectDirectory, ObjectEntry, ObjectEntryRc, ObjectId};
pub use registry::{ReflectionRegistry, TypeToken, RECURSION_LIMIT};
pub use types::{
    EnumEntry, FieldDescriptor, FieldFlags, ReflectedType, ReflectedTypeRc, TypeFlags, TypeKind,
};
