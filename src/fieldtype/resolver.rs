use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::{
    fieldtype::{ContainerKind, FieldTypeSpec, PrimitiveKind, ReferenceMode},
    reflection::{FieldKind, ReflectedTypeRc, ReflectionRegistry, TypeKind},
    Error::{TypeNotFound, TypePathInvalid},
    Result,
};

/// Split a canonical type path into its module and local name.
///
/// A canonical path carries exactly one `.` separating two non-empty parts, e.g.
/// `/Script/Game.Stats`.
///
/// # Errors
/// Returns [`crate::Error::TypePathInvalid`] for any other shape.
pub fn split_type_path(path: &str) -> Result<(&str, &str)> {
    match path.split_once('.') {
        Some((module, name)) if !module.is_empty() && !name.is_empty() && !name.contains('.') => {
            Ok((module, name))
        }
        _ => Err(TypePathInvalid(path.to_string())),
    }
}

/// Sizes of the memo caches of a [`FieldTypeResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResolverCacheStats {
    /// Cached class and interface handles
    pub classes: usize,
    /// Cached struct handles
    pub structs: usize,
    /// Cached enum handles
    pub enums: usize,
}

/// Resolves type paths plus container descriptors into [`FieldKind`]s.
///
/// Handle lookups are memoized per kind. Only successful lookups are cached, so a type that
/// is registered after a failed lookup resolves on the next call. Cached handles are never
/// evicted; type identities are stable once the host has loaded them.
pub struct FieldTypeResolver {
    registry: Arc<ReflectionRegistry>,
    classes: DashMap<String, ReflectedTypeRc>,
    structs: DashMap<String, ReflectedTypeRc>,
    enums: DashMap<String, ReflectedTypeRc>,
}

impl FieldTypeResolver {
    /// Create a resolver over `registry`
    pub fn new(registry: Arc<ReflectionRegistry>) -> Self {
        FieldTypeResolver {
            registry,
            classes: DashMap::new(),
            structs: DashMap::new(),
            enums: DashMap::new(),
        }
    }

    /// Resolve a class or interface handle by canonical path
    pub fn resolve_class(&self, path: &str) -> Option<ReflectedTypeRc> {
        self.cached(&self.classes, path, &[TypeKind::Class, TypeKind::Interface])
    }

    /// Resolve a struct handle by canonical path
    pub fn resolve_struct(&self, path: &str) -> Option<ReflectedTypeRc> {
        self.cached(&self.structs, path, &[TypeKind::Struct])
    }

    /// Resolve an enum handle by canonical path
    pub fn resolve_enum(&self, path: &str) -> Option<ReflectedTypeRc> {
        self.cached(&self.enums, path, &[TypeKind::Enum])
    }

    fn cached(
        &self,
        cache: &DashMap<String, ReflectedTypeRc>,
        path: &str,
        kinds: &[TypeKind],
    ) -> Option<ReflectedTypeRc> {
        if let Some(hit) = cache.get(path) {
            return Some(hit.clone());
        }

        let resolved = self.registry.get_kind(path, kinds)?;
        log::debug!("resolver cache miss for {path}, caching {}", resolved.kind);
        cache.insert(path.to_string(), resolved.clone());
        Some(resolved)
    }

    /// Resolve the field kind described by `spec`.
    ///
    /// Primitive paths under [`crate::fieldtype::PRIMITIVE_MODULE`] map directly. Any other
    /// path is tried as struct, then enum, then class or interface; the first match wins.
    /// Map keys and values are resolved independently, each falling back to
    /// `type_path` when the container does not name one.
    ///
    /// ## Arguments
    /// * 'spec' - Type path, container descriptor and reference mode
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if `type_path` is empty or any involved path
    /// cannot be resolved.
    pub fn resolve_field_type(&self, spec: &FieldTypeSpec) -> Result<FieldKind> {
        if spec.type_path.is_empty() {
            return Err(TypeNotFound(String::new()));
        }

        match spec.container.kind {
            ContainerKind::None => self.resolve_element(&spec.type_path, spec.reference),
            ContainerKind::Array => Ok(Self::make_array(
                self.resolve_element(&spec.type_path, spec.reference)?,
            )),
            ContainerKind::Set => Ok(Self::make_set(
                self.resolve_element(&spec.type_path, spec.reference)?,
            )),
            ContainerKind::Map => {
                let key_path = spec
                    .container
                    .key_type_path
                    .as_deref()
                    .unwrap_or(&spec.type_path);
                let value_path = spec
                    .container
                    .value_type_path
                    .as_deref()
                    .unwrap_or(&spec.type_path);

                Ok(Self::make_map(
                    self.resolve_element(key_path, spec.reference)?,
                    self.resolve_element(value_path, spec.reference)?,
                ))
            }
        }
    }

    fn resolve_element(&self, path: &str, reference: ReferenceMode) -> Result<FieldKind> {
        if path.is_empty() {
            return Err(TypeNotFound(String::new()));
        }

        if let Some(primitive) = PrimitiveKind::from_path(path) {
            return Ok(primitive.field_kind());
        }

        if self.resolve_struct(path).is_some() {
            return Ok(FieldKind::Struct {
                struct_path: path.to_string(),
            });
        }

        if self.resolve_enum(path).is_some() {
            return Ok(FieldKind::Enum {
                enum_path: path.to_string(),
                byte_backed: false,
            });
        }

        if let Some(class) = self.resolve_class(path) {
            let class_path = path.to_string();
            if class.kind == TypeKind::Interface {
                return Ok(FieldKind::Interface { class_path });
            }

            return Ok(match reference {
                ReferenceMode::Object => FieldKind::Object { class_path },
                ReferenceMode::Class => FieldKind::Class {
                    meta_class: class_path,
                },
                ReferenceMode::SoftObject => FieldKind::SoftObject { class_path },
                ReferenceMode::SoftClass => FieldKind::SoftClass {
                    meta_class: class_path,
                },
            });
        }

        Err(TypeNotFound(path.to_string()))
    }

    /// Canonical path of the type a field kind is bound to, for display.
    ///
    /// Containers report their element (or map value) type; bare primitives yield an empty
    /// string.
    #[must_use]
    pub fn field_type_to_canonical_path(kind: &FieldKind) -> String {
        kind.type_path().map(str::to_string).unwrap_or_default()
    }

    /// Wrap `element` as an array
    #[must_use]
    pub fn make_array(element: FieldKind) -> FieldKind {
        FieldKind::array_of(element)
    }

    /// Wrap `element` as a set
    #[must_use]
    pub fn make_set(element: FieldKind) -> FieldKind {
        FieldKind::set_of(element)
    }

    /// Build a map from independent key and value kinds
    #[must_use]
    pub fn make_map(key: FieldKind, value: FieldKind) -> FieldKind {
        FieldKind::map_of(key, value)
    }

    /// Current sizes of the memo caches
    pub fn cache_stats(&self) -> ResolverCacheStats {
        ResolverCacheStats {
            classes: self.classes.len(),
            structs: self.structs.len(),
            enums: self.enums.len(),
        }
    }

    /// Registry this resolver reads from
    pub fn registry(&self) -> &Arc<ReflectionRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fieldtype::ContainerDescriptor, reflection::ReflectedType};

    fn resolver() -> FieldTypeResolver {
        let registry = ReflectionRegistry::new();
        registry.register(ReflectedType::class("/Script/Engine", "Actor"));
        registry.register(ReflectedType::interface("/Script/Game", "Usable"));
        registry.register(
            ReflectedType::structure("/Script/Game", "Stats").with_field("Health", FieldKind::Float),
        );
        registry.register(ReflectedType::enumeration("/Script/Game", "EMood").with_entry("Calm", 0));
        FieldTypeResolver::new(Arc::new(registry))
    }

    #[test]
    fn test_primitives_resolve_without_registry() {
        let resolver = resolver();
        let kind = resolver
            .resolve_field_type(&FieldTypeSpec::new("/Script/Core.Name"))
            .unwrap();
        assert_eq!(kind, FieldKind::Name);
        assert_eq!(resolver.cache_stats(), ResolverCacheStats::default());
        assert_eq!(FieldTypeResolver::field_type_to_canonical_path(&kind), "");
    }

    #[test]
    fn test_lookup_order_and_caching() {
        let resolver = resolver();

        assert_eq!(
            resolver
                .resolve_field_type(&FieldTypeSpec::new("/Script/Game.Stats"))
                .unwrap(),
            FieldKind::Struct {
                struct_path: "/Script/Game.Stats".into()
            }
        );
        assert!(matches!(
            resolver
                .resolve_field_type(&FieldTypeSpec::new("/Script/Game.EMood"))
                .unwrap(),
            FieldKind::Enum { .. }
        ));
        assert_eq!(
            resolver
                .resolve_field_type(&FieldTypeSpec::new("/Script/Game.Usable"))
                .unwrap(),
            FieldKind::Interface {
                class_path: "/Script/Game.Usable".into()
            }
        );

        let stats = resolver.cache_stats();
        assert_eq!((stats.classes, stats.structs, stats.enums), (1, 1, 1));

        resolver.resolve_struct("/Script/Game.Stats").unwrap();
        assert_eq!(resolver.cache_stats().structs, 1);
    }

    #[test]
    fn test_reference_modes() {
        let resolver = resolver();
        let spec = FieldTypeSpec::new("/Script/Engine.Actor");

        assert_eq!(
            resolver.resolve_field_type(&spec).unwrap(),
            FieldKind::Object {
                class_path: "/Script/Engine.Actor".into()
            }
        );
        assert_eq!(
            resolver
                .resolve_field_type(&spec.clone().with_reference(ReferenceMode::SoftClass))
                .unwrap(),
            FieldKind::SoftClass {
                meta_class: "/Script/Engine.Actor".into()
            }
        );
    }

    #[test]
    fn test_containers() {
        let resolver = resolver();

        let kind = resolver
            .resolve_field_type(
                &FieldTypeSpec::new("/Script/Game.Stats").with_container(ContainerDescriptor::set()),
            )
            .unwrap();
        assert!(matches!(kind, FieldKind::Set { .. }));
        assert_eq!(
            FieldTypeResolver::field_type_to_canonical_path(&kind),
            "/Script/Game.Stats"
        );

        let kind = resolver
            .resolve_field_type(
                &FieldTypeSpec::new("/Script/Game.Stats")
                    .with_container(ContainerDescriptor::map("/Script/Core.Name", "/Script/Game.Stats")),
            )
            .unwrap();
        assert_eq!(
            kind,
            FieldKind::map_of(
                FieldKind::Name,
                FieldKind::Struct {
                    struct_path: "/Script/Game.Stats".into()
                }
            )
        );

        let mut container = ContainerDescriptor::map("/Script/Core.Int32", "x");
        container.value_type_path = None;
        let kind = resolver
            .resolve_field_type(&FieldTypeSpec::new("/Script/Core.Bool").with_container(container))
            .unwrap();
        assert_eq!(kind, FieldKind::map_of(FieldKind::Int32, FieldKind::Bool));
    }

    #[test]
    fn test_not_found() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve_field_type(&FieldTypeSpec::new("")),
            Err(TypeNotFound(String::new()))
        );
        assert_eq!(
            resolver.resolve_field_type(&FieldTypeSpec::new("/Script/Game.Missing")),
            Err(TypeNotFound("/Script/Game.Missing".into()))
        );
        assert_eq!(
            resolver.resolve_field_type(
                &FieldTypeSpec::new("/Script/Core.Int32")
                    .with_container(ContainerDescriptor::map("/Script/Game.Missing", "/Script/Core.Int32"))
            ),
            Err(TypeNotFound("/Script/Game.Missing".into()))
        );
        assert!(resolver.resolve_class("/Script/Game.Stats").is_none());
        assert_eq!(resolver.cache_stats().classes, 0);
    }

    #[test]
    fn test_split_type_path() {
        assert_eq!(
            split_type_path("/Script/Game.Stats").unwrap(),
            ("/Script/Game", "Stats")
        );
        assert!(split_type_path("Stats").is_err());
        assert!(split_type_path(".Stats").is_err());
        assert!(split_type_path("/Script/Game.").is_err());
        assert!(split_type_path("/Script/Game.A.B").is_err());
    }
}
