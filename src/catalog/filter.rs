use crate::reflection::{ReflectedType, TypeFlags};

/// Name prefixes of synthetic types the host generates internally.
///
/// Skeleton classes, reinstancing and hot-reload shims, trash and placeholder classes never
/// represent a type a user can pick, so the catalog drops them on rebuild.
pub const EXCLUDED_PREFIXES: &[&str] = &[
    "SKEL_",
    "REINST_",
    "TRASHCLASS_",
    "HOTRELOADED_",
    "PLACEHOLDER-CLASS",
    "ORPHANED_DATA_ONLY_",
];

/// Reason a registered type is not admitted to the catalog, if any
pub fn exclusion_reason(ty: &ReflectedType) -> Option<&'static str> {
    if let Some(prefix) = EXCLUDED_PREFIXES
        .iter()
        .copied()
        .find(|prefix| ty.name.starts_with(prefix))
    {
        return Some(prefix);
    }
    if ty.flags.contains(TypeFlags::NEWER_VERSION_EXISTS) {
        return Some("stale version");
    }
    None
}
