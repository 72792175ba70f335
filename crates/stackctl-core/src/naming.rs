//! Deterministic stack naming.

use crate::meta::ResourceMeta;

/// Separator joining the stack name segments.
const SEPARATOR: &str = "-";

/// Derive the stack name for a resource identity:
/// `{service}-{kind}-{name}-{namespace}`.
///
/// Stable across reconciliation passes and unique across distinct
/// identities of the same kind. An explicit spec override, when present,
/// is applied by the caller instead of this derivation.
pub fn stack_name(service: &str, kind: &str, meta: &ResourceMeta) -> String {
    let kind = kind.to_lowercase();
    [
        service,
        kind.as_str(),
        meta.name.as_str(),
        meta.namespace.as_str(),
    ]
    .join(SEPARATOR)
}
