#![deny(unsafe_code)]

//! Identifier newtypes for schema and mapping records.
//!
//! Connector-supplied records arrive with their own identifiers; records
//! created inside CoreBridge (inferred entities, mapping rows) derive a
//! short deterministic id from their defining parts so repeated runs over
//! the same input produce identical ids.

use std::fmt;

use sha2::Digest;

/// Derives a stable 16-byte hex id from the given parts.
///
/// Parts are joined with a NUL separator before hashing so that
/// `["ab", "c"]` and `["a", "bc"]` produce different ids.
fn derive_id(parts: &[&str]) -> String {
    let mut hasher = sha2::Sha256::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    let digest: [u8; 32] = hasher.finalize().into();
    hex::encode(&digest[..16])
}

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into().trim().to_string())
            }

            /// Derives a deterministic id from the given parts.
            pub fn derived(parts: &[&str]) -> Self {
                Self(derive_id(parts))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

id_type!(
    /// Identifier of a system (connector instance or upload owner).
    SystemId
);
id_type!(
    /// Identifier of an entity within one system.
    EntityId
);
id_type!(
    /// Identifier of a field within one entity.
    FieldId
);
id_type!(
    /// Identifier of an entity-level mapping.
    EntityMappingId
);
id_type!(
    /// Identifier of a field-level mapping.
    FieldMappingId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_ids_are_stable() {
        let a = FieldId::derived(&["sys", "Customer", "CUST_NAME"]);
        let b = FieldId::derived(&["sys", "Customer", "CUST_NAME"]);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn derived_ids_respect_part_boundaries() {
        let a = EntityId::derived(&["ab", "c"]);
        let b = EntityId::derived(&["a", "bc"]);
        assert_ne!(a, b);
    }
}
