//! Closed enums backed by SMALLINT lookup tables.
//!
//! Each variant's discriminant matches the seed data in the corresponding
//! lookup table (`report_statuses`, `work_order_statuses`, ...). Rows carry
//! the raw `*_id` column and decode it through `TryFrom<i16>`, so an id that
//! is not in the table is a decode error rather than a silent default.

/// Define a lookup-table enum with its id, wire name and conversions.
macro_rules! define_lookup_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($entity:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant, in discriminant order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Return the lookup-table id.
            pub fn id(self) -> $crate::types::StatusId {
                self as $crate::types::StatusId
            }

            /// Resolve a lookup-table id to its variant.
            pub fn from_id(id: $crate::types::StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Ids of `items`, for binding to a `= ANY($n)` guard.
            pub fn ids(items: &[Self]) -> Vec<$crate::types::StatusId> {
                items.iter().map(|item| item.id()).collect()
            }

            /// Wire name, identical to the serde representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for $crate::types::StatusId {
            fn from(value: $name) -> Self {
                value as $crate::types::StatusId
            }
        }

        impl TryFrom<$crate::types::StatusId> for $name {
            type Error = $crate::error::CoreError;

            fn try_from(id: $crate::types::StatusId) -> Result<Self, Self::Error> {
                Self::from_id(id).ok_or_else(|| {
                    $crate::error::CoreError::Internal(format!(
                        "Unknown {} id {id}",
                        $entity
                    ))
                })
            }
        }
    };
}

pub(crate) use define_lookup_enum;
