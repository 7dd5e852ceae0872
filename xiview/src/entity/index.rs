use serde::{Deserialize, Serialize};

/// Define a typed index into one of the entity arrays of the [`EntityStore`](crate::entity::EntityStore).
macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
        )]
        pub struct $name(pub usize);

        impl $name {
            /// Get the raw index into the store
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }
    };
}

index_type!(
    /// The index of a [`Match`](crate::entity::Match) in the store
    MatchIndex
);
index_type!(
    /// The index of a [`CrossLink`](crate::entity::CrossLink) in the store
    CrossLinkIndex
);
index_type!(
    /// The index of a [`Protein`](crate::entity::Protein) in the store
    ProteinIndex
);
