//! ID types for libraries, series, read lists, collections and users.
//!
//! Every identifier is an opaque string assigned by the catalogue. The
//! newtypes keep them from being mixed up when they flow into join markers
//! and predicates: a `ReadListId` can never be compared against a
//! `LibraryId` column by accident.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::search::Literal;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
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
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Literal {
            fn from(id: $name) -> Self {
                Self::Text(id.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a library (a root folder of the collection).
    LibraryId
);
string_id!(
    /// Identifier of a series.
    SeriesId
);
string_id!(
    /// Identifier of a user-curated, ordered list of books.
    ReadListId
);
string_id!(
    /// Identifier of a user-curated, ordered collection of series.
    CollectionId
);
string_id!(
    /// Identifier of an authenticated user.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = ReadListId::new("rl-42");
        assert_eq!(format!("{id}"), "rl-42");
        assert_eq!(id.as_str(), "rl-42");
    }

    #[test]
    fn test_id_equality_and_ordering() {
        let a = CollectionId::from("a");
        let b = CollectionId::from("b".to_owned());
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(a, CollectionId::new("a"));
    }

    #[test]
    fn test_id_into_literal() {
        let literal: Literal = LibraryId::new("lib1").into();
        assert_eq!(literal, Literal::Text("lib1".to_owned()));
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id: UserId = serde_json::from_str("\"user-1\"").expect("valid id");
        assert_eq!(id, UserId::new("user-1"));
        assert_eq!(
            serde_json::to_string(&id).expect("serializable"),
            "\"user-1\""
        );
    }
}
