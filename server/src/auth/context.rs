//! Per-request security scope.
//!
//! # Pre-conditions
//! - Built once per request from the authenticated principal.
//!
//! # Post-conditions
//! - Immutable; consumed by the filter compiler and then discarded.
//!
//! # Invariants
//! - `authorized_library_ids == None` means every library is visible;
//!   `Some(empty)` means none is.
//! - Sharing labels are stored trimmed and lower-cased, never blank.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{LibraryId, UserId};

/// Whether an age restriction admits or rejects content at the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgeRestrictionMode {
    /// Only rated content at or below the age is visible.
    AllowOnly,
    /// Content rated at or above the age is hidden.
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgeRestriction {
    pub age: i32,
    pub mode: AgeRestrictionMode,
}

impl AgeRestriction {
    #[must_use]
    pub const fn allow_only(age: i32) -> Self {
        Self {
            age,
            mode: AgeRestrictionMode::AllowOnly,
        }
    }

    #[must_use]
    pub const fn exclude(age: i32) -> Self {
        Self {
            age,
            mode: AgeRestrictionMode::Exclude,
        }
    }
}

/// Allow/exclude policy over age rating and sharing labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentRestrictions {
    pub age_restriction: Option<AgeRestriction>,
    pub labels_allow: BTreeSet<String>,
    pub labels_exclude: BTreeSet<String>,
}

impl ContentRestrictions {
    /// Build restrictions, normalising the label sets.
    #[must_use]
    pub fn new<A, E>(
        age_restriction: Option<AgeRestriction>,
        labels_allow: A,
        labels_exclude: E,
    ) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            age_restriction,
            labels_allow: normalize_labels(labels_allow),
            labels_exclude: normalize_labels(labels_exclude),
        }
    }

    /// No restriction at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether any policy is configured.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.age_restriction.is_some()
            || !self.labels_allow.is_empty()
            || !self.labels_exclude.is_empty()
    }
}

fn normalize_labels<I>(labels: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    labels
        .into_iter()
        .map(|label| label.as_ref().trim().to_lowercase())
        .filter(|label| !label.is_empty())
        .collect()
}

/// Authorized libraries, content restrictions and acting user of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    pub authorized_library_ids: Option<BTreeSet<LibraryId>>,
    pub restrictions: ContentRestrictions,
    /// Required only when the filter contains a read-status leaf.
    pub user_id: Option<UserId>,
}

impl SecurityContext {
    /// Every library, no restriction, no user.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_libraries(mut self, libraries: impl IntoIterator<Item = LibraryId>) -> Self {
        self.authorized_library_ids = Some(libraries.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_restrictions(mut self, restrictions: ContentRestrictions) -> Self {
        self.restrictions = restrictions;
        self
    }
}

/// The authenticated caller, as established by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    /// `None` grants every library.
    pub libraries: Option<BTreeSet<LibraryId>>,
    pub restrictions: ContentRestrictions,
}

impl From<Principal> for SecurityContext {
    fn from(principal: Principal) -> Self {
        Self {
            authorized_library_ids: principal.libraries,
            restrictions: principal.restrictions,
            user_id: Some(principal.user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_normalized() {
        let restrictions = ContentRestrictions::new(None, ["  Kids ", "", "TEENS"], ["   "]);
        assert_eq!(
            restrictions.labels_allow,
            BTreeSet::from(["kids".to_owned(), "teens".to_owned()])
        );
        assert!(restrictions.labels_exclude.is_empty());
    }

    #[test]
    fn test_is_restricted() {
        let no_labels = Vec::<&str>::new;
        assert!(!ContentRestrictions::none().is_restricted());
        let blank = ContentRestrictions::new(None, ["  "], no_labels());
        assert!(!blank.is_restricted());

        let age = Some(AgeRestriction::exclude(16));
        let by_age = ContentRestrictions::new(age, no_labels(), no_labels());
        assert!(by_age.is_restricted());
        let by_label = ContentRestrictions::new(None, no_labels(), ["x"]);
        assert!(by_label.is_restricted());
    }

    #[test]
    fn test_library_scoping() {
        let all = SecurityContext::unrestricted();
        assert!(all.authorized_library_ids.is_none());
        let none = SecurityContext::unrestricted().with_libraries(Vec::new());
        assert_eq!(none.authorized_library_ids, Some(BTreeSet::new()));
        let some = SecurityContext::for_user(UserId::new("u"))
            .with_libraries([LibraryId::new("a"), LibraryId::new("a")]);
        assert_eq!(some.authorized_library_ids.map(|ids| ids.len()), Some(1));
    }

    #[test]
    fn test_principal_scope_keeps_user() {
        let principal = Principal {
            user_id: UserId::new("u1"),
            libraries: None,
            restrictions: ContentRestrictions::new(None, ["Kids"], Vec::<&str>::new()),
        };
        let context = SecurityContext::from(principal);
        assert_eq!(context.user_id, Some(UserId::new("u1")));
        assert!(context.authorized_library_ids.is_none());
        assert!(context.restrictions.labels_allow.contains("kids"));
    }

    #[test]
    fn test_age_restriction_wire_format() {
        let restriction: AgeRestriction =
            serde_json::from_str(r#"{"age": 12, "mode": "ALLOW_ONLY"}"#).expect("valid");
        assert_eq!(restriction, AgeRestriction::allow_only(12));
    }
}
