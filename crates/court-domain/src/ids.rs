//! Identifier newtypes for users, cases and votes
//!
//! Every entity is keyed by a UUIDv7, which gives:
//! - Chronological sortability (cases list in submission order)
//! - 128-bit uniqueness without coordinating with the store
//! - RFC 9562-standard format for URLs and JSON

use std::fmt;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from a raw u128 value
            ///
            /// This is primarily for storage layer deserialization.
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an identifier from its hyphenated UUID string
            pub fn from_string(s: &str) -> Result<Self, crate::ValidationError> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| {
                        crate::ValidationError::new(format!(
                            "invalid {} '{}': {}",
                            $label, s, e
                        ))
                    })
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Milliseconds since the Unix epoch encoded in the UUIDv7
            pub fn timestamp(&self) -> u64 {
                // UUIDv7: top 48 bits are Unix millisecond timestamp
                (self.0 >> 80) as u64
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a user account
    UserId,
    "user id"
);

uuid_id!(
    /// Unique identifier for a submitted case
    ///
    /// # Examples
    ///
    /// ```
    /// use court_domain::CaseId;
    ///
    /// let id = CaseId::new();
    /// let parsed: CaseId = id.to_string().parse().unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    CaseId,
    "case id"
);

uuid_id!(
    /// Unique identifier for a cast vote
    VoteId,
    "vote id"
);
