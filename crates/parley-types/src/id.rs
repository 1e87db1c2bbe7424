//! UUID v7 newtype identifiers.
//!
//! Every entity gets its own identifier type so that an `AccountId` can never
//! be passed where a `ConversationId` is expected.

/// Declare a `Uuid`-backed identifier newtype with the usual conversions.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-sortable).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Identifier of an account (human or persona shadow identity).
    AccountId
);

uuid_id!(
    /// Identifier of an authored persona profile.
    PersonaId
);

uuid_id!(
    /// Identifier of a conversation.
    ConversationId
);

uuid_id!(
    /// Identifier of a single message.
    MessageId
);
