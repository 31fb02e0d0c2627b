//! Opaque identifiers for persisted constructor entities.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw storage value.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Identifier of an external area that may own a constructor tree.
    AreaId,
    "area"
);
entity_id!(
    /// Identifier of a constructor group.
    GroupId,
    "group"
);
entity_id!(
    /// Identifier of a constructor holder.
    HolderId,
    "holder"
);

#[cfg(test)]
mod tests {
    use super::{AreaId, GroupId, HolderId};

    #[test]
    fn ids_display_with_kind_prefix() {
        assert_eq!(AreaId(3).to_string(), "area#3");
        assert_eq!(GroupId(7).to_string(), "group#7");
        assert_eq!(HolderId(11).to_string(), "holder#11");
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&HolderId(42)).expect("id should serialize");
        assert_eq!(json, "42");
        let parsed: GroupId = serde_json::from_str("5").expect("id should parse");
        assert_eq!(parsed, GroupId(5));
    }
}
