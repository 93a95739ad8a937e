// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }

            /// Row ids handed out by SQLite are strictly positive.
            pub const fn is_valid(self) -> bool {
                self.0 > 0
            }

            pub const fn checked(value: i64) -> Option<Self> {
                if value > 0 { Some(Self(value)) } else { None }
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(PlaceId);
entity_id!(ItemTypeId);
entity_id!(PersonId);
entity_id!(ItemId);
entity_id!(HistoryId);
