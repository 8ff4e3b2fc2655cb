// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers for the plan-execution domain.
//!
//! `PlanId`/`ActionId`/`ModuleId`/`TriggerId` are caller-chosen strings (an
//! LLM names its own action IDs, e.g. `"a1"`; module IDs are registered
//! names like `"filesystem"`) so they wrap a plain `String` rather than the
//! fixed-capacity generated IDs below. `EventId`/`DecisionId` are minted by
//! the daemon itself and use the generated-ID shape.

use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* pub struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
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
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifies an IML plan. Supplied by the submitter or generated by
    /// the daemon when absent.
    pub struct PlanId;
}

string_id! {
    /// Identifies a single action within a plan. Chosen by the plan author.
    pub struct ActionId;
}

string_id! {
    /// Identifies a capability module (filesystem, os_exec, database, ...).
    pub struct ModuleId;
}

string_id! {
    /// Identifies a trigger definition.
    pub struct TriggerId;
}

crate::define_id! {
    /// Identifies an approval decision. Minted by the Approval Gate.
    pub struct DecisionId("dcn-");
}

crate::define_id! {
    /// Identifies an event on the bus, used for causality tracking.
    pub struct EventId("evt-");
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
