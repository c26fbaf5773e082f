use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed set of values that travel over the wire as fixed strings.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, default = $default:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: value.to_string(),
                    })
            }
        }
    };
}

wire_enum!(
    /// Chat model the backend answers with.
    LlmModel, "llm model", default = Gpt35Turbo {
        Gpt4o => "gpt-4o",
        Gpt4Turbo => "gpt-4-turbo",
        Gpt4 => "gpt-4",
        Gpt35Turbo => "gpt-3.5-turbo-0125",
    }
);

wire_enum!(
    /// Embedding model used to build the vector index.
    EmbeddingModel, "embedding model", default = Ada002 {
        Ada002 => "text-embedding-ada-002",
        Small3 => "text-embedding-3-small",
        Large3 => "text-embedding-3-large",
    }
);

wire_enum!(
    /// Characters the relationship explorer offers as tabs, in tab order.
    Character, "character", default = Wolverine {
        Wolverine => "Wolverine",
        Storm => "Storm",
        ProfessorX => "Professor X",
        Magneto => "Magneto",
        JeanGrey => "Jean Grey",
        Cyclops => "Cyclops",
        Beast => "Beast",
        Mystique => "Mystique",
    }
);

impl Character {
    pub fn first() -> Self {
        Character::ALL[0]
    }

    pub fn name(self) -> &'static str {
        self.as_str()
    }
}
