//! Configuration for value factories.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which built-in equivalence policy a factory's collections use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EquivalenceMode {
    /// Full structural equality, keyword parameters included.
    #[default]
    Strict,
    /// Equality that ignores keyword parameters.
    Semantic,
}

/// Configuration for a [`ValueFactory`](crate::ValueFactory).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactoryConfig {
    /// Equivalence policy for sets and maps.
    pub equivalence: EquivalenceMode,

    /// Whether builders expose their [`BuildStats`](crate::BuildStats).
    pub collect_build_stats: bool,
}

impl FactoryConfig {
    /// Creates a configuration using semantic equivalence.
    #[must_use]
    pub fn semantic() -> Self {
        Self {
            equivalence: EquivalenceMode::Semantic,
            ..Self::default()
        }
    }

    /// Creates a configuration for debugging: build statistics enabled.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            collect_build_stats: true,
            ..Self::default()
        }
    }

    /// Builder method to set the equivalence mode.
    #[must_use]
    pub fn with_equivalence(mut self, mode: EquivalenceMode) -> Self {
        self.equivalence = mode;
        self
    }

    /// Builder method to enable/disable build statistics.
    #[must_use]
    pub fn with_build_stats(mut self, enabled: bool) -> Self {
        self.collect_build_stats = enabled;
        self
    }
}
