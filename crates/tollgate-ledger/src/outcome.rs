use std::fmt;

/// Why a `consume` call was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Denial {
    /// The identifier was never provisioned. Permanent until provisioned
    /// out-of-band.
    NotConfigured,
    /// The account exists but has no credits left.
    Exhausted,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => f.write_str("not-configured"),
            Self::Exhausted => f.write_str("exhausted"),
        }
    }
}

/// Result of a single check-and-deduct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// One credit was deducted and committed; `remaining` is the new balance.
    Approved { remaining: u64 },
    /// Nothing was changed.
    Denied(Denial),
}

impl Outcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    pub fn remaining(&self) -> Option<u64> {
        match self {
            Self::Approved { remaining } => Some(*remaining),
            Self::Denied(_) => None,
        }
    }

    pub fn denial(&self) -> Option<Denial> {
        match self {
            Self::Approved { .. } => None,
            Self::Denied(d) => Some(*d),
        }
    }
}
