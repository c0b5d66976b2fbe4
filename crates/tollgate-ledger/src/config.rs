use serde::{Deserialize, Serialize};

/// Starting credits granted to every provisioned account.
pub const STARTING_CREDITS: u64 = 5;

/// The fixed allow-list of accounts seeded at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Provisioning {
    /// Balance each account starts with.
    pub starting_credits: u64,
    /// Identifiers to provision. Anything not listed is never allowed.
    pub accounts: Vec<String>,
}

impl Default for Provisioning {
    fn default() -> Self {
        Self {
            starting_credits: STARTING_CREDITS,
            accounts: vec!["avy".into(), "vaibhav".into()],
        }
    }
}

impl Provisioning {
    pub fn new<I, S>(starting_credits: u64, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            starting_credits,
            accounts: accounts.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_seed_list() {
        let p = Provisioning::default();
        assert_eq!(p.starting_credits, 5);
        assert_eq!(p.accounts, vec!["avy".to_string(), "vaibhav".to_string()]);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let p: Provisioning = toml::from_str("starting_credits = 10").unwrap();
        assert_eq!(p.starting_credits, 10);
        assert_eq!(p.accounts.len(), 2);
    }
}
