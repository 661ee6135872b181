#![forbid(unsafe_code)]

use serde::Deserialize;

/// What to do with statically reachable runtime faults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultPolicy {
    /// Annotate only.
    Allow,
    /// Annotate and report a warning.
    #[default]
    Warn,
    /// Annotate and report an error.
    Deny,
}

/// Verifier settings. Deserializable so an outer tool can keep them in TOML.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CheckConfig {
    pub fault_policy: FaultPolicy,
    /// Report dead match arms and statements after a return or panic.
    pub report_unreachable: bool,
    /// Run independent passes and units on the rayon pool.
    pub parallel: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            fault_policy: FaultPolicy::Warn,
            report_unreachable: true,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_is_default() {
        let config: CheckConfig = toml::from_str("").unwrap();
        assert_eq!(config, CheckConfig::default());
    }

    #[test]
    fn kebab_case_keys() {
        let config: CheckConfig =
            toml::from_str("fault-policy = \"deny\"\nreport-unreachable = false\n").unwrap();
        assert_eq!(config.fault_policy, FaultPolicy::Deny);
        assert!(!config.report_unreachable);
        assert!(config.parallel);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<CheckConfig>("paralel = true\n").is_err());
    }
}
