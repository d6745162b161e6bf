//! Validator settings and builder

use serde::{Deserialize, Serialize};
use service_builder::builder;

use crate::chain::CascadeMode;

/// Validator-wide evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder]
pub struct ValidatorSettings {
    /// `StopOnFirstFailure` skips the chains after the first failing one
    #[builder(getter, setter, default = "CascadeMode::Continue")]
    cascade: CascadeMode,

    /// Chain-level cascade on the async path; `None` follows `cascade`
    #[builder(getter, setter, default = "None")]
    async_cascade: Option<CascadeMode>,

    /// Cascade for chains that do not set their own
    #[builder(getter, setter, default = "CascadeMode::Continue")]
    default_chain_cascade: CascadeMode,

    /// Run chains concurrently on the async path when it does not stop early
    #[builder(getter, setter, default = "true")]
    concurrent_chains: bool,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        ValidatorSettings::builder()
            .build_with_defaults()
            .expect("every validator setting has a default")
    }
}

impl ValidatorSettings {
    pub fn stops_on_first_failure(&self) -> bool {
        self.cascade == CascadeMode::StopOnFirstFailure
    }

    /// Validator cascade in effect for `validate_async`
    pub fn effective_async_cascade(&self) -> CascadeMode {
        self.async_cascade.unwrap_or(self.cascade)
    }

    pub fn async_stops_on_first_failure(&self) -> bool {
        self.effective_async_cascade() == CascadeMode::StopOnFirstFailure
    }
}

// Convenience methods on the generated builder
impl ValidatorSettingsBuilder {
    pub fn stop_on_first_failure(self) -> Self {
        self.cascade(CascadeMode::StopOnFirstFailure)
    }

    pub fn chains_stop_on_first_failure(self) -> Self {
        self.default_chain_cascade(CascadeMode::StopOnFirstFailure)
    }

    /// Stop after the first failing chain on the async path only
    pub fn async_stop_on_first_failure(self) -> Self {
        self.async_cascade(Some(CascadeMode::StopOnFirstFailure))
    }

    pub fn sequential(self) -> Self {
        self.concurrent_chains(false)
    }

    pub fn build_config(self) -> ValidatorSettings {
        self.build_with_defaults()
            .expect("every validator setting has a default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ValidatorSettings::default();
        assert_eq!(settings.cascade, CascadeMode::Continue);
        assert_eq!(settings.default_chain_cascade, CascadeMode::Continue);
        assert!(settings.concurrent_chains);
        assert!(!settings.stops_on_first_failure());
        assert_eq!(settings.get_async_cascade(), &None);
    }

    #[test]
    fn test_settings_builder() {
        let settings = ValidatorSettings::builder()
            .stop_on_first_failure()
            .chains_stop_on_first_failure()
            .sequential()
            .build_config();

        assert!(settings.stops_on_first_failure());
        assert_eq!(settings.default_chain_cascade, CascadeMode::StopOnFirstFailure);
        assert!(!settings.concurrent_chains);
        assert!(settings.async_stops_on_first_failure());
    }

    #[test]
    fn test_async_cascade_overrides_sync_cascade() {
        let settings = ValidatorSettings::builder()
            .stop_on_first_failure()
            .async_cascade(Some(CascadeMode::Continue))
            .build_config();
        assert!(settings.stops_on_first_failure());
        assert!(!settings.async_stops_on_first_failure());

        let mut settings = ValidatorSettings::default();
        settings.set_async_cascade(Some(CascadeMode::StopOnFirstFailure));
        assert_eq!(settings.get_cascade(), &CascadeMode::Continue);
        assert!(settings.async_stops_on_first_failure());
    }

    #[test]
    fn test_settings_serde() {
        let settings: ValidatorSettings = serde_json::from_str(
            r#"{"cascade":"StopOnFirstFailure","async_cascade":null,"default_chain_cascade":"Continue","concurrent_chains":false}"#,
        )
        .unwrap();
        assert!(settings.stops_on_first_failure());
        assert!(!settings.concurrent_chains);
    }
}
