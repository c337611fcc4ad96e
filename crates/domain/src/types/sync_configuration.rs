//! Per-user sync preferences.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;
use uuid::Uuid;

/// Default downstream calendar display name used when a user has not
/// configured one.
pub const DEFAULT_GOOGLE_CALENDAR_NAME: &str = "Insper Sync";

/// Per-user settings governing whether and how a sync runs.
///
/// Invariants: if `sync_enabled` is false the orchestrator is a no-op; the
/// exclusion sets are deny-lists consulted during reconciliation only when
/// `sync_all_events` is false — when true, both exclusion sets are ignored
/// and everything passes the filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct SyncConfiguration {
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub user_id: Uuid,

    pub sync_enabled: bool,
    pub frequency_hours: u32,

    pub google_calendar_name: String,

    pub add_insper_prefix: bool,
    pub include_instructor: bool,
    pub include_discipline_code: bool,

    pub sync_all_events: bool,
    pub excluded_event_kinds: HashSet<String>,
    pub excluded_disciplines: HashSet<String>,

    pub last_sync_attempt: Option<chrono::DateTime<chrono::Utc>>,
}

impl SyncConfiguration {
    /// The defaults the orchestrator applies when a user has no stored
    /// configuration (C10 step 4).
    #[must_use]
    pub fn default_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            sync_enabled: true,
            frequency_hours: 24,
            google_calendar_name: DEFAULT_GOOGLE_CALENDAR_NAME.to_string(),
            add_insper_prefix: false,
            include_instructor: true,
            include_discipline_code: true,
            sync_all_events: true,
            excluded_event_kinds: HashSet::new(),
            excluded_disciplines: HashSet::new(),
            last_sync_attempt: None,
        }
    }

    /// Whether an upstream event with the given kind and discipline code
    /// passes the exclusion-list policy (§4.7 step 2).
    #[must_use]
    pub fn passes_exclusion_filter(&self, event_kind: Option<&str>, discipline_code: Option<&str>) -> bool {
        if self.sync_all_events {
            return true;
        }

        if let Some(kind) = event_kind {
            if self.excluded_event_kinds.contains(kind) {
                return false;
            }
        }

        if let Some(code) = discipline_code {
            if self.excluded_disciplines.contains(code) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_sync_and_allow_everything() {
        let config = SyncConfiguration::default_for(Uuid::new_v4());
        assert!(config.sync_enabled);
        assert!(config.sync_all_events);
        assert_eq!(config.google_calendar_name, DEFAULT_GOOGLE_CALENDAR_NAME);
    }

    #[test]
    fn sync_all_events_ignores_exclusion_sets() {
        let mut config = SyncConfiguration::default_for(Uuid::new_v4());
        config.excluded_disciplines.insert("MAT201".to_string());
        assert!(config.passes_exclusion_filter(None, Some("MAT201")));
    }

    #[test]
    fn exclusion_sets_apply_when_sync_all_events_is_false() {
        let mut config = SyncConfiguration::default_for(Uuid::new_v4());
        config.sync_all_events = false;
        config.excluded_disciplines.insert("MAT201".to_string());
        config.excluded_event_kinds.insert("prova".to_string());

        assert!(!config.passes_exclusion_filter(None, Some("MAT201")));
        assert!(!config.passes_exclusion_filter(Some("prova"), None));
        assert!(config.passes_exclusion_filter(Some("aula"), Some("FIS101")));
    }
}
