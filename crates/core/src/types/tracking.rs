//! Visitor actions recorded in the tracking log.

use serde::{Deserialize, Serialize};

/// An action a visitor performed, as written to the daily tracking log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingAction {
    Home,
    ShowCategory,
    FaqShow,
    Tags,
    Search,
    Login,
    Logout,
    Register,
    /// First request of a new visitor session.
    NewSession,
    /// A stale session id was presented and replaced.
    OldSession,
    Api,
}

impl TrackingAction {
    pub const ALL: [Self; 11] = [
        Self::Home,
        Self::ShowCategory,
        Self::FaqShow,
        Self::Tags,
        Self::Search,
        Self::Login,
        Self::Logout,
        Self::Register,
        Self::NewSession,
        Self::OldSession,
        Self::Api,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::ShowCategory => "show_category",
            Self::FaqShow => "faq_show",
            Self::Tags => "tags",
            Self::Search => "search",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Register => "register",
            Self::NewSession => "new_session",
            Self::OldSession => "old_session",
            Self::Api => "api",
        }
    }
}

impl std::fmt::Display for TrackingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrackingAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("unknown tracking action: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_parses_back() {
        for action in TrackingAction::ALL {
            assert_eq!(action.as_str().parse::<TrackingAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_serde_matches_log_names() {
        let json = serde_json::to_string(&TrackingAction::FaqShow).unwrap();
        assert_eq!(json, "\"faq_show\"");
    }

    #[test]
    fn test_unknown_action() {
        assert!("purchase".parse::<TrackingAction>().is_err());
    }
}
