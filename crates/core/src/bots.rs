//! Crawler detection by user agent.

/// Default value of the `tracking.botIgnoreList` setting.
pub const DEFAULT_BOT_IGNORE_LIST: &str = "nustcrape,webpost,GoogleBot,msnbot,crawler,scooter,bravobrian,archiver,\
w3c,control,wget,bot,spider,Yahoo! Slurp,htdig,gsa-crawler,AirControl,Uptime-Kuma,facebookcatalog";

/// Matches user agents against a list of lowercase fragments.
///
/// ```
/// use faqbase_core::bots::BotDetector;
///
/// let bots = BotDetector::from_list("GoogleBot, spider");
/// assert!(bots.is_bot("Mozilla/5.0 (compatible; Googlebot/2.1)"));
/// assert!(bots.is_bot(""));
/// assert!(!bots.is_bot("Mozilla/5.0 (X11; Linux x86_64) Firefox/131.0"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotDetector {
    fragments: Vec<String>,
}

impl BotDetector {
    /// Build a detector from a comma separated list. Entries are trimmed,
    /// lowercased, and empty entries dropped.
    #[must_use]
    pub fn from_list(list: &str) -> Self {
        let mut fragments: Vec<String> = list
            .split(',')
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        fragments.dedup();
        Self { fragments }
    }

    /// Whether the user agent belongs to a crawler.
    ///
    /// An empty (or whitespace-only) user agent counts as a bot.
    #[must_use]
    pub fn is_bot(&self, user_agent: &str) -> bool {
        let agent = user_agent.trim().to_lowercase();
        if agent.is_empty() {
            return true;
        }
        self.fragments.iter().any(|f| agent.contains(f.as_str()))
    }

    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}
