//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use trail_core::{
    AnalysisConfig, CategoryMatch, CategoryRule, CategoryTable, DomainMode, IdleThreshold,
    ValidationError, parse_timezone,
};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Largest gap between two events of one session, in minutes.
    pub idle_threshold_minutes: u32,

    /// IANA timezone used for hour, weekday and date.
    pub timezone: String,

    /// `host` or `registrable`.
    pub domain_mode: DomainMode,

    /// `domain` or `url`.
    pub category_match: CategoryMatch,

    /// URL schemes kept by normalization. Empty keeps everything.
    pub allowed_schemes: Vec<String>,

    /// Rows shown in the top-domains section of the report.
    pub top_domains: usize,

    /// Ordered category rules.
    pub categories: Vec<CategoryRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_threshold_minutes: IdleThreshold::DEFAULT_MINUTES,
            timezone: "UTC".to_string(),
            domain_mode: DomainMode::Host,
            category_match: CategoryMatch::Domain,
            allowed_schemes: vec![
                "http".to_string(),
                "https".to_string(),
                "chrome-extension".to_string(),
            ],
            top_domains: 15,
            categories: default_categories(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TRAIL_*)
        figment = figment.merge(Env::prefixed("TRAIL_"));

        figment.extract()
    }

    /// Builds the core analysis settings, validating the timezone.
    pub fn analysis_config(&self) -> Result<AnalysisConfig, ValidationError> {
        Ok(AnalysisConfig {
            idle_threshold: IdleThreshold::from_minutes(self.idle_threshold_minutes),
            timezone: parse_timezone(&self.timezone)?,
            domain_mode: self.domain_mode,
            categories: CategoryTable::new(self.categories.clone(), self.category_match),
            allowed_schemes: self.allowed_schemes.clone(),
        })
    }
}

/// Built-in category table, most specific sites listed first.
fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("Search", ["google.com", "bing.com", "duckduckgo.com"]),
        CategoryRule::new("Email", ["mail.google.com", "outlook.com", "gmail.com"]),
        CategoryRule::new(
            "Freelancing/Jobs",
            ["upwork.com", "wellfound.com", "taskrabbit.com", "linkedin.com/jobs"],
        ),
        CategoryRule::new(
            "Work/Documents",
            ["sharepoint.com", "office.com", "docs.google.com"],
        ),
        CategoryRule::new(
            "Cloud/DevOps",
            ["aws.amazon.com", "console.aws.amazon.com", "azure.com", "cloud.google.com"],
        ),
        CategoryRule::new("E-commerce", ["amazon.com", "ebay.com", "shopify.com"]),
        CategoryRule::new(
            "Social Media",
            ["facebook.com", "twitter.com", "linkedin.com", "instagram.com"],
        ),
        CategoryRule::new(
            "Development",
            ["github.com", "gitlab.com", "stackoverflow.com", "codepen.io"],
        ),
        CategoryRule::new(
            "Entertainment",
            ["netflix.com", "youtube.com", "spotify.com", "twitch.tv"],
        ),
        CategoryRule::new("News", ["news.google.com", "cnn.com", "bbc.com", "reddit.com"]),
        CategoryRule::new("Finance", ["xero.com", "quickbooks.com", "mint.com"]),
        CategoryRule::new(
            "Travel",
            ["zipair.net", "booking.com", "expedia.com", "airbnb.com"],
        ),
        CategoryRule::new("Real Estate", ["loopnet.com", "zillow.com", "realtor.com"]),
    ]
}

/// Returns the platform-specific config directory for trail.
///
/// On Linux: `~/.config/trail`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("trail"))
}
