// Application configuration, loaded from environment variables and CLI flags.

/// Hard cap the chat client enforces on select-menu option lists.
/// Catalogs larger than the configured cap are truncated and the
/// truncation is surfaced in the reply.
pub const DEFAULT_MENU_OPTION_CAP: usize = 25;

/// Default time-to-live for an abandoned pending selection.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 900;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Default catalog endpoint, used for English.
    pub catalog_base_url: String,
    /// Language-parameterized catalog endpoint base; `<lang>/monsters?kind=large`
    /// is appended per request.
    pub localized_catalog_base_url: String,
    /// Maximum number of options presented in a select menu.
    pub menu_option_cap: usize,
    /// Seconds before an abandoned pending selection is evicted.
    pub session_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:huntlog.db?mode=rwc`)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `CATALOG_BASE_URL` - default monster catalog endpoint
    /// - `LOCALIZED_CATALOG_BASE_URL` - language-parameterized catalog endpoint base
    /// - `MENU_OPTION_CAP` - select-menu option limit (default: 25)
    /// - `SESSION_TTL_SECS` - pending-selection eviction age (default: 900)
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:huntlog.db?mode=rwc".to_string());

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(&args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(3000);

        let catalog_base_url = std::env::var("CATALOG_BASE_URL")
            .unwrap_or_else(|_| "https://mhw-db.com/monsters".to_string());

        let localized_catalog_base_url = std::env::var("LOCALIZED_CATALOG_BASE_URL")
            .unwrap_or_else(|_| "https://wilds.mhdb.io".to_string());

        let menu_option_cap = std::env::var("MENU_OPTION_CAP")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MENU_OPTION_CAP);

        let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        Config {
            database_url,
            port,
            catalog_base_url,
            localized_catalog_base_url,
            menu_option_cap,
            session_ttl_secs,
        }
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite:huntlog.db?mode=rwc".to_string(),
            port: 3000,
            catalog_base_url: "https://mhw-db.com/monsters".to_string(),
            localized_catalog_base_url: "https://wilds.mhdb.io".to_string(),
            menu_option_cap: DEFAULT_MENU_OPTION_CAP,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}
