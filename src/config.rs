use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

use crate::auth::gate::{under_prefix, SIGN_IN_PATH, SIGN_UP_PATH};

#[derive(Parser, Debug, Default)]
#[command(
    name = "advocacy-site",
    about = "Content, membership and arcade site for an advocacy organization"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the user store database (overrides DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub content: ContentConfig,
    pub site: SiteConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    pub secret: Option<String>,
    pub bcrypt_cost: u32,
    /// Accounts with these emails get the admin role on sign-up and sign-in
    pub admin_emails: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ContentConfig {
    pub project_id: Option<String>,
    pub dataset: String,
    pub api_version: String,
    pub use_cdn: bool,
    /// Write token, only needed for comment submission
    pub token: Option<String>,
    /// JSON file of documents served when no CMS project is configured
    pub fixtures: Option<PathBuf>,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub form_endpoint_id: Option<String>,
    pub member_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 8,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "site_session".to_string(),
            session_hours: 24 * 30,
            secret: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_emails: Vec::new(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: "production".to_string(),
            api_version: "2023-05-03".to_string(),
            use_cdn: true,
            token: None,
            fixtures: None,
            timeout_secs: 10,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Civic Forward".to_string(),
            form_endpoint_id: None,
            member_prefix: "/members".to_string(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match cli.config {
            Some(ref path) => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            None => Config::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref url) = cli.database_url {
            config.database.url = Some(url.clone());
        }

        Ok(config)
    }

    /// Overlay values from the environment. `lookup` is injectable so tests
    /// never touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(secret) = get("SESSION_SECRET") {
            self.auth.secret = Some(secret);
        }
        if let Some(project) = get("SANITY_PROJECT_ID") {
            self.content.project_id = Some(project);
        }
        if let Some(dataset) = get("SANITY_DATASET") {
            self.content.dataset = dataset;
        }
        if let Some(token) = get("SANITY_API_TOKEN") {
            self.content.token = Some(token);
        }
        if let Some(form) = get("FORM_ENDPOINT_ID") {
            self.site.form_endpoint_id = Some(form);
        }
        if let Some(admins) = get("ADMIN_EMAILS") {
            self.auth.admin_emails = admins
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    /// Fail fast on configuration the server cannot run without.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!("DATABASE_URL is not configured");
        }
        match self.auth.secret.as_deref() {
            None | Some("") => anyhow::bail!("SESSION_SECRET is not configured"),
            Some(secret) if secret.len() < 32 => {
                tracing::warn!("SESSION_SECRET is shorter than 32 bytes");
            }
            Some(_) => {}
        }
        let prefix = self.site.member_prefix.trim_end_matches('/');
        if !self.site.member_prefix.starts_with('/') {
            anyhow::bail!("site.member_prefix must start with '/'");
        }
        // The gate would redirect the sign-in page to itself
        if prefix.is_empty()
            || [SIGN_IN_PATH, SIGN_UP_PATH]
                .iter()
                .any(|page| under_prefix(page, prefix))
        {
            anyhow::bail!(
                "site.member_prefix '{}' would cover the auth pages",
                self.site.member_prefix
            );
        }
        Ok(())
    }

    pub fn database_url(&self) -> &str {
        self.database.url.as_deref().unwrap_or_default()
    }

    pub fn session_secret(&self) -> &[u8] {
        self.auth.secret.as_deref().unwrap_or_default().as_bytes()
    }

    pub fn form_action(&self) -> Option<String> {
        self.site
            .form_endpoint_id
            .as_ref()
            .map(|id| format!("https://formspree.io/f/{}", id))
    }
}
