#![cfg(feature = "web")]

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration, from flags or the environment.
///
/// A `.env` file in the working directory is loaded first when present.
#[derive(Clone, Debug, Parser)]
#[command(name = "website", about = "Store/SKU planning service backed by a workbook")]
pub struct Config {
    /// Workbook holding the Stores, SKUs and Calculations sheets
    #[arg(long, env = "WORKBOOK_PATH", default_value = "data/planning.xlsx")]
    pub workbook: PathBuf,

    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Secret used to sign login tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Email of the single configured account
    #[arg(long, env = "USER_EMAIL")]
    pub user_email: Option<String>,

    /// Argon2 hash of the account password (see the hash_password binary)
    #[arg(long, env = "USER_PASSWORD", hide_env_values = true)]
    pub user_password: Option<String>,

    /// Lifetime of issued tokens, in seconds
    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 3600)]
    pub token_ttl_secs: i64,

    /// Require a bearer token on the data endpoints as well
    #[arg(long, env = "PROTECT_API", default_value_t = false)]
    pub protect_api: bool,

    /// Directory of static presentation files served at `/`
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Parse the process arguments after loading `.env`.
    pub fn load() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("ignoring unreadable .env file: {}", e);
            }
        }
        Config::parse()
    }

    /// Configuration for a workbook with every optional setting left unset.
    pub fn for_workbook(workbook: impl Into<PathBuf>) -> Self {
        Config {
            workbook: workbook.into(),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            jwt_secret: None,
            user_email: None,
            user_password: None,
            token_ttl_secs: 3600,
            protect_api: false,
            static_dir: None,
        }
    }
}
