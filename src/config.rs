//! Layered configuration: built-in defaults, then `config.toml`, then
//! `PROFILE_*` environment variables (`__` separates nested keys, e.g.
//! `PROFILE_UPLOAD__DIR=/srv/uploads`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "PROFILE_";
/// Upper bound on `session.ttl_hours` (one year).
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:profile.sqlite".to_string(),
            loglevel: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,
    /// Drop the `Secure` attribute so cookies work over plain HTTP in development.
    pub insecure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            ttl_hours: 24,
            insecure_cookie: false,
        }
    }
}

impl SessionConfig {
    /// Session lifetime, rejected unless it lies in `1..=MAX_SESSION_TTL_HOURS`.
    pub fn ttl(&self) -> Result<chrono::Duration, ProfileError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.ttl_hours) {
            return Err(ProfileError::InvalidConfig(format!(
                "session.ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}, got {}",
                self.ttl_hours
            )));
        }
        chrono::Duration::try_hours(self.ttl_hours).ok_or_else(|| {
            ProfileError::InvalidConfig(format!("session.ttl_hours {} overflows", self.ttl_hours))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub url_prefix: String,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./uploads"),
            url_prefix: "/uploads".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { bcrypt_cost: 10 }
    }
}

impl Config {
    /// Load from the default file and environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment(CONFIG_FILE).extract()
    }

    pub fn figment(path: impl Into<PathBuf>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.into()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_apply_without_sources() {
        Jail::expect_with(|_jail| {
            let cfg: Config = Config::figment("missing.toml").extract()?;
            assert_eq!(cfg.basic.listen_addr, "0.0.0.0:8000");
            assert_eq!(cfg.session.cookie_name, "session");
            assert_eq!(cfg.security.bcrypt_cost, 10);
            assert_eq!(cfg.upload.url_prefix, "/uploads");
            Ok(())
        });
    }

    #[test]
    fn file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "profile.toml",
                r#"
                [upload]
                dir = "/srv/images"
                url_prefix = "/static/img"

                [session]
                ttl_hours = 2
                "#,
            )?;
            jail.set_env("PROFILE_SESSION__TTL_HOURS", "6");
            jail.set_env("PROFILE_BASIC__LOGLEVEL", "debug");

            let cfg: Config = Config::figment("profile.toml").extract()?;
            assert_eq!(cfg.upload.dir, PathBuf::from("/srv/images"));
            assert_eq!(cfg.upload.url_prefix, "/static/img");
            assert_eq!(cfg.session.ttl_hours, 6);
            assert_eq!(cfg.basic.loglevel, "debug");
            assert_eq!(cfg.session.cookie_name, "session");
            Ok(())
        });
    }

    #[test]
    fn session_ttl_is_bounded() {
        let mut session = SessionConfig::default();
        assert_eq!(session.ttl().unwrap(), chrono::Duration::hours(24));

        session.ttl_hours = MAX_SESSION_TTL_HOURS;
        assert!(session.ttl().is_ok());

        for hours in [0, -1, MAX_SESSION_TTL_HOURS + 1, i64::MAX, i64::MIN] {
            session.ttl_hours = hours;
            assert!(
                matches!(session.ttl(), Err(ProfileError::InvalidConfig(_))),
                "ttl_hours = {hours}"
            );
        }
    }
}
