// Server configuration.
//
// Everything comes from the environment so the engine can run from a plain
// systemd unit:
//   SIGNAGE_BIND                 listen address        (127.0.0.1:3000)
//   SIGNAGE_DB_PATH              SQLite file           (signage.db)
//   SIGNAGE_UTC_OFFSET           local civil offset    (+07:00)
//   SIGNAGE_BERBUKA_WINDOW_SECS  celebration length    (300)

use std::net::SocketAddr;

use anyhow::Context;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::state::DEFAULT_BERBUKA_WINDOW;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub db_path: String,
    pub utc_offset: UtcOffset,
    pub berbuka_window: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind = lookup("SIGNAGE_BIND")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .context("SIGNAGE_BIND")?;

        let db_path = lookup("SIGNAGE_DB_PATH").unwrap_or_else(|| "signage.db".to_string());

        let utc_offset = match lookup("SIGNAGE_UTC_OFFSET") {
            Some(raw) => parse_offset(&raw).with_context(|| format!("SIGNAGE_UTC_OFFSET={raw}"))?,
            None => UtcOffset::from_hms(7, 0, 0)?,
        };

        let berbuka_window = match lookup("SIGNAGE_BERBUKA_WINDOW_SECS") {
            Some(raw) => {
                let secs: u32 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SIGNAGE_BERBUKA_WINDOW_SECS={raw}"))?;
                Duration::seconds(i64::from(secs))
            }
            None => DEFAULT_BERBUKA_WINDOW,
        };

        Ok(Self {
            bind,
            db_path,
            utc_offset,
            berbuka_window,
        })
    }
}

fn parse_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    let offset = UtcOffset::parse(
        raw.trim(),
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )?;
    Ok(offset)
}

/// Source of "now" in the schedule's civil time.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System(UtcOffset),
    Fixed(PrimitiveDateTime),
}

impl Clock {
    pub fn now(&self) -> PrimitiveDateTime {
        match *self {
            Clock::System(offset) => {
                let now = OffsetDateTime::now_utc().to_offset(offset);
                PrimitiveDateTime::new(now.date(), now.time())
            }
            Clock::Fixed(at) => at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(cfg.db_path, "signage.db");
        assert_eq!(cfg.utc_offset, UtcOffset::from_hms(7, 0, 0).unwrap());
        assert_eq!(cfg.berbuka_window, Duration::seconds(300));
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("SIGNAGE_BIND", "0.0.0.0:8080"),
            ("SIGNAGE_DB_PATH", "/var/lib/signage/signage.db"),
            ("SIGNAGE_UTC_OFFSET", "+08:00"),
            ("SIGNAGE_BERBUKA_WINDOW_SECS", "600"),
        ])
        .unwrap();
        assert_eq!(cfg.bind.port(), 8080);
        assert_eq!(cfg.db_path, "/var/lib/signage/signage.db");
        assert_eq!(cfg.utc_offset, UtcOffset::from_hms(8, 0, 0).unwrap());
        assert_eq!(cfg.berbuka_window, Duration::minutes(10));
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(config(&[("SIGNAGE_UTC_OFFSET", "WIB")]).is_err());
        assert!(config(&[("SIGNAGE_BERBUKA_WINDOW_SECS", "-5")]).is_err());
        assert!(config(&[("SIGNAGE_BIND", "localhost")]).is_err());
    }

    #[test]
    fn system_clock_applies_offset() {
        let utc = Clock::System(UtcOffset::UTC).now();
        let wib = Clock::System(UtcOffset::from_hms(7, 0, 0).unwrap()).now();
        let diff = (wib - utc).whole_minutes();
        assert!((419..=421).contains(&diff), "diff was {diff}");
    }
}
