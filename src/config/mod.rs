use rust_decimal::Decimal;
use std::env;

/// Default lifetime of a quote, in seconds.
pub const DEFAULT_QUOTE_VALIDITY_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,

    // Quoting
    pub quote_validity_secs: i64,

    // Risk limits (both unset → pass-through policy)
    pub risk_max_stake: Option<Decimal>,
    pub risk_max_payout_per_bucket: Option<Decimal>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),

            quote_validity_secs: env::var("QUOTE_VALIDITY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs: &i64| *secs > 0)
                .unwrap_or(DEFAULT_QUOTE_VALIDITY_SECS),

            risk_max_stake: parse_decimal_var("RISK_MAX_STAKE")?,
            risk_max_payout_per_bucket: parse_decimal_var("RISK_MAX_PAYOUT_PER_BUCKET")?,
        })
    }

    /// Config for tests and local tooling: everything defaulted except the URL.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".into(),
            port: 0,
            db_max_connections: 5,
            quote_validity_secs: DEFAULT_QUOTE_VALIDITY_SECS,
            risk_max_stake: None,
            risk_max_payout_per_bucket: None,
        }
    }

    /// Returns true if any risk limit is configured.
    pub fn has_risk_limits(&self) -> bool {
        self.risk_max_stake.is_some() || self.risk_max_payout_per_bucket.is_some()
    }

    pub fn quote_validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.quote_validity_secs)
    }
}

fn parse_decimal_var(name: &str) -> anyhow::Result<Option<Decimal>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            let value: Decimal = raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{name} is not a valid decimal: {e}"))?;
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}
