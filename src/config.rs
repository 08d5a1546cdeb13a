use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub credit_pro_base_url: String,
    pub credit_pro_user: String,
    pub credit_pro_pass: String,
    /// Scoring criterion sent on every transaction request.
    pub credit_pro_criterion: u32,
    /// Number of CPFs queried concurrently per group.
    pub batch_size: usize,
    /// Cooldown between groups, in milliseconds.
    pub batch_pause_ms: u64,
    /// Per-CPF attempt budget (first attempt included).
    pub fetch_max_attempts: u32,
    pub reports_dir: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            credit_pro_base_url: std::env::var("CREDIT_PRO_URL")
                .or_else(|_| std::env::var("URL_CREDIT_PRO"))
                .map_err(|_| {
                    anyhow::anyhow!("CREDIT_PRO_URL or URL_CREDIT_PRO environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("CREDIT_PRO_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("CREDIT_PRO_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })?,
            credit_pro_user: std::env::var("CREDIT_PRO_USER")
                .map_err(|_| anyhow::anyhow!("CREDIT_PRO_USER environment variable required"))
                .and_then(|user| {
                    if user.trim().is_empty() {
                        anyhow::bail!("CREDIT_PRO_USER cannot be empty");
                    }
                    Ok(user)
                })?,
            credit_pro_pass: std::env::var("CREDIT_PRO_PASS")
                .map_err(|_| anyhow::anyhow!("CREDIT_PRO_PASS environment variable required"))
                .and_then(|pass| {
                    if pass.trim().is_empty() {
                        anyhow::bail!("CREDIT_PRO_PASS cannot be empty");
                    }
                    Ok(pass)
                })?,
            credit_pro_criterion: std::env::var("CREDIT_PRO_CRITERION")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("CREDIT_PRO_CRITERION must be a valid number"))?,
            batch_size: std::env::var("BATCH_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| anyhow::anyhow!("BATCH_SIZE must be a positive number"))?,
            batch_pause_ms: std::env::var("BATCH_PAUSE_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BATCH_PAUSE_MS must be a valid number"))?,
            fetch_max_attempts: std::env::var("FETCH_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| anyhow::anyhow!("FETCH_MAX_ATTEMPTS must be a positive number"))?,
            reports_dir: std::env::var("REPORTS_DIR").unwrap_or_else(|_| "reports".to_string()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Credit Pro Base URL: {}", config.credit_pro_base_url);
        tracing::debug!("Credit Pro criterion: {}", config.credit_pro_criterion);
        tracing::debug!(
            "Batch tuning: size={}, pause={}ms, max_attempts={}",
            config.batch_size,
            config.batch_pause_ms,
            config.fetch_max_attempts
        );
        tracing::debug!("Reports directory: {}", config.reports_dir);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
