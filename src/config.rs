use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments, read once at start.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, R2, ...).
    pub endpoint_url: Option<String>,
    pub staging_dir: PathBuf,
    pub public_dir: PathBuf,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "HTTP gateway for an S3-compatible bucket")]
pub struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Target bucket (overrides AWS_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Store region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom store endpoint (overrides AWS_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Directory holding uploads until they are forwarded (overrides STAGING_DIR)
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Directory of static assets served at `/` (overrides PUBLIC_DIR)
    #[arg(long)]
    pub public_dir: Option<PathBuf>,
}

const DEFAULT_PORT: u16 = 3000;

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::from_sources(args, |name| env::var(name).ok())
    }

    /// Merge CLI arguments over values produced by `lookup` (normally the
    /// process environment).
    pub fn from_sources<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty variables count as unset.
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let env_port = match var("PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            None => DEFAULT_PORT,
        };

        let bucket = match args.bucket.or_else(|| var("AWS_BUCKET_NAME")) {
            Some(bucket) => bucket,
            None => bail!("AWS_BUCKET_NAME must be set (or pass --bucket)"),
        };

        let cfg = Self {
            host: args
                .host
                .or_else(|| var("HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            bucket,
            region: args
                .region
                .or_else(|| var("AWS_REGION"))
                .unwrap_or_else(|| "us-east-1".into()),
            access_key_id: var("AWS_ACCESS_KEY_ID"),
            secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            endpoint_url: args.endpoint_url.or_else(|| var("AWS_ENDPOINT_URL")),
            staging_dir: args
                .staging_dir
                .or_else(|| var("STAGING_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            public_dir: args
                .public_dir
                .or_else(|| var("PUBLIC_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("./public")),
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Static credentials, only when both halves are configured.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) => Some((key.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .field("staging_dir", &self.staging_dir)
            .field("public_dir", &self.public_dir)
            .finish()
    }
}
