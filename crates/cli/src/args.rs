use clap::Parser;
use engine_config::settings::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_MYSQL_URL, DEFAULT_WORKERS, TransferSettings,
};

#[derive(Parser, Debug)]
#[command(
    name = "tablepush",
    version,
    about = "Upload a MySQL table to an HTTP ingestion endpoint in JSON batches",
    after_help = "Example:\n  $ tablepush \\\n      --source-table src_tbl \\\n      --destination-table target_tbl \\\n      --host localhost \\\n      --port 9175 \\\n      --database target_db \\\n      --mysql \"mysql://localhost:3306/mydb?user=root\""
)]
pub struct Cli {
    /// Table to read from
    #[arg(long, alias = "source_table")]
    pub source_table: String,

    /// Table to write to on the destination
    #[arg(long, alias = "destination_table")]
    pub destination_table: String,

    /// Destination host
    #[arg(long)]
    pub host: String,

    /// Destination port
    #[arg(long)]
    pub port: u16,

    /// Destination database
    #[arg(long)]
    pub database: String,

    /// Raw SQL predicate appended after WHERE
    #[arg(long)]
    pub filter: Option<String>,

    /// Rows per uploaded batch
    #[arg(long, alias = "batch_size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Number of upload threads
    #[arg(long, alias = "upload_threads", default_value_t = DEFAULT_WORKERS)]
    pub upload_threads: usize,

    /// Upload attempts per batch before giving up
    #[arg(long, alias = "max_retries", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: usize,

    /// Sent as `Authorization: Token <auth-token>`
    #[arg(long, alias = "auth_token", env = "TABLEPUSH_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// MySQL connection string
    #[arg(long, default_value = DEFAULT_MYSQL_URL)]
    pub mysql: String,

    /// Minimum log level (trace, debug, info, warning, error)
    #[arg(long, default_value = "info")]
    pub loglevel: String,
}

impl Cli {
    pub fn to_settings(&self) -> TransferSettings {
        let mut settings = TransferSettings::new(
            &self.source_table,
            &self.destination_table,
            &self.host,
            self.port,
            &self.database,
        );
        settings.filter = self.filter.clone();
        settings.batch_size = self.batch_size;
        settings.workers = self.upload_threads;
        settings.max_retries = self.max_retries;
        settings.auth_token = self.auth_token.clone();
        settings.mysql_url = self.mysql.clone();
        settings
    }
}
