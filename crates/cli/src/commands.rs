use clap::{Args, Subcommand};

/// Where rows come from, shared by every streaming command.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Data format: "mysql", "pg" or "csv"
    #[arg(long)]
    pub format: String,

    /// Connection string, or the file path for CSV. Defaults to
    /// PAGESTREAM_DATABASE_URL.
    #[arg(long)]
    pub conn_str: Option<String>,

    #[arg(long, default_value = "user_data")]
    pub table: String,

    /// Columns giving a stable row order, e.g. "user_id" or "age desc,email"
    #[arg(long, value_delimiter = ',')]
    pub order_by: Vec<String>,

    /// Columns to select; all when omitted
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    #[arg(long, default_value_t = 100)]
    pub page_size: u64,

    /// Retry transient database failures with backoff
    #[arg(long)]
    pub retry: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every row as a JSON line
    Stream {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print each page as a header line followed by its rows
    Pages {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print rows whose numeric column is greater than --min
    Batch {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, default_value = "age")]
        column: String,

        #[arg(long, default_value_t = 25.0)]
        min: f64,
    },
    /// Mean of a numeric column, computed one row at a time
    Average {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, default_value = "age")]
        column: String,
    },
    /// Create the users table and load it from a CSV file
    Seed {
        /// Data format: "mysql" or "pg"
        #[arg(long)]
        format: String,

        #[arg(long)]
        conn_str: Option<String>,

        /// CSV with a name,email,age header
        #[arg(long)]
        csv: String,

        #[arg(long, default_value = "user_data")]
        table: String,
    },
    /// Test a connection string against a given format
    TestConn {
        /// Data format: "mysql", "pg" or "csv"
        #[arg(long)]
        format: String,

        /// Connection string or file path
        #[arg(long)]
        conn_str: Option<String>,
    },
}
