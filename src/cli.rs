use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "datalens", about = "DataLens analysis backend", version)]
pub struct Cli {
    /// Host address to bind to.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port number to bind to.
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// CORS allowed origins (comma-separated, or `*`).
    #[arg(
        long = "cors-origin",
        default_value = "http://localhost:3000,http://127.0.0.1:3000"
    )]
    pub cors_origin: String,
}
