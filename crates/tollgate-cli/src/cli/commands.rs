use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a credential pair obtained from a login or registration
    Login {
        /// Access token (three-segment JWT)
        #[arg(long, env = "TOLLGATE_ACCESS_TOKEN")]
        access_token: String,

        /// Refresh token
        #[arg(long, env = "TOLLGATE_REFRESH_TOKEN")]
        refresh_token: String,

        /// The session comes from a registration that just completed
        #[arg(long)]
        registered: bool,

        /// Opaque user profile JSON to keep alongside the tokens
        #[arg(long)]
        profile: Option<String>,
    },

    /// Remove stored credentials and profile
    Logout,

    /// Show the stored session and its expiry
    Status,

    /// Send an authenticated request
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        /// Path relative to the configured base URL
        path: String,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
    },
}
