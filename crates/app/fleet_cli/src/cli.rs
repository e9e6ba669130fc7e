use clap::{Parser, Subcommand};
use fleet_core::config::DEFAULT_MAX_LOCKOUT_MINUTES;

#[derive(Parser, Debug)]
#[command(name = "fleet_cli", about = "Fleet authentication tooling", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Print the lockout and counter windows for consecutive failed logins.
    LockoutSchedule {
        /// Lockout ceiling in minutes; `<= 0` disables throttling.
        #[arg(
            long,
            env = "API_MAXIMUM_ACCOUNT_LOCKOUT",
            default_value_t = DEFAULT_MAX_LOCKOUT_MINUTES,
            allow_hyphen_values = true
        )]
        max_minutes: i64,

        /// Number of consecutive failures to show.
        #[arg(long, default_value_t = 10)]
        attempts: u32,
    },

    /// Hash a password with bcrypt.
    HashPassword {
        password: String,
    },

    /// Compute a device fingerprint.
    Fingerprint {
        #[arg(long)]
        tenant: String,

        #[arg(long)]
        mac: Option<String>,

        #[arg(long, default_value = "")]
        public_key: String,

        #[arg(long, default_value = "")]
        hostname: String,
    },

    /// Run failed and successful logins against an in-memory account and
    /// report what the throttle does.
    Drill {
        /// Wrong-password attempts before the final correct one.
        #[arg(long, default_value_t = 3)]
        failures: u32,

        /// Source address the attempts come from.
        #[arg(long, default_value = "127.0.0.1")]
        source: String,

        /// Lockout ceiling in minutes; `<= 0` disables throttling.
        #[arg(
            long,
            env = "API_MAXIMUM_ACCOUNT_LOCKOUT",
            default_value_t = DEFAULT_MAX_LOCKOUT_MINUTES,
            allow_hyphen_values = true
        )]
        max_minutes: i64,
    },
}
