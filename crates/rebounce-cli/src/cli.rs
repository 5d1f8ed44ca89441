use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rebounce")]
#[command(version, about = "Rebounce - restart scheduling and completion notices for a managed bot core")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to ~/.rebounce/rebounce.db)
    #[arg(long, global = true, env = "REBOUNCE_DB_PATH")]
    pub db_path: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the daemon: fire recurring restarts and announce completed ones
    Run,

    /// Request an immediate core restart
    Restart(RestartArgs),

    /// Manage the recurring restart schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Show dashboard reachability, pending restarts and the schedule
    Status,
}

#[derive(Args)]
pub struct RestartArgs {
    /// Session to notify once the restart completes (defaults to nobody)
    #[arg(short, long)]
    pub session: Option<String>,

    /// Platform the completion notice is addressed through
    #[arg(short, long)]
    pub platform: Option<String>,
}

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Set the recurring trigger
    Set(SetArgs),

    /// Turn the recurring restart on
    Enable,

    /// Turn the recurring restart off
    Disable,

    /// Show the configured schedule
    Show,

    /// Remove the recurring trigger
    Clear,
}

#[derive(Args)]
pub struct SetArgs {
    /// Five-field cron expression, e.g. "0 3 * * *"
    #[arg(long, conflicts_with_all = ["daily", "every"])]
    pub cron: Option<String>,

    /// Daily wall-clock time as HH:MM
    #[arg(long, conflicts_with = "every")]
    pub daily: Option<String>,

    /// Fixed interval in seconds
    #[arg(long)]
    pub every: Option<u64>,

    /// IANA timezone the trigger is evaluated in, e.g. Asia/Shanghai
    #[arg(long)]
    pub timezone: Option<String>,
}
