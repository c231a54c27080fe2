use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

use backups::audit::AuditLogger;
use backups::cli::{run_script, run_shell, Session};
use backups::config::{BackupPaths, Settings};

#[derive(Parser)]
#[command(
    name = "backups",
    version,
    about = "Restore-point chains with pluggable retention policies",
    long_about = "Manages backups as chains of full and incremental restore points. \
                  Deleting a point merges it into its incremental successor, and \
                  retention policies decide which old points cleanup removes."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (default)
    Shell,

    /// Execute a file of shell commands
    Run {
        /// Script with one command per line
        script: PathBuf,

        /// Report failing commands and continue
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Write the default settings file
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = BackupPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let mut session = open_session(&paths, settings)?;
            let stdin = io::stdin();
            run_shell(
                &mut session,
                stdin.lock(),
                &mut io::stdout(),
                &mut io::stderr(),
            )?;
        }
        Commands::Run { script, keep_going } => {
            let mut session = open_session(&paths, settings)?;
            let summary = run_script(
                &mut session,
                &script,
                keep_going,
                &mut io::stdout(),
                &mut io::stderr(),
            )?;
            if !summary.failures.is_empty() {
                bail!(
                    "{} of {} command(s) failed",
                    summary.failures.len(),
                    summary.failures.len() + summary.executed
                );
            }
        }
        Commands::Init => {
            settings.save(&paths)?;
            println!("Settings written to {}", paths.settings_file().display());
        }
        Commands::Config => {
            println!("backup-chain Configuration");
            println!("==========================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!(
                "  Default snapshot: {}",
                if settings.default_incremental { "inc" } else { "full" }
            );
            println!("  Default limit:    {}", settings.default_policy);
            println!("  Auto cleanup:     {}", settings.auto_cleanup);
            println!("  Audit enabled:    {}", settings.audit_enabled);
        }
    }

    Ok(())
}

fn open_session(paths: &BackupPaths, settings: Settings) -> Result<Session> {
    let audit = AuditLogger::new(paths.audit_log());
    Ok(Session::new(settings, Some(audit))?)
}
