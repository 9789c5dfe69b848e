//! Creates an approved administrator account without going through
//! registration and review.

use anyhow::Context;
use application::AlumniApp;
use clap::{Parser, ValueEnum};
use config::Config;
use domain::Role;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AdminRole {
    AlumniAssociationAdmin,
    SuperAdmin,
}

impl From<AdminRole> for Role {
    fn from(role: AdminRole) -> Self {
        match role {
            AdminRole::AlumniAssociationAdmin => Role::AlumniAssociationAdmin,
            AdminRole::SuperAdmin => Role::SuperAdmin,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "alumni-link-admin",
    about = "Bootstrap an Alumni Link administrator account",
    version
)]
struct CliArgs {
    #[arg(long)]
    email: String,
    /// Read from `ADMIN_PASSWORD` when omitted.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long = "name", value_name = "display name")]
    display_name: String,
    #[arg(long, value_enum, default_value_t = AdminRole::AlumniAssociationAdmin)]
    role: AdminRole,
    /// `.env` file to load instead of the one in the working directory.
    #[arg(long = "env-file", value_name = "path")]
    env_file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = Config::from_env(args.env_file.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    let app = AlumniApp::new(&config).context("failed to open the database")?;
    let admin = app
        .bootstrap_admin(&args.email, &args.password, &args.display_name, args.role.into())
        .await
        .with_context(|| format!("could not create administrator {}", args.email))?;

    info!(uid = %admin.uid, email = %admin.email, role = %admin.role, "administrator ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_flag() {
        let args = CliArgs::try_parse_from([
            "alumni-link-admin",
            "--email",
            "root@example.com",
            "--password",
            "secret1",
            "--name",
            "Root Admin",
            "--role",
            "super-admin",
        ])
        .unwrap();
        assert_eq!(Role::from(args.role), Role::SuperAdmin);
        assert!(args.env_file.is_none());
    }

    #[test]
    fn unknown_roles_are_refused() {
        let parsed = CliArgs::try_parse_from([
            "alumni-link-admin",
            "--email",
            "x@example.com",
            "--password",
            "secret1",
            "--name",
            "X",
            "--role",
            "alumni",
        ]);
        assert!(parsed.is_err());
    }
}
