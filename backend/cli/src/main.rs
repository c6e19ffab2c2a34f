mod audit_cmd;
mod doctor_cmd;
mod report;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::warn;

use terminal_output::{note_error, note_warn};

#[derive(Parser)]
#[command(name = "sink-audit")]
#[command(about = "Audit the IAM grants of a logging sink's writer identity")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.sink-audit/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive; overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a live sink against its destination's IAM policy
    Audit {
        /// Name of the logging sink
        #[arg(long, alias = "sink_name")]
        sink_name: String,

        /// Project that owns the sink
        #[arg(long, alias = "project_id")]
        project_id: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Audit an exported IAM policy file without calling any API
    Check {
        /// Writer identity, with or without the `serviceAccount:` prefix
        #[arg(long)]
        writer_identity: String,

        /// Sink destination URI
        #[arg(long)]
        destination: String,

        /// Exported policy (JSON, or YAML for .yaml/.yml)
        #[arg(long)]
        policy: PathBuf,

        /// Sink name shown in the report
        #[arg(long, default_value = "exported-policy")]
        sink_name: String,

        /// Project shown in the report
        #[arg(long, default_value = "-")]
        project_id: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check credentials, endpoints and config
    Doctor,
}

#[tokio::main]
async fn main() -> ExitCode {
    run(Cli::parse()).await
}

/// Load config, start logging, and run one command.
///
/// Any error exits 1. A completed audit exits 0 whether or not it found
/// excess roles.
async fn run(cli: Cli) -> ExitCode {
    let (config, validation) = match sinkaudit_config::load_and_prepare(cli.config.as_deref()).await
    {
        Ok(loaded) => loaded,
        Err(e) => {
            note_error(&format!("Error: {e:#}"));
            return ExitCode::FAILURE;
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(config.log_level());
    let _guard = logging::init_logger(level, config.log_dir());
    for warning in &validation.warnings {
        warn!(path = %warning.path, "{}", warning.message);
        note_warn(&warning.to_string());
    }

    let result = match cli.command {
        Commands::Audit {
            sink_name,
            project_id,
            json,
        } => audit_cmd::run(&config, &sink_name, &project_id, json).await,
        Commands::Check {
            writer_identity,
            destination,
            policy,
            sink_name,
            project_id,
            json,
        } => {
            audit_cmd::run_offline(
                &writer_identity,
                &destination,
                &policy,
                &sink_name,
                &project_id,
                json,
            )
            .await
        }
        Commands::Doctor => doctor_cmd::run(&config).await,
    };

    exit_code(result)
}

fn exit_code(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            note_error(&format!("Error: {e:#}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_audit_flags() {
        let cli = Cli::parse_from([
            "sink-audit",
            "audit",
            "--sink-name",
            "audit-sink",
            "--project-id",
            "acme",
            "--json",
        ]);
        match cli.command {
            Commands::Audit {
                sink_name,
                project_id,
                json,
            } => {
                assert_eq!(sink_name, "audit-sink");
                assert_eq!(project_id, "acme");
                assert!(json);
            }
            _ => panic!("expected audit"),
        }
    }

    #[test]
    fn accepts_underscore_aliases() {
        let cli = Cli::parse_from([
            "sink-audit",
            "audit",
            "--sink_name",
            "s",
            "--project_id",
            "p",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Audit { ref sink_name, ref project_id, json: false }
                if sink_name == "s" && project_id == "p"
        ));
    }

    #[test]
    fn audit_requires_both_names() {
        assert!(Cli::try_parse_from(["sink-audit", "audit", "--sink-name", "s"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["sink-audit", "doctor", "--log-level", "debug"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn check_defaults_report_labels() {
        let cli = Cli::parse_from([
            "sink-audit",
            "check",
            "--writer-identity",
            "w@x.iam.gserviceaccount.com",
            "--destination",
            "storage.googleapis.com/b",
            "--policy",
            "policy.json",
        ]);
        match cli.command {
            Commands::Check {
                sink_name,
                project_id,
                ..
            } => {
                assert_eq!(sink_name, "exported-policy");
                assert_eq!(project_id, "-");
            }
            _ => panic!("expected check"),
        }
    }

    const WRITER: &str = "serviceAccount:service-8@gcp-sa-logging.iam.gserviceaccount.com";

    /// Write an empty config and `policy` to a fresh temp dir.
    async fn fixture(name: &str, policy: serde_json::Value) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("sink-audit-{name}-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let config = dir.join("config.yaml");
        let policy_path = dir.join("policy.json");
        tokio::fs::write(&config, "").await.unwrap();
        tokio::fs::write(&policy_path, policy.to_string()).await.unwrap();
        (config, policy_path)
    }

    async fn check(name: &str, destination: &str, policy: serde_json::Value) -> ExitCode {
        let (config, policy) = fixture(name, policy).await;
        let config_arg = config.display().to_string();
        let policy_arg = policy.display().to_string();
        let cli = Cli::parse_from([
            "sink-audit",
            "--config",
            config_arg.as_str(),
            "check",
            "--writer-identity",
            WRITER,
            "--destination",
            destination,
            "--policy",
            policy_arg.as_str(),
        ]);
        let code = run(cli).await;
        let _ = tokio::fs::remove_dir_all(config.parent().unwrap()).await;
        code
    }

    #[tokio::test]
    async fn findings_still_exit_zero() {
        let code = check(
            "findings",
            "storage.googleapis.com/acme-logs",
            serde_json::json!({"bindings": [
                {"role": "roles/storage.objectCreator", "members": [WRITER]},
                {"role": "roles/storage.admin", "members": [WRITER]}
            ]}),
        )
        .await;
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[tokio::test]
    async fn clean_policy_exits_zero() {
        let code = check(
            "clean",
            "pubsub.googleapis.com/projects/acme/topics/log-stream",
            serde_json::json!({"bindings": [
                {"role": "roles/pubsub.publisher", "members": [WRITER]}
            ]}),
        )
        .await;
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[tokio::test]
    async fn unsupported_destination_exits_one() {
        let code = check(
            "unsupported",
            "logging.googleapis.com/projects/acme/locations/global/buckets/_Default",
            serde_json::json!({"bindings": []}),
        )
        .await;
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn missing_config_file_exits_one() {
        let cli = Cli::parse_from([
            "sink-audit",
            "--config",
            "/nonexistent/sink-audit/config.yaml",
            "doctor",
        ]);
        assert_eq!(run(cli).await, ExitCode::FAILURE);
    }

    #[test]
    fn exit_code_maps_errors_to_failure() {
        assert_eq!(exit_code(Ok(())), ExitCode::SUCCESS);
        assert_eq!(exit_code(Err(anyhow::anyhow!("boom"))), ExitCode::FAILURE);
    }
}
