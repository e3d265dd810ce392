//! Command-line parsing and routing

use super::test_utils::with_isolated_config_home;
use clap::Parser;
use snaptree::cli::{Cli, Commands, RunContext};
use snaptree::WorkspaceError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_parse_apply_with_message() {
    let cli = Cli::try_parse_from([
        "snaptree",
        "--workspace",
        "/tmp/ws",
        "apply",
        "batch.json",
        "-m",
        "Rename docs",
    ])
    .unwrap();

    assert_eq!(cli.workspace, PathBuf::from("/tmp/ws"));
    match cli.command {
        Commands::Apply { batch, message } => {
            assert_eq!(batch, PathBuf::from("batch.json"));
            assert_eq!(message.as_deref(), Some("Rename docs"));
        }
        other => panic!("expected apply, got {:?}", other),
    }
}

#[test]
fn test_parse_log_limit_and_globals() {
    let cli = Cli::try_parse_from(["snaptree", "-v", "--log-format", "json", "log", "-n", "5"]).unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.log_format.as_deref(), Some("json"));
    assert!(matches!(cli.command, Commands::Log { limit: 5 }));

    let cli = Cli::try_parse_from(["snaptree", "log"]).unwrap();
    assert!(matches!(cli.command, Commands::Log { limit: 20 }));
}

#[test]
fn test_parse_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["snaptree", "push"]).is_err());
    assert!(Cli::try_parse_from(["snaptree", "apply"]).is_err());
}

#[test]
fn test_init_then_init_again() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("project");
    fs::create_dir_all(&root).unwrap();

    let context = with_isolated_config_home(&dir, || RunContext::new(root.clone(), None)).unwrap();
    let output = context.execute(&Commands::Init).unwrap();
    assert!(output.starts_with("Initialized empty snaptree workspace"));
    assert!(root.join(".snaptree/config.toml").is_file());

    assert!(matches!(
        context.execute(&Commands::Init),
        Err(WorkspaceError::AlreadyInitialized(_))
    ));
}

#[test]
fn test_commands_require_workspace() {
    let dir = TempDir::new().unwrap();
    let context =
        with_isolated_config_home(&dir, || RunContext::new(dir.path().to_path_buf(), None)).unwrap();

    assert!(matches!(
        context.execute(&Commands::Status),
        Err(WorkspaceError::NotInitialized(_))
    ));
    assert!(matches!(
        context.execute(&Commands::Show {
            path: "a.txt".to_string()
        }),
        Err(WorkspaceError::NotInitialized(_))
    ));
}

#[test]
fn test_apply_rejects_malformed_batch() {
    let dir = TempDir::new().unwrap();
    let batch = dir.path().join("batch.json");
    fs::write(&batch, r#"{"op": "write"}"#).unwrap();

    let context =
        with_isolated_config_home(&dir, || RunContext::new(dir.path().to_path_buf(), None)).unwrap();
    let result = context.execute(&Commands::Apply {
        batch,
        message: None,
    });
    assert!(matches!(result, Err(WorkspaceError::InvalidBatch(_))));

    let missing = context.execute(&Commands::Apply {
        batch: dir.path().join("absent.json"),
        message: None,
    });
    assert!(matches!(missing, Err(WorkspaceError::InvalidBatch(_))));
}

#[test]
fn test_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("custom.toml");
    fs::write(
        &config_path,
        "[identity]\nname = \"Grace Hopper\"\nemail = \"grace@example.com\"\n",
    )
    .unwrap();

    let context = RunContext::new(dir.path().to_path_buf(), Some(config_path)).unwrap();
    assert_eq!(context.config().identity.name.as_deref(), Some("Grace Hopper"));
    assert_eq!(context.config().repository.reference, "refs/heads/master");
}
