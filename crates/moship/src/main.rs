use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use moship_sdk::{PipelineConfig, Platform, ReleaseError, RunMode, artifact, builders};
use std::fs;
use std::path::{Path, PathBuf};

use config::{AppIdentity, DistributionCredentials, ProjectConfig};
use distribution::{DistributionClient, UploadResult};
use telegram::{PipelineEvent, TelegramConfig, TelegramNotifier};

mod config;
mod distribution;
mod telegram;

/// CLI orchestrator for building, uploading, and announcing mobile releases.
#[derive(Parser, Debug)]
#[command(name = "moship", author, version, about = "Mobile release pipeline: build, upload to distribution, notify", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the release pipeline for an app project.
    Run {
        #[arg(long, help = "App project directory (defaults to the current directory)")]
        app_dir: Option<PathBuf>,
        #[arg(
            long,
            value_enum,
            help = "Target platform; auto-detected from the project layout when omitted"
        )]
        platform: Option<PlatformArg>,
        #[arg(long, help = "Sync sources (pull, submodules, dependency fetch) before building")]
        update: bool,
        #[arg(long, help = "Skip sync and build; upload an artifact that already exists on disk")]
        upload: bool,
    },
    /// Scaffold moship.toml and telegram.env templates for an app project.
    Init {
        #[arg(long, default_value = ".")]
        app_dir: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
#[clap(rename_all = "lowercase")]
enum PlatformArg {
    Ios,
    Android,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Ios => Platform::Ios,
            PlatformArg::Android => Platform::Android,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            app_dir,
            platform,
            update,
            upload,
        } => cmd_run(app_dir, platform.map(Into::into), update, upload),
        Command::Init { app_dir } => cmd_init(&app_dir),
    }
}

fn cmd_run(
    app_dir: Option<PathBuf>,
    platform: Option<Platform>,
    update: bool,
    upload: bool,
) -> Result<()> {
    let app_dir = config::resolve_app_dir(app_dir)?;
    let platform = config::detect_platform(&app_dir, platform)?;
    let pipeline = pipeline_config(app_dir, platform, update, upload);

    let project = ProjectConfig::load(&pipeline.app_dir)?;
    let creds = project.credentials()?;
    let identity = AppIdentity::load(&pipeline.app_dir, project.bundle_id(platform)?)?;
    let notifier = resolve_notifier(&pipeline.app_dir);

    println!(
        "Releasing {} {}+{} ({})",
        identity.app_name, identity.version_name, identity.build_number, platform
    );

    // One notification per terminal outcome, success or failure; notify
    // failures are logged, never escalated.
    match run_pipeline(&pipeline, &creds, project.endpoint(), &identity) {
        Ok(result) => {
            notify(
                notifier.as_ref(),
                &PipelineEvent::Success {
                    platform,
                    version: identity.version_name.clone(),
                    app_name: identity.app_name.clone(),
                    install_url: result.install_url.clone(),
                },
            );
            println!("Install URL: {}", result.install_url);
            Ok(())
        }
        Err(err) => {
            notify(
                notifier.as_ref(),
                &PipelineEvent::Failure {
                    platform,
                    version: identity.version_name.clone(),
                    error: err.to_string(),
                },
            );
            Err(err.into())
        }
    }
}

/// Builds the immutable per-run configuration from the CLI flags.
///
/// `--upload` selects upload-only mode, which also disables the pre-build
/// sync regardless of `--update`.
fn pipeline_config(
    app_dir: PathBuf,
    platform: Platform,
    update: bool,
    upload: bool,
) -> PipelineConfig {
    let mode = if upload {
        RunMode::UploadOnly
    } else {
        RunMode::BuildAndUpload
    };
    PipelineConfig {
        app_dir,
        platform,
        update_before_build: update && !upload,
        mode,
    }
}

/// Sequences sync, build, locate, and upload.
///
/// Stages run strictly in order; the first failure aborts the run. In
/// upload-only mode the artifact must already be resolvable, and a missing
/// artifact fails here before any network call is attempted.
fn run_pipeline(
    pipeline: &PipelineConfig,
    creds: &DistributionCredentials,
    endpoint: Option<&str>,
    identity: &AppIdentity,
) -> Result<UploadResult, ReleaseError> {
    if pipeline.mode == RunMode::BuildAndUpload {
        if pipeline.update_before_build {
            builders::sync_sources(&pipeline.app_dir)?;
        }
        match pipeline.platform {
            Platform::Android => builders::AndroidBuilder::new(&pipeline.app_dir).build()?,
            Platform::Ios => builders::IosBuilder::new(&pipeline.app_dir).build()?,
        }
    }

    let found = artifact::find(&pipeline.app_dir, pipeline.platform).ok_or_else(|| {
        ReleaseError::ArtifactNotFound {
            platform: pipeline.platform,
            searched: artifact::search_dirs(&pipeline.app_dir, pipeline.platform),
        }
    })?;
    println!("Found artifact: {}", found.path.display());

    let client = DistributionClient::new(creds.clone(), endpoint)?;
    client.upload(pipeline.platform, identity, &found.path)
}

fn resolve_notifier(app_dir: &Path) -> Option<TelegramNotifier> {
    let config = TelegramConfig::load(app_dir)?;
    match TelegramNotifier::new(config) {
        Ok(notifier) => Some(notifier),
        Err(err) => {
            eprintln!("Warning: cannot initialize Telegram notifier: {err:#}");
            None
        }
    }
}

fn notify(notifier: Option<&TelegramNotifier>, event: &PipelineEvent) {
    let Some(notifier) = notifier else { return };
    if let Err(err) = notifier.notify(event) {
        eprintln!("Warning: failed to send Telegram notification: {err:#}");
    }
}

const CONFIG_TEMPLATE: &str = r#"# Distribution service credentials for moship.
[distribution]
user_id = ""
app_id = ""
key = ""
# endpoint = "https://api.mobiledrop.dev"

[ios]
bundle_identifier = "com.example.app"

[android]
package_name = "com.example.app"
"#;

const TELEGRAM_TEMPLATE: &str = "\
# Optional release notifications. Delete this file to disable them.
TELEGRAM_BOT_TOKEN=
TELEGRAM_CHAT_ID=
# TELEGRAM_TOPIC_ID=
";

fn cmd_init(app_dir: &Path) -> Result<()> {
    let config_path = app_dir.join(config::CONFIG_FILE_NAME);
    let telegram_path = app_dir.join(telegram::TELEGRAM_ENV_FILE);
    ensure_can_write(&config_path)?;
    ensure_can_write(&telegram_path)?;

    write_file(&config_path, CONFIG_TEMPLATE.as_bytes())?;
    write_file(&telegram_path, TELEGRAM_TEMPLATE.as_bytes())?;
    println!("Wrote starter config to {:?}", config_path);
    println!("Wrote notification template to {:?}", telegram_path);
    Ok(())
}

fn ensure_can_write(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing file: {:?}", path);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory {:?}", parent))?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("writing file {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_creds() -> DistributionCredentials {
        DistributionCredentials {
            user_id: "u".into(),
            app_id: "a".into(),
            key: "k".into(),
        }
    }

    fn dummy_identity() -> AppIdentity {
        AppIdentity {
            version_name: "1.2.3".into(),
            build_number: 4,
            app_name: "demo_app".into(),
            bundle_id: "com.example.demo".into(),
        }
    }

    #[test]
    fn upload_flag_selects_upload_only_and_disables_sync() {
        let cfg = pipeline_config(PathBuf::from("/app"), Platform::Android, true, true);
        assert_eq!(cfg.mode, RunMode::UploadOnly);
        assert!(!cfg.update_before_build);

        let cfg = pipeline_config(PathBuf::from("/app"), Platform::Android, true, false);
        assert_eq!(cfg.mode, RunMode::BuildAndUpload);
        assert!(cfg.update_before_build);
    }

    #[test]
    fn upload_only_without_artifact_fails_before_any_network_call() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline_config(tmp.path().to_path_buf(), Platform::Android, false, true);

        // Fails at the locating stage; reaching the protocol client would
        // require a network round-trip, which this test environment has no
        // server for.
        let err = run_pipeline(&pipeline, &dummy_creds(), None, &dummy_identity()).unwrap_err();
        assert!(matches!(err, ReleaseError::ArtifactNotFound { .. }));
    }

    #[test]
    fn upload_only_resolves_existing_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("build/app/outputs/bundle/release");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app-release.aab"), b"bundle").unwrap();

        let found = artifact::find(tmp.path(), Platform::Android).unwrap();
        assert!(found.path.ends_with("app-release.aab"));
    }

    #[test]
    fn init_scaffolds_loadable_config() {
        let tmp = tempfile::tempdir().unwrap();
        cmd_init(tmp.path()).unwrap();

        let cfg = ProjectConfig::load(tmp.path()).unwrap();
        // Placeholders parse but do not validate as credentials.
        assert!(cfg.credentials().is_err());
        // The template notification file is incomplete, so notifications
        // stay disabled until the user fills it in.
        assert!(TelegramConfig::load(tmp.path()).is_none());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        cmd_init(tmp.path()).unwrap();
        let err = cmd_init(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
    }
}
