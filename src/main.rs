use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vmcore::TransformOutcome;
use vmcore::audio::{AudioSource, ContainerFormat};
use vmcore::types::{
    ActionType, AttachmentDescriptor, MessageFlags, UploadContainer, UploadPayload,
};
use vmhook::config::PluginConfig;
use vmhook::host::{CallArgs, MemoryHost};
use vmhook::plugin::Plugin;
use vmhook::settings::{JsonFileSettings, MemorySettings, SettingsStore};
use vmhook::transform::VoiceTransformer;

#[derive(Parser)]
#[command(name = "vmhook")]
#[command(about = "Voice message framing for audio attachments")]
struct Cli {
    /// JSON file with tuning overrides.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the voice attachment an audio file would be sent as.
    Analyze {
        file: PathBuf,
        /// Content type to report for the file. Guessed from its header when
        /// omitted.
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Send an upload of FILE through the plugin on an in-memory host.
    Simulate {
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
        /// Settings file; created with defaults if missing.
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PluginConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PluginConfig::default(),
    };

    match cli.command {
        Commands::Analyze { file, content_type } => analyze(&config, &file, content_type).await,
        Commands::Simulate {
            file,
            content_type,
            settings,
        } => simulate(config, &file, content_type, settings).await,
    }
}

async fn describe(
    path: &Path,
    content_type: Option<String>,
) -> anyhow::Result<AttachmentDescriptor> {
    let content_type = match content_type {
        Some(content_type) => content_type,
        None => {
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            match ContainerFormat::sniff(&data) {
                ContainerFormat::Wav => "audio/wav".to_string(),
                ContainerFormat::Ogg => "audio/ogg".to_string(),
                ContainerFormat::Unknown => "application/octet-stream".to_string(),
            }
        }
    };
    let mut desc = AttachmentDescriptor::new(content_type)
        .with_source(AudioSource::Path(path.to_path_buf()));
    if let Some(name) = path.file_name() {
        desc = desc.with_filename(name.to_string_lossy());
    }
    Ok(desc)
}

async fn analyze(
    config: &PluginConfig,
    path: &Path,
    content_type: Option<String>,
) -> anyhow::Result<()> {
    let mut desc = describe(path, content_type).await?;
    let transformer = VoiceTransformer::from_config(config);
    match transformer.transform(&mut desc).await? {
        TransformOutcome::Transformed => {}
        outcome => {
            return Err(anyhow!(
                "{} was not converted: {:?}",
                path.display(),
                outcome
            ));
        }
    }
    println!("{}", serde_json::to_string_pretty(&desc)?);
    Ok(())
}

async fn simulate(
    config: PluginConfig,
    path: &Path,
    content_type: Option<String>,
    settings_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let settings: Arc<dyn SettingsStore> = match settings_path {
        Some(path) => {
            let store = JsonFileSettings::open(&path)
                .with_context(|| format!("opening settings {}", path.display()))?;
            info!("Using settings from {}", store.path().display());
            Arc::new(store)
        }
        None => Arc::new(MemorySettings::new()),
    };

    let host = Arc::new(MemoryHost::new());
    let uploader = host.add_module("Uploader", &["uploadLocalFiles"]);
    host.add_module("CloudUploader", &["CloudUpload"]);
    host.add_module("ActionSheet", &["openLazy", "hideActionSheet"]);
    for action in ActionType::ALL {
        host.add_action_handler(action, &config.message_store);
    }

    let mut plugin = Plugin::builder(host.clone())
        .with_settings(settings)
        .with_config(config)
        .activate();
    info!("Settings: {:?}", plugin.settings());

    let payload = UploadPayload::Container(UploadContainer {
        channel_id: Some("simulated".to_string()),
        flags: MessageFlags::empty(),
        items: vec![describe(path, content_type).await?],
    });
    let args = host
        .call(&uploader, "uploadLocalFiles", CallArgs::Upload(payload))
        .await?;
    let CallArgs::Upload(UploadPayload::Container(container)) = args else {
        return Err(anyhow!("upload arguments changed shape"));
    };
    println!("{}", serde_json::to_string_pretty(&container)?);

    let failures = plugin.deactivate();
    if failures > 0 {
        return Err(anyhow!("{} intercepts failed to uninstall", failures));
    }
    Ok(())
}
