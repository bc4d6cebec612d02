//! mediafield: command-line access to a media field store.
//!
//! Reads its settings from the environment (`MEDIAFIELD_*`, see `Config`).
//! Use the `local` storage backend: the `memory` backend forgets everything
//! when the process exits.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mediafield_cli::{
    guess_mime_type, parse_entry, print_media_table, MediaSummary, SyncSummary,
};
use mediafield_core::{
    AttachmentEntry, Config, DesiredState, FieldConfig, MediaOwner, OptimizationFormat,
    StoreBackend, TransformParameters, Visibility,
};
use mediafield_processing::TransformPipeline;
use mediafield_storage::create_stores;
use mediafield_sync::{init_tracing, MediaField};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "mediafield", about = "Media field store CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct FieldArgs {
    /// Owner model type, e.g. "post"
    #[arg(long)]
    owner_type: String,
    /// Owner id
    #[arg(long)]
    owner_id: String,
    /// Collection name
    #[arg(long, default_value = "default")]
    collection: String,
}

impl FieldArgs {
    fn owner(&self) -> MediaOwner {
        MediaOwner::new(self.owner_type.clone(), self.owner_id.clone())
    }

    fn field(&self) -> FieldConfig {
        FieldConfig::new().collection(self.collection.clone())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize and/or resize an image file
    Transform {
        /// Input file
        input: PathBuf,
        /// Output file (defaults to the transformed file name next to the input)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Optimization format: jpeg, jpg, png, webp, gif, avif or none
        #[arg(long, default_value = "none")]
        format: String,
        /// Shrink the longer side by this percentage (0 disables)
        #[arg(long, default_value = "0")]
        resize: u8,
        /// Mime type (guessed from the extension when omitted)
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// Stage a file so it can be attached with `sync --entry upload:<token>`
    Stage {
        /// Path to the file to stage
        file: PathBuf,
        /// Mime type (guessed from the extension when omitted)
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// List the media of a collection in display order
    List {
        #[command(flatten)]
        field: FieldArgs,
        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the display information of one media record
    Show {
        #[command(flatten)]
        field: FieldArgs,
        /// Media UUID
        uuid: Uuid,
        /// Resolve the URL as for a private field
        #[arg(long)]
        private: bool,
        /// Prefer this conversion when it was generated
        #[arg(long)]
        conversion: Option<String>,
    },
    /// Reconcile a collection with the given ordered entries
    Sync {
        #[command(flatten)]
        field: FieldArgs,
        /// Entries in display order: a media uuid or upload:<token>
        #[arg(long = "entry")]
        entries: Vec<String>,
        /// Optimization format for uploaded images
        #[arg(long, default_value = "none")]
        format: String,
        /// Shrink uploaded images by this percentage (0 disables)
        #[arg(long, default_value = "0")]
        resize: u8,
        /// Display name for new records
        #[arg(long)]
        name: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing().context("Initialize tracing")?;

    let cli = Cli::parse();
    let config = Config::from_env()?;
    if config.storage_backend == StoreBackend::Memory {
        tracing::warn!("Memory storage backend selected, nothing will persist after exit");
    }

    match cli.command {
        Commands::Transform {
            input,
            output,
            format,
            resize,
            mime_type,
        } => {
            let data = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Read {}", input.display()))?;
            let mime_type = mime_type.unwrap_or_else(|| guess_mime_type(&input).to_string());
            let file_name = input
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("file")
                .to_string();
            let params = TransformParameters::new(
                OptimizationFormat::parse(&format)?,
                mediafield_core::ResizePercent::new(resize)?,
            );

            let out = TransformPipeline::new(config.jpeg_quality)
                .transform(data, &mime_type, &params, &file_name)?;

            let target = output.unwrap_or_else(|| input.with_file_name(&out.file_name));
            tokio::fs::write(&target, &out.data)
                .await
                .with_context(|| format!("Write {}", target.display()))?;

            print_json(&serde_json::json!({
                "output": target.display().to_string(),
                "file_name": out.file_name,
                "mime_type": out.mime_type,
                "size_bytes": out.data.len(),
                "transformed": out.transformed,
            }))?;
        }
        Commands::Stage { file, mime_type } => {
            let stores = create_stores(&config).await?;
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Read {}", file.display()))?;
            let mime_type = mime_type.unwrap_or_else(|| guess_mime_type(&file).to_string());
            let client_filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("file");

            let upload = stores
                .staging
                .stage(data, client_filename, &mime_type)
                .await?;
            print_json(&serde_json::json!({
                "token": upload.token,
                "entry": format!("{}{}", mediafield_cli::UPLOAD_PREFIX, upload.token),
            }))?;
        }
        Commands::List { field, json } => {
            let stores = create_stores(&config).await?;
            let records = stores
                .media
                .list_media(&field.owner(), &field.collection)
                .await?;
            if json {
                let summaries: Vec<MediaSummary> = records.iter().map(MediaSummary::from).collect();
                print_json(&summaries)?;
            } else {
                print_media_table(&records);
            }
        }
        Commands::Show {
            field,
            uuid,
            private,
            conversion,
        } => {
            let stores = create_stores(&config).await?;
            let mut field_config = field.field();
            if private {
                field_config = field_config.visibility(Visibility::Private);
            }
            if let Some(conversion) = conversion {
                field_config = field_config.conversion(conversion);
            }
            let media_field = MediaField::from_config(field_config, &stores, &config);

            let owner = field.owner();
            let info = media_field
                .uploaded_file(Some(&owner), uuid)
                .await
                .with_context(|| format!("No media {} for {}", uuid, owner))?;
            print_json(&info)?;
        }
        Commands::Sync {
            field,
            entries,
            format,
            resize,
            name,
        } => {
            let stores = create_stores(&config).await?;
            let mut field_config = field.field().multiple(true).resize(resize);
            if let Some(format) = OptimizationFormat::parse(&format)? {
                field_config = field_config.optimize(format);
            }
            if let Some(name) = name {
                field_config = field_config.media_name(name);
            }
            let media_field = MediaField::from_config(field_config, &stores, &config);

            let mut state = DesiredState::new();
            for raw in &entries {
                match parse_entry(raw)? {
                    (_, AttachmentEntry::Persisted(uuid)) => state.push_persisted(uuid),
                    (key, AttachmentEntry::Pending(upload)) => state.push_pending(key, upload),
                }
            }

            let outcome = media_field.save(&field.owner(), state).await;
            print_json(&SyncSummary::from(&outcome))?;
        }
    }

    Ok(())
}
