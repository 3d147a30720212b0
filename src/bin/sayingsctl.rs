use clap::{Parser, Subcommand};
use sayings_image_api::api::AppState;
use sayings_image_api::store::ExportPayload;
use sayings_image_api::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sayingsctl", about = "Admin CLI for the Sayings Image API", version)]
struct Cli {
    /// Override DATABASE_PATH
    #[arg(global = true, long, value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored sayings
    List {
        /// Output raw JSON instead of one line per saying
        #[arg(long)]
        json: bool,
    },
    /// Add a saying
    Add {
        #[arg(long)]
        saying: String,
        /// Prompt template; `%1` is replaced by the saying
        #[arg(long)]
        prompt: String,
    },
    /// Delete a saying and its image
    Delete { id: i64 },
    /// Write all sayings as {"sayings": [...]}
    Export {
        /// Output path (defaults to stdout)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Append sayings from an export file
    Import { file: PathBuf },
    /// Show the final prompt for a saying, context included
    Prompt { id: i64 },
    /// Generate an image for a saying with the configured provider
    Generate { id: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();

    let mut conf = Config::new()?;
    if let Some(path) = cli.database {
        conf.database_path = path;
    }
    let state = AppState::from_config(&conf).await?;

    match cli.command {
        Commands::List { json } => {
            let sayings = state.store.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sayings)?);
            } else {
                for s in sayings {
                    let image = s.image_path.as_deref().unwrap_or("-");
                    println!("{}\t{}\t{}\t{}", s.id, s.saying, s.prompt, image);
                }
            }
        }
        Commands::Add { saying, prompt } => {
            let created = state.store.create(&saying, &prompt).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Commands::Delete { id } => {
            let removed = state.store.delete(id).await?;
            if let Some(image_path) = removed.image_path.as_deref() {
                state.generation.storage().remove(image_path).await;
            }
            println!("Deleted {}", id);
        }
        Commands::Export { out } => {
            let payload = state.store.export_all().await?;
            let body = serde_json::to_string_pretty(&payload)?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, body).await?;
                    println!("Exported {} sayings to {}", payload.sayings.len(), path.display());
                }
                None => println!("{}", body),
            }
        }
        Commands::Import { file } => {
            let data = tokio::fs::read_to_string(&file).await?;
            let payload: ExportPayload = serde_json::from_str(&data)?;
            let imported = state.store.import_sayings(&payload.sayings).await?;
            println!("Imported {} sayings", imported.len());
        }
        Commands::Prompt { id } => {
            println!("{}", state.generation.preview_prompt(id).await?);
        }
        Commands::Generate { id } => match state.generation.generate(id).await {
            Ok(updated) => println!("{}", serde_json::to_string_pretty(&updated)?),
            Err(e) => {
                eprintln!("Error ({}): {}", e.kind(), e);
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
