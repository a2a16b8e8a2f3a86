use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use mimic_common::Recording;
use mimic_engine::MimicContext;
use mimic_engine::capture::{ElementMapScraper, StaticEnvironment};
use mimic_engine::config::{ConfigLoader, MimicConfig};
use mimic_engine::dispatcher::LogDispatcher;
use mimic_engine::learner::{ContextHints, VariationGenerator};
use mimic_engine::store::{JsonDirStore, RecordingStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mimic",
    version,
    about = "Record, translate, replay and synthesize interaction recordings"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to $MIMIC_CONFIG, ./mimic.yaml, then ~/.mimic/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Recording directory (overrides the configured storage path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a stored recording into instructions
    Translate {
        id: String,
        #[arg(long, value_enum, default_value_t = Format::Prompt)]
        format: Format,
    },
    /// Replay a stored recording through the logging dispatcher
    Replay { id: String },
    /// List stored recordings
    List {
        /// Only recordings whose name, description or tags contain this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Synthesize a new recording from learned patterns
    Synthesize {
        #[arg(long)]
        platform: Option<String>,
        #[arg(long, default_value_t = 0.5)]
        complexity: f64,
        /// Store the result instead of only printing it
        #[arg(long)]
        save: bool,
    },
    /// Perturb a stored recording
    Vary {
        id: String,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        save: bool,
    },
    /// Merge slices of several stored recordings
    Merge {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Prompt,
    Code,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays parseable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };
    let root = args.store.clone().unwrap_or_else(|| config.storage.path.clone());
    tracing::debug!("Using recording store at {}", root.display());
    let store = Arc::new(JsonDirStore::new(root));

    match args.command {
        Command::Translate { id, format } => {
            let recording = store.get(&id).await?;
            let context = build_context(config, store);
            let instructions = context.translator.translate_to_instructions(&recording.actions);
            let output = match format {
                Format::Prompt => context.translator.generate_llm_prompt(&instructions),
                Format::Code => context.translator.generate_executable_code(&instructions),
                Format::Json => serde_json::to_string_pretty(&instructions)?,
            };
            println!("{}", output);
        }
        Command::Replay { id } => {
            let recording = store.get(&id).await?;
            let mut context = build_context(config, store);
            context.replay.load(&recording);
            let mut dispatcher = LogDispatcher::default();
            let summary = context.replay.play(&mut dispatcher).await?;
            println!(
                "Dispatched {} actions ({} skipped){}",
                summary.dispatched,
                summary.skipped.len(),
                if summary.stopped { ", stopped early" } else { "" }
            );
        }
        Command::List { search } => {
            let recordings = match search {
                Some(text) => store.search(&text).await?,
                None => store.list().await?,
            };
            for recording in recordings {
                println!(
                    "{}\t{}\t{} actions\t{}",
                    recording.id,
                    recording.name,
                    recording.actions.len(),
                    recording.tags.iter().cloned().collect::<Vec<_>>().join(",")
                );
            }
        }
        Command::Synthesize {
            platform,
            complexity,
            save,
        } => {
            let mut context = build_context(config, store.clone());
            context.start().await;
            let hints = ContextHints {
                platform,
                ..Default::default()
            };
            let task = context.generate_future_task(&hints, complexity);
            context.shutdown().await;
            emit(store.as_ref(), task, save).await?;
        }
        Command::Vary { id, seed, save } => {
            let recording = store.get(&id).await?;
            tracing::info!("Creating variation of {}", recording.name);
            let mut generator = variation_generator(&config, seed);
            let variation = generator.create_variation(&recording);
            emit(store.as_ref(), variation, save).await?;
        }
        Command::Merge { ids, seed, save } => {
            let mut sources = Vec::with_capacity(ids.len());
            for id in &ids {
                sources.push(
                    store
                        .get(id)
                        .await
                        .with_context(|| format!("loading recording {}", id))?,
                );
            }
            let mut generator = variation_generator(&config, seed);
            let merged = generator.merge_tasks(&sources)?;
            emit(store.as_ref(), merged, save).await?;
        }
    }

    Ok(())
}

fn build_context(config: MimicConfig, store: Arc<JsonDirStore>) -> MimicContext {
    let env = Arc::new(StaticEnvironment::new(config.synthesis.default_environment()));
    MimicContext::new(config, store, env, Box::new(ElementMapScraper::default()))
}

fn variation_generator(config: &MimicConfig, seed: Option<u64>) -> VariationGenerator {
    match seed {
        Some(seed) => VariationGenerator::seeded(config.variation.clone(), seed),
        None => VariationGenerator::from_entropy(config.variation.clone()),
    }
}

async fn emit(store: &JsonDirStore, recording: Recording, save: bool) -> anyhow::Result<()> {
    if save {
        let id = store.insert(recording).await?;
        tracing::info!("Stored recording {}", id);
        println!("{}", id);
    } else {
        println!("{}", recording.to_json()?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_needs_at_least_one_id() {
        assert!(Args::try_parse_from(["mimic", "merge"]).is_err());
        let args = Args::try_parse_from(["mimic", "merge", "a", "b", "--seed", "7"]).unwrap();
        match args.command {
            Command::Merge { ids, seed, save } => {
                assert_eq!(ids, vec!["a", "b"]);
                assert_eq!(seed, Some(7));
                assert!(!save);
            }
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn seeded_variations_repeat() {
        let config = MimicConfig::default();
        let task = Recording::from_draft(mimic_common::NewRecording::new("empty", Vec::new()));
        let a = variation_generator(&config, Some(3)).create_variation(&task);
        let b = variation_generator(&config, Some(3)).create_variation(&task);
        assert_eq!(a.environment, b.environment);
    }
}
