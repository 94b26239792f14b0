use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use openeo_grass_rs::actinia::{ActiniaEngine, Engine};
use openeo_grass_rs::openeo::collections::CollectionCatalog;
use openeo_grass_rs::openeo::graph::{Compiler, GraphLoader, ProcessGraph};
use openeo_grass_rs::openeo::graphs::GraphService;
use openeo_grass_rs::openeo::jobs::{Job, JobManager, MemoryStore};
use openeo_grass_rs::openeo::processes::ProcessRegistry;
use openeo_grass_rs::openeo::server::{self, AppState};
use openeo_grass_rs::Config;
use serde_json::json;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
    },
    /// Compile a process graph file and print the process chain
    Compile {
        /// Path to a JSON or YAML process graph
        #[arg(short, long)]
        file: String,

        /// Also load the engine's module catalogue
        #[arg(long)]
        engine_modules: bool,
    },
    /// List the available processes
    Processes {
        /// Also load the engine's module catalogue
        #[arg(long)]
        engine_modules: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    let engine: Arc<dyn Engine> =
        Arc::new(ActiniaEngine::new(&config).context("Failed to create actinia client")?);

    match args.command {
        Commands::Serve { port } => {
            let registry = build_registry(engine.as_ref(), config.register_modules).await;
            log::info!("Process registry holds {} processes", registry.len());

            let jobs = JobManager::new(
                registry,
                engine.clone(),
                Arc::new(MemoryStore::<Job>::new()),
                config.default_location(),
            );
            let state = AppState {
                jobs: Arc::new(jobs),
                collections: Arc::new(CollectionCatalog::new(
                    engine.clone(),
                    config.locations.clone(),
                )),
                graphs: Arc::new(GraphService::new(Arc::new(
                    MemoryStore::<ProcessGraph>::new(),
                ))),
            };

            server::serve(state, port).await?;
        }
        Commands::Compile {
            file,
            engine_modules,
        } => {
            let registry = build_registry(engine.as_ref(), engine_modules).await;
            let graph = GraphLoader::new()
                .load_graph(&file)
                .with_context(|| format!("Failed to load process graph from {}", file))?;

            let compilation = Compiler::new(&registry).compile(&graph)?;
            let location = compilation
                .location()
                .unwrap_or_else(|| config.default_location().to_string());

            let output = json!({
                "location": location,
                "output_names": compilation.output_names.clone(),
                "process_chain": compilation.into_chain(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Processes { engine_modules } => {
            let registry = build_registry(engine.as_ref(), engine_modules).await;
            for description in registry.descriptions() {
                println!("{:<40} {}", description.id, description.summary);
            }
        }
    }

    Ok(())
}

/// Built-in processes plus, when requested, the engine's modules
async fn build_registry(engine: &dyn Engine, engine_modules: bool) -> Arc<ProcessRegistry> {
    let mut registry = ProcessRegistry::with_builtins();
    if engine_modules {
        registry.register_engine_modules(engine).await;
    }
    Arc::new(registry)
}
