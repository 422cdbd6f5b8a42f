use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recommender_api::catalog::Catalog;
use recommender_api::config::Config;
use recommender_api::extract::extract_text_from_url;
use recommender_api::index::VectorIndex;
use recommender_api::llm_client::OllamaClient;
use recommender_api::recommend::{RecommendResponse, RecommendationEngine};
use recommender_api::retrieval::{FallbackChain, IndexRetriever, RandomSampleRetriever, Retrieve};
use recommender_api::routes::build_router;
use recommender_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.rust_log.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting recommender API v{}", env!("CARGO_PKG_VERSION"));

    // Catalog is optional at runtime: without it the retriever degrades to
    // the index only, and past that to empty results.
    let catalog = match Catalog::load(Path::new(&config.catalog_path)) {
        Ok(catalog) => {
            info!(records = catalog.len(), "catalog loaded from {}", config.catalog_path);
            Some(Arc::new(catalog))
        }
        Err(e) => {
            warn!("catalog unavailable ({e}); retrieval fallback will be empty");
            None
        }
    };

    let llm = Arc::new(OllamaClient::new(
        &config.ollama_url,
        &config.generation_model,
        &config.embedding_model,
    ));
    info!(
        "LLM client initialized (generation: {}, embedding: {})",
        config.generation_model, config.embedding_model
    );

    // One-time bootstrap, serialized here before any traffic is served.
    let empty_catalog = Arc::new(Catalog::default());
    let index = Arc::new(
        VectorIndex::build_or_load(
            catalog.as_deref().unwrap_or_else(|| empty_catalog.as_ref()),
            Path::new(&config.index_path),
            llm.as_ref(),
        )
        .await,
    );

    let retriever: Arc<dyn Retrieve> = Arc::new(FallbackChain::new(vec![
        Arc::new(IndexRetriever::new(index, llm.clone())),
        Arc::new(RandomSampleRetriever::new(catalog.clone())),
    ]));
    let engine = Arc::new(RecommendationEngine::new(retriever, llm));
    let http = reqwest::Client::new();

    if std::env::args().nth(1).as_deref() == Some("cli") {
        return run_cli(&engine, &http).await;
    }

    let state = AppState {
        catalog: catalog.unwrap_or(empty_catalog),
        engine,
        http,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Interactive mode: `recommender-api cli`.
async fn run_cli(engine: &RecommendationEngine, http: &reqwest::Client) -> Result<()> {
    loop {
        println!("\n-------------------------------");
        println!("Assessment Recommendation System");
        println!("1. Enter query text");
        println!("2. Enter job description URL");
        println!("q. Quit");
        let choice = prompt_line("Choose an option: ")?;

        match choice.as_str() {
            "q" => break,
            "1" => {
                let query = prompt_line("Enter your query: ")?;
                println!("\nProcessing...\n");
                print_response(&engine.recommend(&query).await);
            }
            "2" => {
                let url = prompt_line("Enter job description URL: ")?;
                println!("\nExtracting text from URL...\n");
                let text = extract_text_from_url(http, &url).await;
                println!("Processing...\n");
                print_response(&engine.recommend(&text).await);
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_response(response: &RecommendResponse) {
    match response {
        RecommendResponse::Recommendations(list) if !list.recommendations.is_empty() => {
            println!("=== RECOMMENDED ASSESSMENTS ===\n");
            for (i, rec) in list.recommendations.iter().enumerate() {
                println!("{}. {} ({})", i + 1, rec.name, rec.assessment_type);
                println!("   Duration: {}", rec.duration);
                println!("   Remote Testing: {}", rec.remote_testing);
                println!("   Adaptive Support: {}", rec.adaptive_support);
                println!("   URL: {}", rec.url);
                println!("   Why: {}", rec.explanation);
                println!();
            }
        }
        RecommendResponse::Recommendations(_) => {
            println!("No matching assessments found.");
        }
        RecommendResponse::Error { error } => {
            println!("Error: {error}");
        }
    }
}
