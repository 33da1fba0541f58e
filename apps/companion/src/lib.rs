//! MedRecap study companion.
//!
//! Turns a medical topic into a generated study guide, quizzes and matching
//! drills, and keeps points, streak and mastery counts in a local SQLite file.

pub mod chat;
pub mod commands;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod events;
pub mod generation;
pub mod media;
pub mod repl;
pub mod state;

use crate::config::Config;
use crate::controller::FlowOptions;
use crate::db::SqliteRepository;
use crate::generation::GeminiClient;
use crate::state::AppState;
use std::sync::Arc;
use study_core::{MemoryStatsStore, StatsStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Open the stats database, falling back to memory if it cannot be opened.
fn open_stats_store(config: &Config) -> Box<dyn StatsStore> {
    let db_path = config.db_path();
    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::warn!(dir = %config.data_dir.display(), error = %e, "cannot create data directory");
    }

    match SqliteRepository::open(&db_path) {
        Ok(repo) => {
            tracing::info!(path = %db_path.display(), "opened stats database");
            Box::new(repo)
        }
        Err(e) => {
            tracing::warn!(path = %db_path.display(), error = %e, "stats will not be saved");
            Box::new(MemoryStatsStore::new())
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    let store = open_stats_store(&config);

    tracing::info!(model = %config.gemini.text_model, "using Gemini");
    let generator = Arc::new(GeminiClient::new(config.gemini.clone()));

    let state = AppState::new(generator, store, FlowOptions::new(config.daily_reset_hour));
    repl::run(state).await
}
