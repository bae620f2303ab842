//! Gantry: resolve the plugin configuration a request would run with.
//!
//! Loads a configuration file, seeds an in-memory store from its
//! `plugin_rows`, then runs the access phase and replays the log phase for a
//! single simulated request.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GANTRY_CONFIG` | `gantry.toml` | Configuration file (TOML/YAML/JSON/...). |
//! | `GANTRY_API_ID` | *(none)* | API the request is routed to. |
//! | `GANTRY_CONSUMER_ID` | *(none)* | Authenticated consumer of the request. |

use gantry_gateway::config::GantryConfig;
use gantry_gateway::error::GatewayResult;
use gantry_gateway::iterator::PluginConfigIterator;
use gantry_gateway::resolve::{ConfigResolver, FallbackLoader};
use gantry_kernel::plugin::{Api, Consumer, RequestContext, RequestPhase};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gantry_gateway=info,gantry=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path =
        std::env::var("GANTRY_CONFIG").unwrap_or_else(|_| "gantry.toml".to_string());
    let api_id = std::env::var("GANTRY_API_ID").ok();
    let consumer_id = std::env::var("GANTRY_CONSUMER_ID").ok();

    if let Err(e) = run(&config_path, api_id, consumer_id).await {
        eprintln!("Gantry error: {e}");
        std::process::exit(1);
    }
}

async fn run(
    config_path: &str,
    api_id: Option<String>,
    consumer_id: Option<String>,
) -> GatewayResult<()> {
    let config = GantryConfig::load(config_path)?;
    let plugins = config.loaded_plugins()?;
    let store = config.build_store().await?;
    let cache = Arc::new(config.build_cache());

    info!(
        config = %config_path,
        plugins = plugins.len(),
        seed_rows = config.plugin_rows.len(),
        "Gantry configuration loaded"
    );

    let loader = FallbackLoader::new(ConfigResolver::new(cache.clone(), Arc::new(store)));

    let mut ctx = RequestContext::new(Uuid::new_v4().to_string()).with_delay_response(true);
    if let Some(id) = api_id {
        ctx = ctx.with_api(Api::new(id.as_str(), id.clone()));
    }
    if let Some(id) = consumer_id {
        ctx = ctx.with_consumer(Consumer::new(id.as_str()));
    }

    for phase in [RequestPhase::Access, RequestPhase::Log] {
        let pairs = PluginConfigIterator::for_phase(&loader, &plugins, &mut ctx, phase)
            .collect_all()
            .await?;
        for (plugin, plugin_config) in pairs {
            info!(
                request_id = %ctx.request_id,
                phase = phase.as_str(),
                plugin = %plugin.name,
                config = %serde_json::Value::Object(plugin_config),
                "plugin runs"
            );
        }
    }

    let stats = cache.stats();
    info!(hits = stats.hits, loads = stats.loads, entries = stats.entries, "cache usage");
    Ok(())
}
