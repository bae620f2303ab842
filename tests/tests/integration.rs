use axum::http::StatusCode;
use axum::response::IntoResponse;
use gantry_gateway::cache::InMemoryConfigCache;
use gantry_gateway::error::GatewayError;
use gantry_gateway::iterator::PluginConfigIterator;
use gantry_gateway::resolve::{ConfigResolver, FallbackLoader};
use gantry_kernel::plugin::{
    Api, Consumer, LoadedPlugins, PluginConfig, PluginConfigRow, PluginDefinition, PluginFilter,
    RequestContext, RequestPhase, ResolveError, StoreError,
};
use gantry_testing::{MockPluginStore, assert_store_queried};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn config(value: serde_json::Value) -> PluginConfig {
    value.as_object().cloned().unwrap()
}

fn loader_for(store: &MockPluginStore) -> FallbackLoader {
    FallbackLoader::new(ConfigResolver::new(
        Arc::new(InMemoryConfigCache::new()),
        Arc::new(store.clone()),
    ))
}

fn request(api: Option<&str>, consumer: Option<&str>) -> RequestContext {
    let mut ctx = RequestContext::new("req-it").with_delay_response(true);
    if let Some(api) = api {
        ctx = ctx.with_api(Api::new(api, api));
    }
    if let Some(consumer) = consumer {
        ctx = ctx.with_consumer(Consumer::new(consumer));
    }
    ctx
}

async fn run_phase(
    loader: &FallbackLoader,
    plugins: &LoadedPlugins,
    ctx: &mut RequestContext,
    phase: RequestPhase,
) -> Result<Vec<(String, PluginConfig)>, GatewayError> {
    Ok(PluginConfigIterator::for_phase(loader, plugins, ctx, phase)
        .collect_all()
        .await?
        .into_iter()
        .map(|(plugin, config)| (plugin.name.clone(), config))
        .collect())
}

fn every_level(name: &str) -> Vec<PluginConfigRow> {
    vec![
        PluginConfigRow::new(name).with_config(config(json!({ "level": "global" }))),
        PluginConfigRow::new(name)
            .for_api("A")
            .with_config(config(json!({ "level": "api" }))),
        PluginConfigRow::new(name)
            .for_consumer("C")
            .with_config(config(json!({ "level": "consumer" }))),
        PluginConfigRow::new(name)
            .for_api("A")
            .for_consumer("C")
            .with_config(config(json!({ "level": "api+consumer" }))),
    ]
}

#[tokio::test]
async fn api_and_consumer_row_beats_every_other_level() {
    let store = MockPluginStore::with_rows(every_level("P"));
    let loader = loader_for(&store);
    let plugins = LoadedPlugins::new(vec![PluginDefinition::new("P")]).unwrap();
    let mut ctx = request(Some("A"), Some("C"));

    let pairs = run_phase(&loader, &plugins, &mut ctx, RequestPhase::Access)
        .await
        .unwrap();
    assert_eq!(
        pairs,
        vec![("P".to_string(), config(json!({ "level": "api+consumer" })))]
    );
}

#[tokio::test]
async fn global_row_applies_regardless_of_api_and_consumer() {
    let global = config(json!({ "level": "global" }));
    for (api, consumer) in [
        (None, None),
        (Some("A"), None),
        (None, Some("C")),
        (Some("A"), Some("C")),
    ] {
        let store = MockPluginStore::with_rows([
            PluginConfigRow::new("P").with_config(global.clone()),
        ]);
        let loader = loader_for(&store);
        let plugins = LoadedPlugins::new(vec![PluginDefinition::new("P")]).unwrap();
        let mut ctx = request(api, consumer);

        let pairs = run_phase(&loader, &plugins, &mut ctx, RequestPhase::Access)
            .await
            .unwrap();
        assert_eq!(pairs, vec![("P".to_string(), global.clone())]);
    }
}

#[tokio::test]
async fn disabled_row_keeps_plugin_out_of_the_sequence() {
    let store = MockPluginStore::with_rows([
        PluginConfigRow::new("cors").with_enabled(false),
        PluginConfigRow::new("acl"),
    ]);
    let loader = loader_for(&store);
    let plugins =
        LoadedPlugins::new(vec![PluginDefinition::new("cors"), PluginDefinition::new("acl")])
            .unwrap();
    let mut ctx = request(None, None);

    let pairs = run_phase(&loader, &plugins, &mut ctx, RequestPhase::Access)
        .await
        .unwrap();
    let names: Vec<_> = pairs.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["acl"]);
}

#[tokio::test]
async fn later_phases_reuse_the_memo_without_store_queries() {
    let store = MockPluginStore::with_rows(every_level("P"));
    let loader = loader_for(&store);
    let plugins =
        LoadedPlugins::new(vec![PluginDefinition::new("P"), PluginDefinition::new("Q")]).unwrap();
    let mut ctx = request(Some("A"), None);

    let access = run_phase(&loader, &plugins, &mut ctx, RequestPhase::Access)
        .await
        .unwrap();
    let queries_after_access = store.query_count().await;
    assert!(queries_after_access > 0);

    for phase in [
        RequestPhase::HeaderFilter,
        RequestPhase::BodyFilter,
        RequestPhase::Log,
    ] {
        let replay = run_phase(&loader, &plugins, &mut ctx, phase).await.unwrap();
        assert_eq!(replay, access);
    }
    assert_store_queried!(store, queries_after_access);
}

#[tokio::test]
async fn plugin_without_rows_never_appears() {
    let store = MockPluginStore::with_rows([PluginConfigRow::new("other").for_api("A")]);
    let loader = loader_for(&store);
    let plugins = LoadedPlugins::new(vec![PluginDefinition::new("ghost")]).unwrap();
    let mut ctx = request(Some("A"), Some("C"));

    let pairs = run_phase(&loader, &plugins, &mut ctx, RequestPhase::Access)
        .await
        .unwrap();
    assert!(pairs.is_empty());
    // Every level was tried before giving up.
    assert_store_queried!(store, 4);
}

#[tokio::test]
async fn failed_lookup_aborts_the_request_even_with_a_valid_global_row() {
    let store = MockPluginStore::with_rows([
        PluginConfigRow::new("P").with_config(config(json!({ "level": "global" }))),
        PluginConfigRow::new("later"),
    ]);
    let api_filter = PluginFilter::new(Some("A".into()), None, "P");
    store
        .fail_on(api_filter, StoreError::Unavailable("connection reset".into()))
        .await;
    let loader = loader_for(&store);
    let plugins =
        LoadedPlugins::new(vec![PluginDefinition::new("P"), PluginDefinition::new("later")])
            .unwrap();
    let mut ctx = request(Some("A"), None);

    let mut it =
        PluginConfigIterator::for_phase(&loader, &plugins, &mut ctx, RequestPhase::Access);
    let err = it.next().await.unwrap_err();
    assert!(matches!(
        &err,
        GatewayError::PluginResolution {
            plugin,
            source: ResolveError::Cache { .. },
        } if plugin == "P"
    ));
    // The cursor is exhausted: no partial plugin set is applied.
    assert!(it.next().await.unwrap().is_none());
    drop(it);

    assert!(!ctx.delay_response);
    assert!(ctx.resolved_plugins().map_or(true, |m| !m.contains("later")));
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn higher_priority_config_wins_over_lower_priority_failure() {
    let store = MockPluginStore::with_rows([PluginConfigRow::new("P")
        .for_api("A")
        .with_config(config(json!({ "level": "api" })))]);
    store
        .fail_on(
            PluginFilter::new(None, None, "P"),
            StoreError::Query("boom".into()),
        )
        .await;
    let loader = loader_for(&store);
    let api = "A".into();

    let got = loader
        .load_plugin_config(&PluginDefinition::new("P"), Some(&api), None)
        .await
        .unwrap();
    assert_eq!(got, Some(config(json!({ "level": "api" }))));
}

#[tokio::test]
async fn slower_specific_lookup_still_beats_faster_global_one() {
    let store = MockPluginStore::with_rows(every_level("P"));
    store
        .delay_on(
            PluginFilter::new(Some("A".into()), Some("C".into()), "P"),
            Duration::from_millis(50),
        )
        .await;
    let loader = loader_for(&store);
    let (api, consumer) = ("A".into(), "C".into());

    let got = loader
        .load_plugin_config(&PluginDefinition::new("P"), Some(&api), Some(&consumer))
        .await
        .unwrap();
    assert_eq!(got, Some(config(json!({ "level": "api+consumer" }))));
    // All four levels were started, not awaited one after another.
    assert_store_queried!(store, 4);
}

#[tokio::test]
async fn no_consumer_plugins_never_query_consumer_rows() {
    let store = MockPluginStore::with_rows(every_level("key-auth"));
    let loader = loader_for(&store);
    let plugins =
        LoadedPlugins::new(vec![PluginDefinition::new("key-auth").without_consumer()]).unwrap();
    let mut ctx = request(Some("A"), Some("C"));

    let pairs = run_phase(&loader, &plugins, &mut ctx, RequestPhase::Access)
        .await
        .unwrap();
    assert_eq!(
        pairs,
        vec![("key-auth".to_string(), config(json!({ "level": "api" })))]
    );

    let history = store.history().await;
    assert!(!history.is_empty());
    assert!(history.iter().all(|f| f.consumer_id.is_none()));
}

#[tokio::test]
async fn rate_limiting_and_auth_example() {
    let store = MockPluginStore::with_rows([
        PluginConfigRow::new("rate-limiting")
            .for_api("api1")
            .with_config(config(json!({ "limit": 10 }))),
        PluginConfigRow::new("auth").with_config(PluginConfig::new()),
    ]);
    let loader = loader_for(&store);
    let plugins = LoadedPlugins::new(vec![
        PluginDefinition::new("rate-limiting"),
        PluginDefinition::new("auth"),
    ])
    .unwrap();
    let mut ctx = request(Some("api1"), Some("cons1"));

    let pairs = run_phase(&loader, &plugins, &mut ctx, RequestPhase::Access)
        .await
        .unwrap();
    assert_eq!(
        pairs,
        vec![
            ("rate-limiting".to_string(), config(json!({ "limit": 10 }))),
            ("auth".to_string(), PluginConfig::new()),
        ]
    );
    assert!(ctx.delay_response);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_cached_lookups() {
    let store = MockPluginStore::with_rows(every_level("P"));
    for filter in [
        PluginFilter::new(Some("A".into()), Some("C".into()), "P"),
        PluginFilter::new(None, Some("C".into()), "P"),
        PluginFilter::new(Some("A".into()), None, "P"),
        PluginFilter::new(None, None, "P"),
    ] {
        store.delay_on(filter, Duration::from_millis(20)).await;
    }
    let loader = Arc::new(loader_for(&store));
    let plugins = Arc::new(LoadedPlugins::new(vec![PluginDefinition::new("P")]).unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let loader = Arc::clone(&loader);
        let plugins = Arc::clone(&plugins);
        handles.push(tokio::spawn(async move {
            let mut ctx = request(Some("A"), Some("C"));
            ctx.request_id = format!("req-{i}");
            run_phase(&loader, &plugins, &mut ctx, RequestPhase::Access).await
        }));
    }
    for handle in futures::future::join_all(handles).await {
        let pairs = handle.unwrap().unwrap();
        assert_eq!(pairs[0].1, config(json!({ "level": "api+consumer" })));
    }

    // One datastore round-trip per level, however many requests raced.
    assert_store_queried!(store, 4);
}
