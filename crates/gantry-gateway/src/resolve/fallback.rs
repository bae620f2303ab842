//! Specificity fallback for one plugin.
//!
//! For a plugin, up to four lookups are issued, most specific first:
//!
//! | # | Triple | Issued when |
//! |---|--------|-------------|
//! | 1 | `(api, consumer, name)` | API and Consumer present, plugin allows consumers |
//! | 2 | `(-, consumer, name)` | Consumer present, plugin allows consumers |
//! | 3 | `(api, -, name)` | API present |
//! | 4 | `(-, -, name)` | always |
//!
//! All lookups run concurrently, but results are read in the table's order:
//! the first configured result wins and the first failure aborts, whichever
//! lookup happened to complete first.

use super::parallel::{Operation, run_parallel};
use super::resolver::ConfigResolver;
use futures::FutureExt;
use gantry_kernel::plugin::{
    ApiId, ConsumerId, PluginConfig, PluginDefinition, PluginFilter, ResolveError,
};
use tracing::debug;

type Outcome = Result<Option<PluginConfig>, ResolveError>;

/// Lookups implied by the specificity hierarchy, highest priority first.
///
/// Only lookups whose preconditions hold are included; the global lookup is
/// always last.
pub fn fallback_chain(
    plugin: &PluginDefinition,
    api_id: Option<&ApiId>,
    consumer_id: Option<&ConsumerId>,
) -> Vec<PluginFilter> {
    let name = plugin.name.as_str();
    let consumer_id = consumer_id.filter(|_| plugin.allows_consumer());
    let mut chain = Vec::with_capacity(4);

    if let (Some(api), Some(consumer)) = (api_id, consumer_id) {
        chain.push(PluginFilter::new(Some(api.clone()), Some(consumer.clone()), name));
    }
    if let Some(consumer) = consumer_id {
        chain.push(PluginFilter::new(None, Some(consumer.clone()), name));
    }
    if let Some(api) = api_id {
        chain.push(PluginFilter::new(Some(api.clone()), None, name));
    }
    chain.push(PluginFilter::new(None, None, name));
    chain
}

/// Loads the effective configuration of a plugin for an API/Consumer pair.
#[derive(Clone)]
pub struct FallbackLoader {
    resolver: ConfigResolver,
}

impl FallbackLoader {
    pub fn new(resolver: ConfigResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Effective configuration of `plugin`, or `Ok(None)` when no enabled
    /// row applies at any level.
    ///
    /// An error from a lookup is returned as soon as it is reached in
    /// priority order, even if a lower-priority lookup would have produced a
    /// configuration.  Lookups that lose are not cancelled.
    pub async fn load_plugin_config(
        &self,
        plugin: &PluginDefinition,
        api_id: Option<&ApiId>,
        consumer_id: Option<&ConsumerId>,
    ) -> Outcome {
        let chain = fallback_chain(plugin, api_id, consumer_id);
        let operations: Vec<Operation<Outcome>> = chain
            .iter()
            .cloned()
            .map(|filter| {
                let resolver = self.resolver.clone();
                async move { resolver.resolve(filter).await }.boxed()
            })
            .collect();

        let mut results = run_parallel(operations).await;

        for (index, filter) in chain.iter().enumerate() {
            match results.get(index).await {
                Ok(Ok(Some(config))) => {
                    debug!(
                        plugin = %plugin.name,
                        level = filter.specificity().as_str(),
                        "plugin configuration selected"
                    );
                    return Ok(Some(config.clone()));
                }
                Ok(Ok(None)) => {}
                Ok(Err(err)) => return Err(err.clone()),
                Err(source) => {
                    return Err(ResolveError::Task {
                        plugin: plugin.name.clone(),
                        source,
                    });
                }
            }
        }

        Ok(None)
    }
}
