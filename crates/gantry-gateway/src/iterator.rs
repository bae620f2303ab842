//! Per-request plugin configuration sequence.
//!
//! [`PluginConfigIterator`] walks the loaded plugins in pipeline order and
//! yields each plugin that has an applicable configuration for the request,
//! together with that configuration.  Plugins without one are skipped.
//!
//! During the early phase every plugin is resolved through the
//! [`FallbackLoader`] and the outcome, absent included, is stored in the
//! request's memo.  Later phases replay the memo only, so they never reach
//! the cache or the datastore.
//!
//! ```rust,ignore
//! let mut plugins =
//!     PluginConfigIterator::for_phase(&loader, &loaded, &mut ctx, RequestPhase::Access);
//! while let Some((plugin, config)) = plugins.next().await? {
//!     handlers.run(plugin, &config).await;
//! }
//! ```

use crate::error::GatewayError;
use crate::resolve::FallbackLoader;
use gantry_kernel::plugin::{PluginConfig, PluginDefinition, RequestContext, RequestPhase};
use tracing::{debug, error};

/// Resumable, single-use cursor over the loaded plugins of one request phase.
///
/// Yielded plugin definitions borrow the plugin list, not the request, so
/// they may outlive the cursor.
pub struct PluginConfigIterator<'a, 'r> {
    loader: &'a FallbackLoader,
    plugins: &'a [PluginDefinition],
    ctx: &'r mut RequestContext,
    position: usize,
    early_phase: bool,
}

impl<'a, 'r> PluginConfigIterator<'a, 'r> {
    /// Create a cursor at the first plugin.
    ///
    /// `early_phase` selects authoritative resolution; otherwise the
    /// request's memo is replayed.
    pub fn new(
        loader: &'a FallbackLoader,
        plugins: &'a [PluginDefinition],
        ctx: &'r mut RequestContext,
        early_phase: bool,
    ) -> Self {
        Self {
            loader,
            plugins,
            ctx,
            position: 0,
            early_phase,
        }
    }

    pub fn for_phase(
        loader: &'a FallbackLoader,
        plugins: &'a [PluginDefinition],
        ctx: &'r mut RequestContext,
        phase: RequestPhase,
    ) -> Self {
        Self::new(loader, plugins, ctx, phase.is_early())
    }

    /// Next configured plugin, or `Ok(None)` once the list is exhausted.
    ///
    /// A resolution failure aborts the whole request: the delayed-response
    /// flag is cleared, the cursor is exhausted, and the error is returned
    /// for the dispatcher to render as a `500` response.
    pub async fn next(
        &mut self,
    ) -> Result<Option<(&'a PluginDefinition, PluginConfig)>, GatewayError> {
        let plugins = self.plugins;

        while let Some(plugin) = plugins.get(self.position) {
            self.position += 1;

            let outcome = if self.early_phase {
                self.resolve(plugin).await?
            } else {
                self.ctx
                    .plugins_for_request()
                    .config(&plugin.name)
                    .cloned()
            };

            match outcome {
                Some(config) => return Ok(Some((plugin, config))),
                None => debug!(
                    request_id = %self.ctx.request_id,
                    plugin = %plugin.name,
                    "no configuration applies, skipping plugin"
                ),
            }
        }

        Ok(None)
    }

    async fn resolve(
        &mut self,
        plugin: &PluginDefinition,
    ) -> Result<Option<PluginConfig>, GatewayError> {
        let outcome = self
            .loader
            .load_plugin_config(plugin, self.ctx.api_id(), self.ctx.consumer_id())
            .await;

        match outcome {
            Ok(config) => {
                self.ctx
                    .plugins_for_request()
                    .insert(plugin.name.clone(), config.clone());
                Ok(config)
            }
            Err(source) => {
                error!(
                    request_id = %self.ctx.request_id,
                    plugin = %plugin.name,
                    error = %source,
                    "plugin configuration could not be resolved, aborting request"
                );
                self.ctx.delay_response = false;
                self.position = self.plugins.len();
                Err(GatewayError::PluginResolution {
                    plugin: plugin.name.clone(),
                    source,
                })
            }
        }
    }

    /// Drain the remaining sequence.
    pub async fn collect_all(
        mut self,
    ) -> Result<Vec<(&'a PluginDefinition, PluginConfig)>, GatewayError> {
        let mut out = Vec::new();
        while let Some(pair) = self.next().await? {
            out.push(pair);
        }
        Ok(out)
    }
}
