//! Repeated search passes over all keys with per-pass latency reporting.
//!
//! Each pass runs as one spawned task that searches the keys strictly in order,
//! one at a time. Issuing them concurrently gets the public test servers to
//! answer with HTTP 429. The statistic is read only after the task has joined.

use std::sync::Arc;

use clap::ValueEnum;
use serde::Deserialize;

use crate::client::{CachingMode, ResourceSearch};
use crate::error::{Result, SampleError};
use crate::interceptor::ResponseTimeInterceptor;
use crate::output::Presenter;

/// Which exchanges a reported average covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatScope {
    /// Reset at every pass boundary; each report covers its own pass only.
    #[default]
    PerPass,
    /// Running average since the first pass.
    Cumulative,
}

#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub passes: usize,
    pub resource_type: String,
    pub filter_field: String,
    /// First pass index that runs with caching disabled.
    pub no_cache_from: Option<usize>,
    pub stat_scope: StatScope,
}

impl Default for BatchPlan {
    fn default() -> Self {
        Self::with_passes(3)
    }
}

impl BatchPlan {
    /// `passes` patient searches by family name, the last one without caching.
    pub fn with_passes(passes: usize) -> Self {
        Self {
            passes,
            resource_type: "Patient".to_string(),
            filter_field: "family".to_string(),
            no_cache_from: passes.checked_sub(1),
            stat_scope: StatScope::default(),
        }
    }

    pub fn stat_scope(mut self, scope: StatScope) -> Self {
        self.stat_scope = scope;
        self
    }

    pub fn caching_for(&self, pass: usize) -> CachingMode {
        match self.no_cache_from {
            Some(first) if pass >= first => CachingMode::Disabled,
            _ => CachingMode::Enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Zero-based pass index.
    pub pass: usize,
    pub caching: CachingMode,
    pub average_millis: f64,
    /// Exchanges covered by `average_millis`.
    pub requests: u64,
}

pub struct BatchRunner<C> {
    client: Arc<C>,
    stats: Arc<ResponseTimeInterceptor>,
    keys: Arc<[String]>,
    plan: BatchPlan,
    presenter: Option<Presenter>,
}

impl<C> BatchRunner<C>
where
    C: ResourceSearch + 'static,
{
    pub fn new(
        client: Arc<C>,
        stats: Arc<ResponseTimeInterceptor>,
        keys: Vec<String>,
        plan: BatchPlan,
    ) -> Self {
        Self {
            client,
            stats,
            keys: keys.into(),
            plan,
            presenter: None,
        }
    }

    /// Render every search result with `presenter`.
    pub fn with_presenter(mut self, presenter: Presenter) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub async fn run<F>(&self, mut on_pass: F) -> Result<Vec<PassReport>>
    where
        F: FnMut(&PassReport),
    {
        if self.plan.passes == 0 {
            return Err(SampleError::config("at least one pass is required"));
        }

        let mut reports = Vec::with_capacity(self.plan.passes);
        for pass in 0..self.plan.passes {
            let report = self.run_pass(pass).await?;
            on_pass(&report);
            reports.push(report);
        }
        Ok(reports)
    }

    /// Run one pass to completion and read the statistic afterwards.
    pub async fn run_pass(&self, pass: usize) -> Result<PassReport> {
        let caching = self.plan.caching_for(pass);
        if caching.is_disabled() {
            self.client.disable_caching();
        }
        if self.plan.stat_scope == StatScope::PerPass {
            self.stats.reset();
        }

        tracing::info!(
            pass = pass + 1,
            ?caching,
            keys = self.keys.len(),
            "starting pass"
        );

        let client = Arc::clone(&self.client);
        let keys = Arc::clone(&self.keys);
        let resource_type = self.plan.resource_type.clone();
        let field = self.plan.filter_field.clone();
        let presenter = self.presenter;

        let task = tokio::spawn(async move {
            for key in keys.iter() {
                let bundle = client.search(&resource_type, &field, key).await?;
                tracing::debug!(key = %key, entries = bundle.len(), "search returned");
                if let Some(presenter) = presenter {
                    presenter.render(&bundle)?;
                }
            }
            Ok::<_, SampleError>(())
        });
        task.await
            .map_err(|e| SampleError::BatchTask(e.to_string()))??;

        let report = PassReport {
            pass,
            caching,
            average_millis: self.stats.average_millis(),
            requests: self.stats.requests(),
        };
        tracing::info!(
            pass = pass + 1,
            average_ms = report.average_millis,
            requests = report.requests,
            "pass finished"
        );
        Ok(report)
    }
}
