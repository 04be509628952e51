//! # Ingestion Coordinator
//! Orchestrates router → collector for a batch of requests. Each request runs
//! as its own task; a request that exhausts its retries is recorded as a
//! per-request failure and never aborts the rest of the batch.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::{Id as TaskId, JoinSet};

use crate::collector::PaginatedCollector;
use crate::error::IngestError;
use crate::records::NormalizedRecord;
use crate::request::IngestionRequest;
use crate::router::{HybridRouter, RoutingDecision};
use crate::source::{CollectQuery, DataSource};

/// One request's routing decision plus what its collection produced.
#[derive(Debug)]
pub struct RequestOutcome {
    pub request: IngestionRequest,
    pub decision: RoutingDecision,
    pub records: Vec<NormalizedRecord>,
}

/// A request whose collection failed after the retry budget.
#[derive(Debug)]
pub struct RequestFailure {
    pub request: IngestionRequest,
    pub decision: RoutingDecision,
    pub error: IngestError,
}

/// Operator-facing batch summary: what landed, from where, what to resubmit.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub requests: usize,
    pub collected: usize,
    pub historical: usize,
    pub live: usize,
    pub failed: usize,
    /// `describe()` strings of failed requests, for targeted resubmission.
    pub failed_requests: Vec<String>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub outcomes: Vec<RequestOutcome>,
    pub failures: Vec<RequestFailure>,
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        let mut historical = 0usize;
        let mut live = 0usize;
        let mut collected = 0usize;
        for o in &self.outcomes {
            collected += o.records.len();
            match o.decision.data_source {
                DataSource::HistoricalApi => historical += o.records.len(),
                DataSource::LiveStt => live += o.records.len(),
                DataSource::Unknown => {}
            }
        }
        BatchSummary {
            requests: self.outcomes.len() + self.failures.len(),
            collected,
            historical,
            live,
            failed: self.failures.len(),
            failed_requests: self.failures.iter().map(|f| f.request.describe()).collect(),
        }
    }
}

pub struct IngestionCoordinator {
    router: HybridRouter,
    collectors: HashMap<DataSource, Arc<PaginatedCollector>>,
    max_records_default: usize,
}

impl IngestionCoordinator {
    pub fn new(
        router: HybridRouter,
        collectors: HashMap<DataSource, Arc<PaginatedCollector>>,
        max_records_default: usize,
    ) -> Self {
        Self {
            router,
            collectors,
            max_records_default,
        }
    }

    pub fn router(&self) -> &HybridRouter {
        &self.router
    }

    /// Route and collect every request in the batch, one task per request.
    /// `max_records` bounds each request's collection; `None` uses the
    /// configured default.
    pub async fn ingest_batch(
        &self,
        requests: Vec<IngestionRequest>,
        max_records: Option<usize>,
    ) -> BatchOutcome {
        let cap = max_records.unwrap_or(self.max_records_default);
        let mut tasks: JoinSet<Result<RequestOutcome, RequestFailure>> = JoinSet::new();
        let mut failures = Vec::new();
        // Request identity per task, so a panicked task still yields a
        // resubmittable failure entry instead of shrinking the batch.
        let mut in_flight: HashMap<TaskId, (IngestionRequest, RoutingDecision)> = HashMap::new();

        for request in requests {
            let decision = self.router.route(&request);
            let Some(collector) = self.collectors.get(&decision.data_source).cloned() else {
                // No collector bound for the decided source (Unknown, or a
                // partial deployment); report it instead of aborting.
                tracing::error!(
                    source = %decision.data_source,
                    request = %request.describe(),
                    "no collector bound for decided source"
                );
                let error = IngestError::Terminal {
                    status: 0,
                    message: format!("no collector for source {}", decision.data_source),
                };
                failures.push(RequestFailure {
                    request,
                    decision,
                    error,
                });
                continue;
            };

            let query = build_query(&request);
            let task_request = request.clone();
            let task_decision = decision.clone();
            let handle = tasks.spawn(async move {
                match collector.collect(&query, cap).await {
                    Ok(records) => Ok(RequestOutcome {
                        request: task_request,
                        decision: task_decision,
                        records,
                    }),
                    Err(error) => Err(RequestFailure {
                        request: task_request,
                        decision: task_decision,
                        error,
                    }),
                }
            });
            in_flight.insert(handle.id(), (request, decision));
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, Ok(outcome))) => {
                    in_flight.remove(&id);
                    outcomes.push(outcome);
                }
                Ok((id, Err(failure))) => {
                    in_flight.remove(&id);
                    tracing::warn!(
                        request = %failure.request.describe(),
                        source = %failure.decision.data_source,
                        error = %failure.error,
                        "request failed; batch continues"
                    );
                    failures.push(failure);
                }
                Err(join_err) => match in_flight.remove(&join_err.id()) {
                    Some((request, decision)) => {
                        tracing::error!(
                            request = %request.describe(),
                            error = %join_err,
                            "collection task panicked"
                        );
                        failures.push(RequestFailure {
                            request,
                            decision,
                            error: IngestError::Terminal {
                                status: 0,
                                message: format!("collection task panicked: {join_err}"),
                            },
                        });
                    }
                    None => {
                        tracing::error!(error = %join_err, "collection task panicked");
                    }
                },
            }
        }

        let outcome = BatchOutcome { outcomes, failures };
        let summary = outcome.summary();
        tracing::info!(
            requests = summary.requests,
            collected = summary.collected,
            historical = summary.historical,
            live = summary.live,
            failed = summary.failed,
            "batch finished"
        );
        outcome
    }
}

/// Translate a routed request into the upstream query shape.
fn build_query(req: &IngestionRequest) -> CollectQuery {
    CollectQuery {
        from: req.meeting_date,
        until: req.meeting_date,
        session: req.diet_session,
        meeting_id: req.meeting_id.clone(),
        ..Default::default()
    }
}
