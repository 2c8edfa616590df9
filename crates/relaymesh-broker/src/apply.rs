//! Ordered, idempotent application of a compiled topology

use relaymesh_topology::{CompiledTopology, RelaySpec};
use serde::Serialize;
use tracing::{debug, info};

use crate::client::{BrokerApi, EnsureOutcome};
use crate::error::Result;

/// Counts of ensure-operations by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub created: usize,
    pub existing: usize,
}

impl ApplySummary {
    fn record(&mut self, outcome: EnsureOutcome) {
        match outcome {
            EnsureOutcome::Created => self.created += 1,
            EnsureOutcome::Existing => self.existing += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.existing
    }

    /// Nothing had to be created
    pub fn is_noop(&self) -> bool {
        self.created == 0
    }
}

/// Applies topologies through a [`BrokerApi`]
///
/// Calls are strictly sequential: vhost, exchanges, queues, bindings, then
/// relay parameters. The first failure stops the sequence.
pub struct Applier<'a, A: BrokerApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: BrokerApi + ?Sized> Applier<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Ensure every object of `topology`, then one shovel parameter per relay
    pub async fn apply(&self, topology: &CompiledTopology, relays: &[RelaySpec]) -> Result<ApplySummary> {
        let vhost = topology.vhost.as_str();
        let mut summary = ApplySummary::default();

        summary.record(self.api.ensure_vhost(vhost).await?);

        for exchange in &topology.exchanges {
            let outcome = self.api.ensure_exchange(vhost, exchange).await?;
            debug!(vhost, exchange = %exchange.name, ?outcome, "exchange ensured");
            summary.record(outcome);
        }

        for queue in &topology.queues {
            let outcome = self.api.ensure_queue(vhost, queue).await?;
            debug!(vhost, queue = %queue.name, ?outcome, "queue ensured");
            summary.record(outcome);
        }

        for binding in &topology.bindings {
            let outcome = self.api.ensure_binding(vhost, binding).await?;
            debug!(
                vhost,
                source = %binding.source,
                destination = %binding.destination,
                routing_key = %binding.routing_key,
                ?outcome,
                "binding ensured"
            );
            summary.record(outcome);
        }

        for relay in relays {
            let outcome = self
                .api
                .ensure_shovel_parameter(vhost, &relay.name, &relay.shovel_value())
                .await?;
            debug!(vhost, relay = %relay.name, ?outcome, "relay parameter ensured");
            summary.record(outcome);
        }

        info!(
            vhost,
            created = summary.created,
            existing = summary.existing,
            "topology applied"
        );
        Ok(summary)
    }
}
