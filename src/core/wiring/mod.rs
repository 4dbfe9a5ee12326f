//! Fragment producer wiring.
//!
//! For every application except the designated collector application, the
//! producers are connected to every collector application either directly
//! (one boundary request endpoint per producer) or through a fragment
//! aggregator hub (one boundary request endpoint per application). The
//! choice depends only on the subsystems of that application's producers.

pub mod aggregated;
pub mod direct;

use crate::core::finalizer;
use crate::core::producers::ProducerRegistry;
use crate::core::system::System;
use crate::domain::model::{FragmentProducer, SourceId};
use crate::utils::error::Result;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DATA_REQUEST: &str = "DataRequest";
pub const FRAGMENT: &str = "Fragment";

/// Shared by every producer feeding one hub.
pub const FRAGMENT_QUEUE_CAPACITY: usize = 100_000;
pub const REQUEST_QUEUE_CAPACITY: usize = 1_000;

pub fn data_requests_for(target: &str) -> String {
    format!("data_requests_for_{}", target)
}

pub fn fragments_to(collector_app: &str) -> String {
    format!("fragments_to_{}", collector_app)
}

pub fn request_output_port(target: &str) -> String {
    format!("request_output_{}", target)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategy {
    Direct,
    Aggregated,
}

/// Picks the wiring strategy for one application's producers.
///
/// `None` means there is nothing to wire.
pub fn select_strategy(producers: &ProducerRegistry) -> Option<Strategy> {
    if producers.is_empty() {
        None
    } else if producers.has_detector_readout() {
        Some(Strategy::Aggregated)
    } else {
        Some(Strategy::Direct)
    }
}

/// How one application's producers were wired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppWiring {
    pub strategy: Strategy,
    /// Each producer's source id and the boundary connection its data
    /// requests arrive on.
    pub request_connections: BTreeMap<SourceId, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiringReport {
    apps: IndexMap<String, AppWiring>,
}

impl WiringReport {
    pub fn record(&mut self, app: &str, wiring: AppWiring) {
        self.apps.insert(app.to_string(), wiring);
    }

    pub fn get(&self, app: &str) -> Option<&AppWiring> {
        self.apps.get(app)
    }

    pub fn strategy_of(&self, app: &str) -> Option<Strategy> {
        self.apps.get(app).map(|w| w.strategy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AppWiring)> + '_ {
        self.apps.iter()
    }

    /// Source id string to request connection name over all applications,
    /// optionally qualified as `<prefix>.<connection>`.
    pub fn producer_map(&self, prefix: Option<&str>) -> BTreeMap<String, String> {
        self.apps
            .values()
            .flat_map(|w| w.request_connections.iter())
            .map(|(source_id, connection)| {
                let connection = match prefix {
                    Some(prefix) => format!("{}.{}", prefix, connection),
                    None => connection.clone(),
                };
                (source_id.raw_str(), connection)
            })
            .collect()
    }
}

/// Wires the producers of `app_name` with the strategy their subsystems
/// call for. Returns `None` for an application without producers.
pub fn connect_fragment_producers(system: &mut System, app_name: &str) -> Result<Option<AppWiring>> {
    let app = system.app(app_name)?;
    let Some(strategy) = select_strategy(&app.producers) else {
        tracing::debug!("No fragment producers in {}, nothing to wire", app_name);
        return Ok(None);
    };
    let producers: Vec<FragmentProducer> = app.producers.iter().cloned().collect();

    let wiring = match strategy {
        Strategy::Direct => direct::wire(system, app_name, &producers)?,
        Strategy::Aggregated => aggregated::wire(system, app_name, &producers)?,
    };
    Ok(Some(wiring))
}

/// Wires every application except `collector_app`, without finalizing the
/// collectors.
pub fn wire_all_applications(system: &mut System, collector_app: &str) -> Result<WiringReport> {
    system.check_producers()?;
    let mut report = WiringReport::default();
    for name in system.app_names() {
        if name == collector_app {
            continue;
        }
        if let Some(wiring) = connect_fragment_producers(system, &name)? {
            report.record(&name, wiring);
        }
    }
    Ok(report)
}

/// Wires every producer application, then finalizes each collector.
pub fn connect_all_fragment_producers(
    system: &mut System,
    collector_app: &str,
    connection_prefix: Option<&str>,
) -> Result<WiringReport> {
    let report = wire_all_applications(system, collector_app)?;
    finalizer::finalize_collectors(system, &report, connection_prefix)?;
    Ok(report)
}
