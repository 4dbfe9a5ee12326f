use crate::core::links;
use crate::core::routing::RoutingTable;
use crate::core::system::System;
use crate::core::wiring::{connect_all_fragment_producers, WiringReport};
use crate::domain::ports::SystemSource;
use crate::utils::error::Result;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Application skipped when wiring producers.
    pub collector_app: String,
    /// Application holding the `mlt` module.
    pub decision_app: String,
    /// Qualifies the connection names in the collector's producer map.
    pub connection_prefix: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            collector_app: "dataflow".to_string(),
            decision_app: "trigger".to_string(),
            connection_prefix: None,
        }
    }
}

/// Fully wired system, ready for serialization.
#[derive(Debug, Clone)]
pub struct Topology {
    pub system: System,
    pub wiring: WiringReport,
    pub routing: IndexMap<String, RoutingTable>,
    /// `None` when the system has no decision application.
    pub link_count: Option<usize>,
}

pub struct TopologyGenerator {
    options: GeneratorOptions,
}

impl TopologyGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn from_source<S: SystemSource>(source: &S) -> Result<Topology> {
        let system = source.build_system()?;
        Self::new(source.generator_options()).run(system)
    }

    /// Runs the generation phases in order: producer wiring, collector
    /// finalization, link synchronization, routing tables. Any error aborts
    /// the whole run.
    pub fn run(&self, mut system: System) -> Result<Topology> {
        tracing::info!(
            "Generating topology for {} applications ({} fragment producers)",
            system.len(),
            system.fragment_producers().count()
        );

        // Wire + finalize
        let wiring = connect_all_fragment_producers(
            &mut system,
            &self.options.collector_app,
            self.options.connection_prefix.as_deref(),
        )?;
        tracing::info!("Wired fragment producers of {} applications", wiring.iter().count());

        // Links
        let link_count = if system.contains(&self.options.decision_app) {
            Some(links::synchronize(&mut system, &self.options.decision_app)?)
        } else {
            tracing::warn!(
                "No application named '{}', skipping MLT link synchronization",
                self.options.decision_app
            );
            None
        };

        let routing = system
            .apps()
            .map(|app| (app.name.clone(), RoutingTable::from_graph(&app.graph)))
            .collect();

        tracing::info!("Topology generation complete");
        Ok(Topology {
            system,
            wiring,
            routing,
            link_count,
        })
    }
}
