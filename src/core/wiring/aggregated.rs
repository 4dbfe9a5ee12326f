use super::{
    data_requests_for, fragments_to, request_output_port, AppWiring, Strategy, DATA_REQUEST,
    FRAGMENT, FRAGMENT_QUEUE_CAPACITY, REQUEST_QUEUE_CAPACITY,
};
use crate::core::system::System;
use crate::domain::conf::AggregatorConf;
use crate::domain::model::{Direction, FragmentProducer, PortRef};
use crate::utils::error::Result;

pub const FRAGMENT_QUEUE: &str = "fragment_queue";

pub fn aggregator_name(app_name: &str) -> String {
    format!("fragment_aggregator_{}", app_name)
}

/// Multiplexes all producers of `app_name` through one fragment aggregator.
///
/// Adds the hub module, one boundary request endpoint for the whole
/// application, a shared fragment queue into the hub and one request queue
/// from the hub to each producer. Each collector application gets a single
/// mirrored request endpoint for this application.
///
/// # Errors
///
/// Returns `TopologyError::DuplicateModule` if the application already has
/// its aggregator; this builder runs at most once per application.
pub fn wire(system: &mut System, app_name: &str, producers: &[FragmentProducer]) -> Result<AppWiring> {
    tracing::info!(
        "Connecting {} fragment producers in {} to trigger record builders using a FragmentAggregator",
        producers.len(),
        app_name
    );

    let hub = aggregator_name(app_name);
    let boundary = data_requests_for(app_name);
    let graph = &mut system.app_mut(app_name)?.graph;

    graph.add_module(&hub, AggregatorConf::default())?;
    graph.add_endpoint(
        &boundary,
        Some(PortRef::new(&hub, "data_req_input")),
        DATA_REQUEST,
        Direction::In,
    )?;

    let fragment_input = PortRef::new(&hub, "fragment_input");
    for producer in producers {
        graph.connect_modules(
            &producer.fragments_out,
            &fragment_input,
            FRAGMENT,
            FRAGMENT_QUEUE,
            FRAGMENT_QUEUE_CAPACITY,
        )?;
    }

    for producer in producers {
        let source_id = producer.source_id.raw_str();
        graph.connect_modules(
            &PortRef::new(&hub, request_output_port(&source_id)),
            &producer.requests_in,
            DATA_REQUEST,
            &data_requests_for(&source_id),
            REQUEST_QUEUE_CAPACITY,
        )?;
    }

    for collector in system.collectors() {
        system.app_mut(app_name)?.graph.add_endpoint(
            &fragments_to(&collector.app),
            None,
            FRAGMENT,
            Direction::Out,
        )?;
        system.app_mut(&collector.app)?.graph.add_endpoint(
            &boundary,
            Some(PortRef::new(&collector.module, request_output_port(app_name))),
            DATA_REQUEST,
            Direction::Out,
        )?;
    }

    Ok(AppWiring {
        strategy: Strategy::Aggregated,
        request_connections: producers
            .iter()
            .map(|p| (p.source_id, boundary.clone()))
            .collect(),
    })
}
