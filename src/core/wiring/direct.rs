use super::{data_requests_for, fragments_to, request_output_port, AppWiring, Strategy, DATA_REQUEST, FRAGMENT};
use crate::core::system::System;
use crate::domain::model::{Direction, FragmentProducer, PortRef};
use crate::utils::error::Result;
use std::collections::BTreeMap;

/// Gives every producer its own boundary request endpoint and mirrors one
/// request endpoint per producer in each collector application.
pub fn wire(system: &mut System, app_name: &str, producers: &[FragmentProducer]) -> Result<AppWiring> {
    tracing::info!(
        "Connecting {} fragment producers in {} directly to trigger record builders",
        producers.len(),
        app_name
    );

    let mut request_connections = BTreeMap::new();
    let graph = &mut system.app_mut(app_name)?.graph;
    for producer in producers {
        let connection = data_requests_for(&producer.source_id.raw_str());
        graph.add_endpoint(
            &connection,
            Some(producer.requests_in.clone()),
            DATA_REQUEST,
            Direction::In,
        )?;
        request_connections.insert(producer.source_id, connection);
    }

    for collector in system.collectors() {
        system.app_mut(app_name)?.graph.add_endpoint(
            &fragments_to(&collector.app),
            None,
            FRAGMENT,
            Direction::Out,
        )?;

        let collector_graph = &mut system.app_mut(&collector.app)?.graph;
        for producer in producers {
            let source_id = producer.source_id.raw_str();
            collector_graph.add_endpoint(
                &data_requests_for(&source_id),
                Some(PortRef::new(&collector.module, request_output_port(&source_id))),
                DATA_REQUEST,
                Direction::Out,
            )?;
        }
    }

    Ok(AppWiring {
        strategy: Strategy::Direct,
        request_connections,
    })
}
