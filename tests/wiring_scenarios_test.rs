mod common;

use common::*;
use daq_topology::core::producers::ProducerRegistry;
use daq_topology::core::wiring::{
    aggregated, connect_all_fragment_producers, connect_fragment_producers, select_strategy,
    Strategy,
};
use daq_topology::domain::conf::TrbConf;
use daq_topology::domain::model::{Direction, FragmentProducer, PluginKind, PortRef, QueueKind, SourceId, Subsystem};
use daq_topology::TopologyError;

fn request_endpoints(system: &daq_topology::System, app: &str, direction: Direction) -> Vec<String> {
    system
        .app(app)
        .unwrap()
        .graph
        .endpoints()
        .filter(|e| e.direction == direction && e.name.starts_with("data_requests_for_"))
        .map(|e| e.name.clone())
        .collect()
}

#[test]
fn test_scenario_a_aggregated_application() -> anyhow::Result<()> {
    let mut system = system(vec![producer_app("ru0", &readout(3))]);

    let wiring = connect_fragment_producers(&mut system, "ru0")?.expect("producers to wire");
    assert_eq!(wiring.strategy, Strategy::Aggregated);

    let graph = &system.app("ru0")?.graph;
    assert_eq!(
        graph.modules_of_kind(PluginKind::FragmentAggregator).count(),
        1
    );

    let request_queues: Vec<_> = graph
        .queues()
        .filter(|q| q.name.starts_with("data_requests_for_"))
        .collect();
    assert_eq!(request_queues.len(), 3);
    assert!(request_queues.iter().all(|q| q.capacity == 1000));

    let fragment_queue = graph.queue("fragment_queue").expect("shared fragment queue");
    assert_eq!(fragment_queue.capacity, 100_000);
    assert_eq!(fragment_queue.senders.len(), 3);
    assert_eq!(fragment_queue.kind(), QueueKind::Mpmc);

    assert_eq!(
        request_endpoints(&system, "ru0", Direction::In),
        vec!["data_requests_for_ru0"]
    );
    Ok(())
}

#[test]
fn test_scenario_b_direct_application() -> anyhow::Result<()> {
    let mut system = system(vec![producer_app(
        "trigger",
        &[(Subsystem::Trigger, 0, true), (Subsystem::Trigger, 1, true)],
    )]);

    let wiring = connect_fragment_producers(&mut system, "trigger")?.expect("producers to wire");
    assert_eq!(wiring.strategy, Strategy::Direct);

    let graph = &system.app("trigger")?.graph;
    assert!(!graph.has_module_of_kind(PluginKind::FragmentAggregator));
    assert_eq!(graph.queues().count(), 0);
    assert_eq!(
        request_endpoints(&system, "trigger", Direction::In),
        vec!["data_requests_for_Trigger_0_0", "data_requests_for_Trigger_0_1"]
    );
    Ok(())
}

#[test]
fn test_scenario_c_mixed_system_collector() -> anyhow::Result<()> {
    let mut system = system(vec![
        producer_app("ru0", &readout(2)),
        producer_app("trg", &[(Subsystem::Trigger, 0, true)]),
        collector_app("dataflow"),
    ]);

    let report = connect_all_fragment_producers(&mut system, "dataflow", None)?;
    assert_eq!(report.strategy_of("ru0"), Some(Strategy::Aggregated));
    assert_eq!(report.strategy_of("trg"), Some(Strategy::Direct));

    assert_eq!(
        request_endpoints(&system, "dataflow", Direction::Out),
        vec!["data_requests_for_ru0", "data_requests_for_Trigger_0_0"]
    );

    let graph = &system.app("dataflow")?.graph;
    let inbound: Vec<_> = graph
        .inbound_endpoints()
        .filter(|e| e.name == "fragments_to_dataflow")
        .collect();
    assert_eq!(inbound.len(), 1);
    assert_eq!(
        inbound[0].bound_port,
        Some(PortRef::new("trb", "data_fragment_all"))
    );
    assert!(inbound[0].toposort);
    assert_eq!(
        graph.endpoints_in_order().last().map(|e| e.name.as_str()),
        Some("fragments_to_dataflow")
    );

    // 兩個 producer app 都送 fragments 到 collector
    for app in ["ru0", "trg"] {
        let endpoint = system.app(app)?.graph.endpoint("fragments_to_dataflow");
        assert_eq!(endpoint.map(|e| e.direction), Some(Direction::Out));
    }

    let trb = graph.conf_of::<TrbConf>("trb")?;
    assert_eq!(trb.map.len(), 3);
    assert_eq!(trb.map["DetectorReadout_0_1"], "data_requests_for_ru0");
    assert_eq!(trb.map["Trigger_0_0"], "data_requests_for_Trigger_0_0");
    assert_eq!(trb.source_id, 7);
    assert_eq!(trb.max_time_window, 5000);
    Ok(())
}

#[test]
fn test_collector_map_with_connection_prefix() -> anyhow::Result<()> {
    let mut system = system(vec![producer_app("ru0", &readout(1)), collector_app("dataflow")]);
    connect_all_fragment_producers(&mut system, "dataflow", Some("minidaq"))?;

    let trb = system.app("dataflow")?.graph.conf_of::<TrbConf>("trb")?;
    assert_eq!(trb.map["DetectorReadout_0_0"], "minidaq.data_requests_for_ru0");
    Ok(())
}

#[test]
fn test_strategy_depends_only_on_subsystems() {
    let subsystems = [
        Subsystem::Unknown,
        Subsystem::DetectorReadout,
        Subsystem::HwSignalsInterface,
        Subsystem::Trigger,
        Subsystem::TrBuilder,
    ];

    for a in subsystems {
        for b in subsystems {
            for c in subsystems {
                let mut registry = ProducerRegistry::new();
                for (element, subsystem) in [a, b, c].into_iter().enumerate() {
                    registry
                        .register(
                            "app",
                            FragmentProducer::new(
                                SourceId::new(subsystem, 0, element as u32),
                                PortRef::new("m", format!("req_{}", element)),
                                PortRef::new("m", format!("frag_{}", element)),
                                true,
                            ),
                        )
                        .unwrap();
                }

                let expected = if [a, b, c].contains(&Subsystem::DetectorReadout) {
                    Strategy::Aggregated
                } else {
                    Strategy::Direct
                };
                assert_eq!(select_strategy(&registry), Some(expected));
            }
        }
    }

    assert_eq!(select_strategy(&ProducerRegistry::new()), None);
}

#[test]
fn test_boundary_endpoint_counts() -> anyhow::Result<()> {
    for n in 1..=4u32 {
        let direct: Vec<_> = (0..n).map(|e| (Subsystem::Trigger, e, true)).collect();
        let mut system = system(vec![
            producer_app("aggregated", &readout(n)),
            producer_app("direct", &direct),
            collector_app("dataflow"),
        ]);
        connect_all_fragment_producers(&mut system, "dataflow", None)?;

        assert_eq!(request_endpoints(&system, "aggregated", Direction::In).len(), 1);
        assert_eq!(
            request_endpoints(&system, "direct", Direction::In).len(),
            n as usize
        );
    }
    Ok(())
}

#[test]
fn test_second_aggregated_wiring_fails() -> anyhow::Result<()> {
    let mut system = system(vec![producer_app("ru0", &readout(2))]);
    connect_fragment_producers(&mut system, "ru0")?;

    let producers: Vec<_> = system.app("ru0")?.producers.iter().cloned().collect();
    let err = aggregated::wire(&mut system, "ru0", &producers).unwrap_err();
    assert!(matches!(err, TopologyError::DuplicateModule(name) if name == "fragment_aggregator_ru0"));
    assert_eq!(
        system
            .app("ru0")?
            .graph
            .modules_of_kind(PluginKind::FragmentAggregator)
            .count(),
        1
    );
    Ok(())
}

#[test]
fn test_application_without_producers_is_skipped() -> anyhow::Result<()> {
    let mut system = system(vec![decision_app("trigger"), collector_app("dataflow")]);
    let report = connect_all_fragment_producers(&mut system, "dataflow", None)?;

    assert!(report.get("trigger").is_none());
    assert_eq!(system.app("trigger")?.graph.endpoints().count(), 0);
    assert!(system.app("dataflow")?.graph.conf_of::<TrbConf>("trb")?.map.is_empty());
    Ok(())
}

#[test]
fn test_source_id_shared_by_two_readout_apps_fails() -> anyhow::Result<()> {
    let mut shared = daq_topology::System::new();
    shared.add_application(decision_app("trigger"))?;
    shared.add_application(producer_app("ru0", &readout(1)))?;
    shared.add_application(collector_app("dataflow"))?;

    let err = shared
        .add_application(producer_app("ru1", &readout(1)))
        .unwrap_err();
    assert!(matches!(
        err,
        TopologyError::DuplicateProducer { ref source_id, .. } if source_id == "DetectorReadout_0_0"
    ));
    Ok(())
}

#[test]
fn test_late_duplicate_registration_stops_wiring() -> anyhow::Result<()> {
    let mut system = system(vec![
        producer_app("ru0", &readout(1)),
        producer_app("ru1", &[(Subsystem::DetectorReadout, 1, true)]),
        collector_app("dataflow"),
    ]);

    let ru1 = system.app_mut("ru1")?;
    ru1.graph.add_module("datahandler_extra", daq_topology::domain::conf::ReadoutConf::default())?;
    ru1.register_producer(FragmentProducer::new(
        SourceId::new(Subsystem::DetectorReadout, 0, 0),
        PortRef::new("datahandler_extra", "data_requests_0"),
        PortRef::new("datahandler_extra", "fragment_queue"),
        true,
    ))?;

    let err = connect_all_fragment_producers(&mut system, "dataflow", None).unwrap_err();
    assert!(matches!(err, TopologyError::DuplicateProducer { .. }));
    // 失敗時尚未加入任何 hub
    assert!(!system
        .app("ru0")?
        .graph
        .has_module_of_kind(PluginKind::FragmentAggregator));
    Ok(())
}
