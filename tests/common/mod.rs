#![allow(dead_code)]

use daq_topology::domain::conf::{MltConf, ReadoutConf, TrbConf};
use daq_topology::domain::model::{FragmentProducer, PortRef, SourceId, Subsystem};
use daq_topology::{Application, System};

/// Application with one data link handler per producer.
pub fn producer_app(name: &str, producers: &[(Subsystem, u32, bool)]) -> Application {
    let mut app = Application::new(name, "localhost");
    for (subsystem, element, eligible) in producers {
        let module = format!("datahandler_{}", element);
        app.graph.add_module(&module, ReadoutConf::default()).unwrap();
        app.register_producer(FragmentProducer::new(
            SourceId::new(*subsystem, 0, *element),
            PortRef::new(&module, "data_requests_0"),
            PortRef::new(&module, "fragment_queue"),
            *eligible,
        ))
        .unwrap();
    }
    app
}

pub fn readout(count: u32) -> Vec<(Subsystem, u32, bool)> {
    (0..count)
        .map(|element| (Subsystem::DetectorReadout, element, true))
        .collect()
}

pub fn collector_app(name: &str) -> Application {
    let mut app = Application::new(name, "localhost");
    app.graph
        .add_module(
            "trb",
            TrbConf {
                source_id: 7,
                max_time_window: 5000,
                ..TrbConf::default()
            },
        )
        .unwrap();
    app
}

pub fn decision_app(name: &str) -> Application {
    let mut app = Application::new(name, "localhost");
    app.graph
        .add_module(
            "mlt",
            MltConf {
                hsi_trigger_type_passthrough: true,
                buffer_timeout: 250,
                td_readout_limit: 64,
                ..MltConf::default()
            },
        )
        .unwrap();
    app
}

pub fn system(apps: Vec<Application>) -> System {
    let mut system = System::new();
    for app in apps {
        system.add_application(app).unwrap();
    }
    system
}

pub const MINIDAQ_TOML: &str = r#"
[system]
name = "minidaq"
run_number = 42

[network]
hsievent = "tcp://localhost:12344"

[[apps]]
name = "ruemu0"
host = "localhost"

[[apps.modules]]
name = "datahandler_0"
conf = { plugin = "DataLinkHandler", emulator_mode = true }

[[apps.modules]]
name = "datahandler_1"
conf = { plugin = "DataLinkHandler", emulator_mode = true }

[[apps.producers]]
subsystem = "DetectorReadout"
region = 0
element = 0
requests_in = "datahandler_0.data_requests_0"
fragments_out = "datahandler_0.fragment_queue"

[[apps.producers]]
subsystem = "DetectorReadout"
region = 0
element = 1
requests_in = "datahandler_1.data_requests_0"
fragments_out = "datahandler_1.fragment_queue"

[[apps]]
name = "trigger"
host = "localhost"

[[apps.modules]]
name = "mlt"
conf = { plugin = "ModuleLevelTrigger", buffer_timeout = 200 }

[[apps.endpoints]]
name = "hsievent"
bind = "mlt.hsievent_input"
data_type = "HSIEvent"
direction = "in"

[[apps]]
name = "dataflow"
host = "localhost"

[[apps.modules]]
name = "trb"
conf = { plugin = "TriggerRecordBuilder", max_time_window = 1000 }

[hsi]
host = "localhost"
fake = true
"#;
