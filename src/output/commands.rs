//! Lifecycle command documents, per application and top level.

use crate::core::generator::{GeneratorOptions, Topology};
use crate::core::routing::{Command, RoutingTable};
use crate::core::system::{Application, System};
use crate::domain::model::QueueKind;
use crate::utils::error::Result;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    pub run_number: u64,
    pub disable_data_storage: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            run_number: 333,
            disable_data_storage: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct QueueSpec<'a> {
    inst: &'a str,
    kind: QueueKind,
    capacity: usize,
}

#[derive(Debug, Serialize)]
struct EndpointSpec<'a> {
    name: &'a str,
    data_type: &'a str,
    dir: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    internal_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct PortInfo<'a> {
    name: &'a str,
    inst: &'a str,
    dir: &'static str,
}

#[derive(Debug, Serialize)]
struct ModuleSpec<'a> {
    inst: &'a str,
    plugin: &'static str,
    data: ModuleData<'a>,
}

#[derive(Debug, Serialize)]
struct ModuleData<'a> {
    qinfos: Vec<PortInfo<'a>>,
}

#[derive(Debug, Serialize)]
struct AddressedCmd<'a> {
    #[serde(rename = "match")]
    target: &'a str,
    data: Value,
}

fn init_document(app: &Application) -> Result<Value> {
    let graph = &app.graph;

    let mut queues: Vec<QueueSpec<'_>> = graph
        .queues()
        .map(|q| QueueSpec {
            inst: &q.name,
            kind: q.kind(),
            capacity: q.capacity,
        })
        .collect();
    queues.sort_by(|a, b| a.inst.cmp(b.inst));

    let endpoints: Vec<EndpointSpec<'_>> = graph
        .endpoints_in_order()
        .into_iter()
        .map(|e| EndpointSpec {
            name: &e.name,
            data_type: &e.data_type,
            dir: e.direction.as_str(),
            internal_name: e.bound_port.as_ref().map(ToString::to_string),
        })
        .collect();

    let modules: Vec<ModuleSpec<'_>> = graph
        .module_list()
        .map(|m| ModuleSpec {
            inst: &m.name,
            plugin: m.plugin().as_str(),
            data: ModuleData {
                qinfos: graph
                    .port_bindings(&m.name)
                    .into_iter()
                    .map(|b| PortInfo {
                        name: b.port.port(),
                        inst: &b.name,
                        dir: b.direction.as_str(),
                    })
                    .collect(),
            },
        })
        .collect();

    Ok(json!({
        "queues": queues,
        "endpoints": endpoints,
        "modules": modules,
    }))
}

fn addressed_document(
    app: &Application,
    routing: &RoutingTable,
    command: Command,
    run: &RunParams,
) -> Result<Value> {
    let mut modules = Vec::new();
    for name in routing.modules_for(command) {
        let data = match command {
            Command::Conf => app.graph.get_module(name)?.conf.payload()?,
            Command::Start => json!({
                "run": run.run_number,
                "disable_data_storage": run.disable_data_storage,
            }),
            _ => Value::Null,
        };
        modules.push(AddressedCmd { target: name, data });
    }
    Ok(json!({ "modules": modules }))
}

/// Command document for one application.
pub fn app_command_document(
    app: &Application,
    routing: &RoutingTable,
    command: Command,
    run: &RunParams,
) -> Result<Value> {
    match command {
        Command::Init => init_document(app),
        _ => addressed_document(app, routing, command, run),
    }
}

/// Start order: producer applications, then collectors, then the decision
/// application. Stop uses the reverse.
pub fn start_order(system: &System, options: &GeneratorOptions) -> Vec<String> {
    let rank = |app: &Application| {
        if app.name == options.decision_app {
            2
        } else if app.is_collector() {
            1
        } else {
            0
        }
    };

    let mut apps: Vec<&Application> = system.apps().collect();
    // sort_by_key is stable, declaration order is kept within a rank
    apps.sort_by_key(|app| rank(*app));
    apps.into_iter().map(|app| app.name.clone()).collect()
}

/// Top level document naming each application's command file.
pub fn top_level_document(topology: &Topology, command: Command, options: &GeneratorOptions) -> Value {
    let addressed = |app: &String| match command {
        Command::Pause | Command::Resume => topology
            .routing
            .get(app)
            .is_some_and(|table| table.handles(command)),
        _ => true,
    };

    let apps: IndexMap<&String, String> = topology
        .routing
        .keys()
        .filter(|app| addressed(*app))
        .map(|app| (app, format!("data/{}_{}", app, command)))
        .collect();

    let mut doc = json!({ "apps": apps });
    match command {
        Command::Start => {
            doc["order"] = json!(start_order(&topology.system, options));
        }
        Command::Stop => {
            let mut order = start_order(&topology.system, options);
            order.reverse();
            doc["order"] = json!(order);
        }
        _ => {}
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::module_graph::ModuleGraph;
    use crate::domain::conf::{MltConf, ReadoutConf, TrbConf};

    fn system() -> System {
        let mut system = System::new();
        let mut trigger = Application::new("trigger", "t");
        trigger.graph.add_module("mlt", MltConf::default()).unwrap();
        let mut df = Application::new("dataflow", "d");
        df.graph.add_module("trb", TrbConf::default()).unwrap();
        let mut ru = Application::new("ru0", "r");
        ru.graph
            .add_module("datahandler_0", ReadoutConf::default())
            .unwrap();
        system.add_application(trigger).unwrap();
        system.add_application(df).unwrap();
        system.add_application(ru).unwrap();
        system
    }

    #[test]
    fn test_start_order_by_role() {
        let order = start_order(&system(), &GeneratorOptions::default());
        assert_eq!(order, vec!["ru0", "dataflow", "trigger"]);
    }

    #[test]
    fn test_conf_document_addresses_modules() {
        let system = system();
        let app = system.app("trigger").unwrap();
        let routing = RoutingTable::from_graph(&app.graph);
        let doc = app_command_document(app, &routing, Command::Conf, &RunParams::default()).unwrap();

        assert_eq!(doc["modules"][0]["match"], "mlt");
        assert_eq!(doc["modules"][0]["data"]["buffer_timeout"], 100);
    }

    #[test]
    fn test_init_document_sorts_queues() {
        let mut graph = ModuleGraph::new();
        graph.add_module("a", ReadoutConf::default()).unwrap();
        graph.add_module("b", ReadoutConf::default()).unwrap();
        graph
            .connect_modules(
                &"a.out".parse().unwrap(),
                &"b.in".parse().unwrap(),
                "Fragment",
                "z_queue",
                10,
            )
            .unwrap();
        graph
            .connect_modules(
                &"b.out".parse().unwrap(),
                &"a.in".parse().unwrap(),
                "Fragment",
                "a_queue",
                10,
            )
            .unwrap();
        let app = Application::with_graph("ru0", "localhost", graph);
        let routing = RoutingTable::from_graph(&app.graph);

        let doc = app_command_document(&app, &routing, Command::Init, &RunParams::default()).unwrap();
        assert_eq!(doc["queues"][0]["inst"], "a_queue");
        assert_eq!(doc["queues"][1]["inst"], "z_queue");
        assert_eq!(doc["queues"][0]["kind"], "FollySPSCQueue");
        assert_eq!(doc["modules"][0]["data"]["qinfos"][0]["name"], "in");
    }
}
