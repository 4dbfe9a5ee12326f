use crate::core::module_graph::ModuleGraph;
use crate::domain::model::PluginKind;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Run control command sent to every application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Init,
    Conf,
    Start,
    Stop,
    Pause,
    Resume,
    Scrap,
    Record,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Init,
        Command::Conf,
        Command::Start,
        Command::Stop,
        Command::Pause,
        Command::Resume,
        Command::Scrap,
        Command::Record,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Conf => "conf",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Scrap => "scrap",
            Self::Record => "record",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands a plugin accepts.
pub fn commands_for(kind: PluginKind) -> &'static [Command] {
    use Command::*;
    match kind {
        PluginKind::ModuleLevelTrigger
        | PluginKind::HsiReadout
        | PluginKind::FakeHsiEventGenerator => {
            &[Init, Conf, Start, Stop, Pause, Resume, Scrap]
        }
        PluginKind::DataLinkHandler => &[Init, Conf, Start, Stop, Scrap, Record],
        PluginKind::FragmentAggregator => &[Init, Start, Stop, Scrap],
        PluginKind::TriggerRecordBuilder
        | PluginKind::QueueToNetwork
        | PluginKind::NetworkToQueue => &[Init, Conf, Start, Stop, Scrap],
    }
}

/// Module name to the commands addressed to it, built once from a final
/// graph. Replaces matching command targets against module names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    routes: IndexMap<String, &'static [Command]>,
}

impl RoutingTable {
    pub fn from_graph(graph: &ModuleGraph) -> Self {
        Self {
            routes: graph
                .module_list()
                .map(|m| (m.name.clone(), commands_for(m.plugin())))
                .collect(),
        }
    }

    pub fn commands_of(&self, module: &str) -> &[Command] {
        self.routes.get(module).copied().unwrap_or(&[])
    }

    pub fn accepts(&self, module: &str, command: Command) -> bool {
        self.commands_of(module).contains(&command)
    }

    /// Modules addressed by `command`, in graph order.
    pub fn modules_for(&self, command: Command) -> Vec<&str> {
        self.routes
            .iter()
            .filter(|(_, commands)| commands.contains(&command))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn handles(&self, command: Command) -> bool {
        self.routes.values().any(|commands| commands.contains(&command))
    }
}
