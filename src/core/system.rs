use crate::core::module_graph::ModuleGraph;
use crate::core::producers::ProducerRegistry;
use crate::domain::model::{FragmentProducer, PluginKind, SourceId};
use crate::utils::error::{Result, TopologyError};
use crate::utils::validation::{validate_identifier, validate_non_empty_string};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// One deployable process: a host and the module graph it runs.
#[derive(Debug, Clone)]
pub struct Application {
    pub name: String,
    pub host: String,
    pub graph: ModuleGraph,
    pub producers: ProducerRegistry,
}

impl Application {
    pub fn new(name: &str, host: &str) -> Self {
        Self::with_graph(name, host, ModuleGraph::new())
    }

    pub fn with_graph(name: &str, host: &str, graph: ModuleGraph) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            graph,
            producers: ProducerRegistry::new(),
        }
    }

    /// Registers a producer whose ports live on modules of this graph.
    pub fn register_producer(&mut self, producer: FragmentProducer) -> Result<()> {
        for port in [&producer.requests_in, &producer.fragments_out] {
            self.graph.get_module(port.module())?;
        }
        self.producers.register(&self.name, producer)
    }

    /// Name of the first trigger record builder, if this is a collector app.
    pub fn collector_module(&self) -> Option<&str> {
        self.graph
            .modules_of_kind(PluginKind::TriggerRecordBuilder)
            .next()
            .map(|m| m.name.as_str())
    }

    pub fn is_collector(&self) -> bool {
        self.collector_module().is_some()
    }
}

/// All applications of one deployment, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct System {
    apps: IndexMap<String, Application>,
}

/// A collector application and the name of its trigger record builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorRef {
    pub app: String,
    pub module: String,
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_application(&mut self, app: Application) -> Result<()> {
        validate_identifier("apps.name", &app.name)?;
        validate_non_empty_string("apps.host", &app.host)?;
        if self.apps.contains_key(&app.name) {
            return Err(TopologyError::InvalidConfigValueError {
                field: "apps.name".to_string(),
                value: app.name.clone(),
                reason: "Application names must be unique".to_string(),
            });
        }
        for producer in app.producers.iter() {
            self.check_source_id_free(&app.name, &producer.source_id)?;
        }
        self.apps.insert(app.name.clone(), app);
        Ok(())
    }

    fn check_source_id_free(&self, app_name: &str, source_id: &SourceId) -> Result<()> {
        match self
            .apps
            .values()
            .find(|other| other.name != app_name && other.producers.get(source_id).is_some())
        {
            Some(owner) => Err(TopologyError::DuplicateProducer {
                app: format!("{} (already in {})", app_name, owner.name),
                source_id: source_id.raw_str(),
            }),
            None => Ok(()),
        }
    }

    /// Fails if one source id is registered in more than one application,
    /// including producers registered through `app_mut` after
    /// `add_application`.
    pub fn check_producers(&self) -> Result<()> {
        for app in self.apps.values() {
            for producer in app.producers.iter() {
                self.check_source_id_free(&app.name, &producer.source_id)?;
            }
        }
        Ok(())
    }

    pub fn app(&self, name: &str) -> Result<&Application> {
        self.apps
            .get(name)
            .ok_or_else(|| TopologyError::ApplicationNotFound(name.to_string()))
    }

    pub fn app_mut(&mut self, name: &str) -> Result<&mut Application> {
        self.apps
            .get_mut(name)
            .ok_or_else(|| TopologyError::ApplicationNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.apps.contains_key(name)
    }

    pub fn apps(&self) -> impl Iterator<Item = &Application> + '_ {
        self.apps.values()
    }

    pub fn app_names(&self) -> Vec<String> {
        self.apps.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Every application holding a trigger record builder.
    pub fn collectors(&self) -> Vec<CollectorRef> {
        self.apps
            .values()
            .filter_map(|app| {
                app.collector_module().map(|module| CollectorRef {
                    app: app.name.clone(),
                    module: module.to_string(),
                })
            })
            .collect()
    }

    pub fn fragment_producers(&self) -> impl Iterator<Item = &FragmentProducer> + '_ {
        self.apps.values().flat_map(|app| app.producers.iter())
    }

    pub fn mlt_eligible_source_ids(&self) -> BTreeSet<SourceId> {
        self.apps
            .values()
            .flat_map(|app| app.producers.mlt_eligible())
            .map(|p| p.source_id)
            .collect()
    }
}
