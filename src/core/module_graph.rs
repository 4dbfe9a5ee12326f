//! Module graph of one application.
//!
//! Owns the modules, the boundary endpoints and the internal queues, and is
//! the only place where they are mutated. Endpoints and queues share one
//! namespace, and every module port is bound to at most one of them (a
//! receiving port may take several links of the same queue).

use crate::domain::conf::{ModuleConf, PluginConf};
use crate::domain::model::{Direction, Endpoint, Module, PluginKind, PortRef, Queue};
use crate::utils::error::{Result, TopologyError};
use crate::utils::validation::{validate_identifier, validate_positive_number, Validate};
use indexmap::IndexMap;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Endpoint,
    Queue,
}

/// What a module port is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub port: PortRef,
    pub name: String,
    pub kind: BindingKind,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: IndexMap<String, Module>,
    endpoints: IndexMap<String, Endpoint>,
    queues: IndexMap<String, Queue>,
    bindings: BTreeMap<PortRef, PortBinding>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::DuplicateModule` if the name is taken.
    pub fn add_module(&mut self, name: &str, conf: impl Into<ModuleConf>) -> Result<()> {
        validate_identifier("module.name", name)?;
        if self.modules.contains_key(name) {
            return Err(TopologyError::DuplicateModule(name.to_string()));
        }

        let conf = conf.into();
        conf.validate()?;

        tracing::debug!("Adding module {} ({})", name, conf.plugin());
        self.modules.insert(
            name.to_string(),
            Module {
                name: name.to_string(),
                conf,
            },
        );
        Ok(())
    }

    /// Adds a boundary endpoint. `bound_port = None` leaves it unattached
    /// inside this application.
    pub fn add_endpoint(
        &mut self,
        name: &str,
        bound_port: Option<PortRef>,
        data_type: &str,
        direction: Direction,
    ) -> Result<()> {
        self.add_endpoint_with_order(name, bound_port, data_type, direction, false)
    }

    /// Like `add_endpoint`; `toposort` endpoints are emitted after all others.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::DuplicateEndpoint` if an endpoint or queue has
    /// the same name, `TopologyError::ModuleNotFound` if the bound port's
    /// module is missing and `TopologyError::DuplicatePort` if the port is
    /// already bound.
    pub fn add_endpoint_with_order(
        &mut self,
        name: &str,
        bound_port: Option<PortRef>,
        data_type: &str,
        direction: Direction,
        toposort: bool,
    ) -> Result<()> {
        if self.name_taken(name) {
            return Err(TopologyError::DuplicateEndpoint(name.to_string()));
        }

        if let Some(port) = &bound_port {
            self.require_module(port.module())?;
            if let Some(existing) = self.bindings.get(port) {
                return Err(TopologyError::DuplicatePort {
                    port: port.to_string(),
                    bound_to: existing.name.clone(),
                });
            }
            self.bindings.insert(
                port.clone(),
                PortBinding {
                    port: port.clone(),
                    name: name.to_string(),
                    kind: BindingKind::Endpoint,
                    direction,
                },
            );
        }

        tracing::debug!(
            "Adding {} endpoint {} bound to {}",
            direction.as_str(),
            name,
            bound_port
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "<boundary>".to_string())
        );
        self.endpoints.insert(
            name.to_string(),
            Endpoint {
                name: name.to_string(),
                data_type: data_type.to_string(),
                direction,
                bound_port,
                toposort,
            },
        );
        Ok(())
    }

    /// Connects `out_port` to `in_port` through the internal queue
    /// `queue_name`, creating the queue on first use.
    ///
    /// Several senders may share one queue and one receiving port (fan-in);
    /// the queue kind is then derived as multi-producer.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::DuplicatePort` if `out_port` is already bound,
    /// or `in_port` is bound to anything but this queue's receiving side.
    /// Returns `TopologyError::DuplicateEndpoint` if the name belongs to an
    /// endpoint or to a queue of another data type or capacity.
    pub fn connect_modules(
        &mut self,
        out_port: &PortRef,
        in_port: &PortRef,
        data_type: &str,
        queue_name: &str,
        capacity: usize,
    ) -> Result<()> {
        validate_positive_number("queue.capacity", capacity as u64, 1)?;
        if self.endpoints.contains_key(queue_name) {
            return Err(TopologyError::DuplicateEndpoint(queue_name.to_string()));
        }
        if let Some(queue) = self.queues.get(queue_name) {
            if queue.data_type != data_type || queue.capacity != capacity {
                return Err(TopologyError::DuplicateEndpoint(queue_name.to_string()));
            }
        }

        self.require_module(out_port.module())?;
        self.require_module(in_port.module())?;

        if out_port == in_port {
            return Err(TopologyError::DuplicatePort {
                port: out_port.to_string(),
                bound_to: queue_name.to_string(),
            });
        }
        if let Some(existing) = self.bindings.get(out_port) {
            return Err(TopologyError::DuplicatePort {
                port: out_port.to_string(),
                bound_to: existing.name.clone(),
            });
        }
        let shares_receiver = match self.bindings.get(in_port) {
            None => false,
            Some(existing)
                if existing.kind == BindingKind::Queue
                    && existing.direction == Direction::In
                    && existing.name == queue_name =>
            {
                true
            }
            Some(existing) => {
                return Err(TopologyError::DuplicatePort {
                    port: in_port.to_string(),
                    bound_to: existing.name.clone(),
                })
            }
        };

        self.bindings.insert(
            out_port.clone(),
            PortBinding {
                port: out_port.clone(),
                name: queue_name.to_string(),
                kind: BindingKind::Queue,
                direction: Direction::Out,
            },
        );
        if !shares_receiver {
            self.bindings.insert(
                in_port.clone(),
                PortBinding {
                    port: in_port.clone(),
                    name: queue_name.to_string(),
                    kind: BindingKind::Queue,
                    direction: Direction::In,
                },
            );
        }

        let queue = self
            .queues
            .entry(queue_name.to_string())
            .or_insert_with(|| Queue {
                name: queue_name.to_string(),
                data_type: data_type.to_string(),
                capacity,
                senders: Vec::new(),
                receivers: Vec::new(),
            });
        queue.senders.push(out_port.clone());
        if !shares_receiver {
            queue.receivers.push(in_port.clone());
        }

        tracing::debug!("Connected {} -> {} via {}", out_port, in_port, queue_name);
        Ok(())
    }

    /// Replaces a module's configuration wholesale. Nothing of the old
    /// record survives unless the caller carried it into `conf`.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::ModuleNotFound` for an unknown module and
    /// `TopologyError::ConfKindMismatch` if `conf` is of another plugin kind.
    pub fn reset_module_conf(&mut self, name: &str, conf: impl Into<ModuleConf>) -> Result<()> {
        let conf = conf.into();
        let module = self
            .modules
            .get_mut(name)
            .ok_or_else(|| TopologyError::ModuleNotFound(name.to_string()))?;

        if module.plugin() != conf.plugin() {
            return Err(TopologyError::ConfKindMismatch {
                module: name.to_string(),
                expected: module.plugin().to_string(),
                found: conf.plugin().to_string(),
            });
        }
        conf.validate()?;

        module.conf = conf;
        Ok(())
    }

    /// Read-modify-write of a module's configuration. `update` works on a
    /// copy of the current record, so every field it does not touch keeps
    /// its value.
    pub fn update_module_conf<T, F>(&mut self, name: &str, update: F) -> Result<()>
    where
        T: PluginConf + Clone,
        F: FnOnce(&mut T),
    {
        let mut conf = self.conf_of::<T>(name)?.clone();
        update(&mut conf);
        self.reset_module_conf(name, conf)
    }

    pub fn conf_of<T: PluginConf>(&self, name: &str) -> Result<&T> {
        self.get_module(name)?.conf.expect::<T>(name)
    }

    pub fn get_module(&self, name: &str) -> Result<&Module> {
        self.modules
            .get(name)
            .ok_or_else(|| TopologyError::ModuleNotFound(name.to_string()))
    }

    pub fn module_list(&self) -> impl Iterator<Item = &Module> + '_ {
        self.modules.values()
    }

    pub fn modules_of_kind(&self, kind: PluginKind) -> impl Iterator<Item = &Module> + '_ {
        self.modules.values().filter(move |m| m.plugin() == kind)
    }

    pub fn has_module_of_kind(&self, kind: PluginKind) -> bool {
        self.modules_of_kind(kind).next().is_some()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// Endpoints in declaration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> + '_ {
        self.endpoints.values()
    }

    /// Endpoints in emission order: unflagged first, then `toposort` ones,
    /// each group in declaration order.
    pub fn endpoints_in_order(&self) -> Vec<&Endpoint> {
        let (mut ordered, deferred): (Vec<&Endpoint>, Vec<&Endpoint>) =
            self.endpoints.values().partition(|e| !e.toposort);
        ordered.extend(deferred);
        ordered
    }

    pub fn inbound_endpoints(&self) -> impl Iterator<Item = &Endpoint> + '_ {
        self.endpoints
            .values()
            .filter(|e| e.direction == Direction::In)
    }

    pub fn outbound_endpoints(&self) -> impl Iterator<Item = &Endpoint> + '_ {
        self.endpoints
            .values()
            .filter(|e| e.direction == Direction::Out)
    }

    pub fn queue(&self, name: &str) -> Option<&Queue> {
        self.queues.get(name)
    }

    pub fn queues(&self) -> impl Iterator<Item = &Queue> + '_ {
        self.queues.values()
    }

    /// Bindings of one module's ports, sorted by port name.
    pub fn port_bindings(&self, module: &str) -> Vec<&PortBinding> {
        self.bindings
            .values()
            .filter(|b| b.port.module() == module)
            .collect()
    }

    fn name_taken(&self, name: &str) -> bool {
        self.endpoints.contains_key(name) || self.queues.contains_key(name)
    }

    fn require_module(&self, name: &str) -> Result<()> {
        if self.modules.contains_key(name) {
            Ok(())
        } else {
            Err(TopologyError::ModuleNotFound(name.to_string()))
        }
    }
}
