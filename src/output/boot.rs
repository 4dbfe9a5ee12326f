use crate::core::system::System;
use crate::utils::error::{Result, TopologyError};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_BASE_APP_PORT: u16 = 3333;
pub const APP_EXECUTABLE: &str = "daq_application";

/// Where and how each application process is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootDescriptor {
    pub env: BTreeMap<String, String>,
    pub hosts: IndexMap<String, String>,
    pub apps: IndexMap<String, BootApp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootApp {
    pub exec: String,
    pub host: String,
    pub port: u16,
}

pub fn host_alias(app_name: &str) -> String {
    format!("host_{}", app_name)
}

/// Last control port handed out when `app_count` applications start at
/// `base_port`.
///
/// # Errors
///
/// Returns `TopologyError::InvalidConfigValueError` if the range runs past
/// port 65535.
pub fn last_app_port(base_port: u16, app_count: usize) -> Result<u16> {
    let offset = app_count.saturating_sub(1);
    u16::try_from(offset)
        .ok()
        .and_then(|offset| base_port.checked_add(offset))
        .ok_or_else(|| TopologyError::InvalidConfigValueError {
            field: "system.base_app_port".to_string(),
            value: base_port.to_string(),
            reason: format!("{} applications do not fit below port 65535", app_count),
        })
}

/// One host alias and one control port per application, ports assigned
/// sequentially from `base_port` in declaration order.
pub fn boot_descriptor(system: &System, base_port: u16) -> Result<BootDescriptor> {
    last_app_port(base_port, system.len())?;

    let env = BTreeMap::from([
        ("DBT_AREA_ROOT".to_string(), "env".to_string()),
        ("DBT_ROOT".to_string(), "env".to_string()),
    ]);

    let mut hosts = IndexMap::new();
    let mut apps = IndexMap::new();
    let mut port = base_port;
    for (idx, app) in system.apps().enumerate() {
        if idx > 0 {
            // 範圍已由 last_app_port 檢查
            port += 1;
        }
        let alias = host_alias(&app.name);
        hosts.insert(alias.clone(), app.host.clone());
        apps.insert(
            app.name.clone(),
            BootApp {
                exec: APP_EXECUTABLE.to_string(),
                host: alias,
                port,
            },
        );
    }

    Ok(BootDescriptor { env, hosts, apps })
}
