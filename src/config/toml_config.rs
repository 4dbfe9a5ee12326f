use crate::apps::{fake_hsi_app, hsi_app, FakeHsiOptions, NetworkEndpoints};
use crate::apps::hsi::HSI_EVENT_ENDPOINT;
use crate::core::generator::GeneratorOptions;
use crate::core::system::{Application, System};
use crate::core::SystemSource;
use crate::domain::conf::{HsiReadoutConf, ModuleConf};
use crate::domain::model::{Direction, FragmentProducer, PortRef, SourceId, Subsystem};
use crate::output::boot::last_app_port;
use crate::output::{RenderOptions, RunParams, DEFAULT_BASE_APP_PORT};
use crate::utils::error::{Result, TopologyError};
use crate::utils::validation::{
    validate_address, validate_identifier, validate_non_empty_string, validate_positive_number,
    Validate,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// System description read from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub system: SystemSection,
    #[serde(default)]
    pub apps: Vec<AppConfig>,
    pub hsi: Option<HsiSection>,
    /// 網路端點 name -> tcp://host:port
    #[serde(default)]
    pub network: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSection {
    pub name: String,
    #[serde(default = "default_collector_app")]
    pub collector_app: String,
    #[serde(default = "default_decision_app")]
    pub decision_app: String,
    #[serde(default = "default_run_number")]
    pub run_number: u64,
    #[serde(default)]
    pub disable_data_storage: bool,
    #[serde(default = "default_base_app_port")]
    pub base_app_port: u16,
    pub connection_prefix: Option<String>,
}

fn default_collector_app() -> String {
    GeneratorOptions::default().collector_app
}

fn default_decision_app() -> String {
    GeneratorOptions::default().decision_app
}

fn default_run_number() -> u64 {
    RunParams::default().run_number
}

fn default_base_app_port() -> u16 {
    DEFAULT_BASE_APP_PORT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    #[serde(default)]
    pub queues: Vec<QueueConfig>,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default)]
    pub producers: Vec<ProducerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub conf: ModuleConf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub name: String,
    pub from: PortRef,
    pub to: PortRef,
    pub data_type: String,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub bind: Option<PortRef>,
    pub data_type: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    pub subsystem: Subsystem,
    pub region: u32,
    pub element: u32,
    pub requests_in: PortRef,
    pub fragments_out: PortRef,
    #[serde(default = "default_mlt_eligible")]
    pub mlt_eligible: bool,
}

fn default_mlt_eligible() -> bool {
    true
}

impl ProducerConfig {
    pub fn source_id(&self) -> SourceId {
        SourceId::new(self.subsystem, self.region, self.element)
    }
}

/// 硬體或模擬的 HSI 應用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsiSection {
    #[serde(default = "default_hsi_app")]
    pub app: String,
    pub host: String,
    #[serde(default)]
    pub fake: bool,
    #[serde(default)]
    pub readout: HsiReadoutConf,
    #[serde(default)]
    pub emulator: FakeHsiOptions,
}

fn default_hsi_app() -> String {
    "hsi".to_string()
}

impl SystemConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TopologyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TopologyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DAQ_HOST})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TopologyError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("system.name", &self.system.name)?;
        validate_identifier("system.collector_app", &self.system.collector_app)?;
        validate_identifier("system.decision_app", &self.system.decision_app)?;
        validate_positive_number("system.base_app_port", self.system.base_app_port as u64, 1)?;

        if self.apps.is_empty() && self.hsi.is_none() {
            return Err(TopologyError::MissingConfigError {
                field: "apps".to_string(),
            });
        }
        last_app_port(
            self.system.base_app_port,
            self.apps.len() + usize::from(self.hsi.is_some()),
        )?;

        for (name, address) in &self.network {
            validate_address(&format!("network.{}", name), address)?;
        }

        for app in &self.apps {
            validate_identifier("apps.name", &app.name)?;
            validate_non_empty_string(&format!("apps.{}.host", app.name), &app.host)?;
            for queue in &app.queues {
                validate_positive_number(
                    &format!("apps.{}.queues.{}.capacity", app.name, queue.name),
                    queue.capacity as u64,
                    1,
                )?;
            }
            for module in &app.modules {
                module.conf.validate()?;
            }
        }

        if let Some(hsi) = &self.hsi {
            validate_identifier("hsi.app", &hsi.app)?;
            validate_non_empty_string("hsi.host", &hsi.host)?;
        }

        Ok(())
    }

    pub fn run_params(&self) -> RunParams {
        RunParams {
            run_number: self.system.run_number,
            disable_data_storage: self.system.disable_data_storage,
        }
    }

    pub fn render_options(&self, dot: bool) -> RenderOptions {
        RenderOptions {
            run: self.run_params(),
            base_app_port: self.system.base_app_port,
            dot,
        }
    }

    fn network_endpoints(&self) -> Result<NetworkEndpoints> {
        let mut endpoints = NetworkEndpoints::new();
        for (name, address) in &self.network {
            endpoints.insert(name, address)?;
        }
        if let Some(hsi) = &self.hsi {
            if endpoints.get(HSI_EVENT_ENDPOINT).is_none() {
                let address = endpoints.allocate(HSI_EVENT_ENDPOINT, &hsi.host)?;
                tracing::debug!("Allocated {} at {}", HSI_EVENT_ENDPOINT, address);
            }
        }
        Ok(endpoints)
    }

    fn build_application(app: &AppConfig) -> Result<Application> {
        let mut application = Application::new(&app.name, &app.host);
        let graph = &mut application.graph;

        for module in &app.modules {
            graph.add_module(&module.name, module.conf.clone())?;
        }
        for queue in &app.queues {
            graph.connect_modules(
                &queue.from,
                &queue.to,
                &queue.data_type,
                &queue.name,
                queue.capacity,
            )?;
        }
        for endpoint in &app.endpoints {
            graph.add_endpoint(
                &endpoint.name,
                endpoint.bind.clone(),
                &endpoint.data_type,
                endpoint.direction,
            )?;
        }
        for producer in &app.producers {
            application.register_producer(FragmentProducer::new(
                producer.source_id(),
                producer.requests_in.clone(),
                producer.fragments_out.clone(),
                producer.mlt_eligible,
            ))?;
        }

        Ok(application)
    }
}

impl SystemSource for SystemConfig {
    fn build_system(&self) -> Result<System> {
        let mut system = System::new();
        for app in &self.apps {
            system.add_application(Self::build_application(app)?)?;
        }

        if let Some(hsi) = &self.hsi {
            let endpoints = self.network_endpoints()?;
            let app = if hsi.fake {
                fake_hsi_app(&endpoints, &hsi.app, &hsi.host, &hsi.emulator)?
            } else {
                hsi_app(&endpoints, &hsi.app, &hsi.host, hsi.readout.clone())?
            };
            system.add_application(app)?;
        }

        Ok(system)
    }

    fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            collector_app: self.system.collector_app.clone(),
            decision_app: self.system.decision_app.clone(),
            connection_prefix: self.system.connection_prefix.clone(),
        }
    }
}

impl Validate for SystemConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
