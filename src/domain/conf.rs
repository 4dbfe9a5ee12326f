//! Typed per-plugin module configuration.
//!
//! `ModuleConf` is tagged by `plugin`, so a module's kind is always the kind
//! of its configuration record.

use crate::domain::model::{PluginKind, SourceId};
use crate::utils::error::{Result, TopologyError};
use crate::utils::validation::{
    validate_address, validate_non_empty_string, validate_positive_number, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plugin")]
pub enum ModuleConf {
    DataLinkHandler(ReadoutConf),
    TriggerRecordBuilder(TrbConf),
    FragmentAggregator(AggregatorConf),
    ModuleLevelTrigger(MltConf),
    #[serde(rename = "HSIReadout")]
    HsiReadout(HsiReadoutConf),
    #[serde(rename = "FakeHSIEventGenerator")]
    FakeHsiEventGenerator(FakeHsiConf),
    QueueToNetwork(QueueToNetworkConf),
    NetworkToQueue(NetworkToQueueConf),
}

impl ModuleConf {
    pub fn plugin(&self) -> PluginKind {
        match self {
            Self::DataLinkHandler(_) => PluginKind::DataLinkHandler,
            Self::TriggerRecordBuilder(_) => PluginKind::TriggerRecordBuilder,
            Self::FragmentAggregator(_) => PluginKind::FragmentAggregator,
            Self::ModuleLevelTrigger(_) => PluginKind::ModuleLevelTrigger,
            Self::HsiReadout(_) => PluginKind::HsiReadout,
            Self::FakeHsiEventGenerator(_) => PluginKind::FakeHsiEventGenerator,
            Self::QueueToNetwork(_) => PluginKind::QueueToNetwork,
            Self::NetworkToQueue(_) => PluginKind::NetworkToQueue,
        }
    }

    /// The record alone, without the `plugin` tag, as it appears in a
    /// `conf` command document.
    pub fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::DataLinkHandler(c) => serde_json::to_value(c),
            Self::TriggerRecordBuilder(c) => serde_json::to_value(c),
            Self::FragmentAggregator(c) => serde_json::to_value(c),
            Self::ModuleLevelTrigger(c) => serde_json::to_value(c),
            Self::HsiReadout(c) => serde_json::to_value(c),
            Self::FakeHsiEventGenerator(c) => serde_json::to_value(c),
            Self::QueueToNetwork(c) => serde_json::to_value(c),
            Self::NetworkToQueue(c) => serde_json::to_value(c),
        }
    }

    /// Borrow the record as `T`, failing if the module is of another kind.
    pub fn expect<T: PluginConf>(&self, module: &str) -> Result<&T> {
        T::from_conf(self).ok_or_else(|| TopologyError::ConfKindMismatch {
            module: module.to_string(),
            expected: T::KIND.to_string(),
            found: self.plugin().to_string(),
        })
    }
}

impl Validate for ModuleConf {
    fn validate(&self) -> Result<()> {
        match self {
            Self::DataLinkHandler(c) => c.validate(),
            Self::TriggerRecordBuilder(c) => c.validate(),
            Self::FragmentAggregator(_) => Ok(()),
            Self::ModuleLevelTrigger(c) => c.validate(),
            Self::HsiReadout(c) => c.validate(),
            Self::FakeHsiEventGenerator(c) => c.validate(),
            Self::QueueToNetwork(c) => c.validate(),
            Self::NetworkToQueue(c) => c.validate(),
        }
    }
}

/// Implemented by every configuration record so callers can ask a module
/// for its configuration by type.
pub trait PluginConf: Sized + Into<ModuleConf> {
    const KIND: PluginKind;

    fn from_conf(conf: &ModuleConf) -> Option<&Self>;
}

macro_rules! plugin_conf {
    ($ty:ty, $variant:ident) => {
        impl PluginConf for $ty {
            const KIND: PluginKind = PluginKind::$variant;

            fn from_conf(conf: &ModuleConf) -> Option<&Self> {
                match conf {
                    ModuleConf::$variant(c) => Some(c),
                    _ => None,
                }
            }
        }

        impl From<$ty> for ModuleConf {
            fn from(conf: $ty) -> Self {
                ModuleConf::$variant(conf)
            }
        }
    };
}

plugin_conf!(ReadoutConf, DataLinkHandler);
plugin_conf!(TrbConf, TriggerRecordBuilder);
plugin_conf!(AggregatorConf, FragmentAggregator);
plugin_conf!(MltConf, ModuleLevelTrigger);
plugin_conf!(HsiReadoutConf, HsiReadout);
plugin_conf!(FakeHsiConf, FakeHsiEventGenerator);
plugin_conf!(QueueToNetworkConf, QueueToNetwork);
plugin_conf!(NetworkToQueueConf, NetworkToQueue);

/// Readout link handler; registered as a fragment producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadoutConf {
    pub emulator_mode: bool,
    pub data_rate_slowdown_factor: u64,
    pub latency_buffer_size: u64,
    pub num_request_handling_threads: u64,
    pub request_timeout_ms: u64,
}

impl Default for ReadoutConf {
    fn default() -> Self {
        Self {
            emulator_mode: false,
            data_rate_slowdown_factor: 1,
            latency_buffer_size: 3 * 1024,
            num_request_handling_threads: 4,
            request_timeout_ms: 1000,
        }
    }
}

impl Validate for ReadoutConf {
    fn validate(&self) -> Result<()> {
        validate_positive_number(
            "DataLinkHandler.data_rate_slowdown_factor",
            self.data_rate_slowdown_factor,
            1,
        )?;
        validate_positive_number(
            "DataLinkHandler.latency_buffer_size",
            self.latency_buffer_size,
            1,
        )?;
        validate_positive_number(
            "DataLinkHandler.num_request_handling_threads",
            self.num_request_handling_threads,
            1,
        )
    }
}

/// Trigger record builder (collector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrbConf {
    pub general_queue_timeout_ms: u64,
    pub source_id: u32,
    pub max_time_window: u64,
    pub trigger_record_timeout_ms: u64,
    /// Source id string to the connection carrying its data requests.
    pub map: BTreeMap<String, String>,
}

impl Default for TrbConf {
    fn default() -> Self {
        Self {
            general_queue_timeout_ms: 100,
            source_id: 0,
            max_time_window: 0,
            trigger_record_timeout_ms: 0,
            map: BTreeMap::new(),
        }
    }
}

impl Validate for TrbConf {
    fn validate(&self) -> Result<()> {
        validate_positive_number(
            "TriggerRecordBuilder.general_queue_timeout_ms",
            self.general_queue_timeout_ms,
            1,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConf {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadoutMapEntry {
    pub candidate_type: u32,
    pub time_before: u64,
    pub time_after: u64,
}

/// Module level trigger: decides which sources each trigger decision
/// requests data from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MltConf {
    pub links: Vec<SourceId>,
    pub hsi_trigger_type_passthrough: bool,
    pub merge_overlapping_tcs: bool,
    pub buffer_timeout: u64,
    pub td_out_of_timeout: bool,
    pub td_readout_limit: u64,
    pub ignore_tc: Vec<u32>,
    pub use_readout_map: bool,
    pub td_readout_map: Vec<ReadoutMapEntry>,
    pub use_bitwords: bool,
    pub trigger_bitwords: Vec<String>,
}

impl Default for MltConf {
    fn default() -> Self {
        Self {
            links: Vec::new(),
            hsi_trigger_type_passthrough: false,
            merge_overlapping_tcs: true,
            buffer_timeout: 100,
            td_out_of_timeout: true,
            td_readout_limit: 1000,
            ignore_tc: Vec::new(),
            use_readout_map: false,
            td_readout_map: Vec::new(),
            use_bitwords: false,
            trigger_bitwords: Vec::new(),
        }
    }
}

impl Validate for MltConf {
    fn validate(&self) -> Result<()> {
        validate_positive_number("ModuleLevelTrigger.td_readout_limit", self.td_readout_limit, 1)?;
        if self.use_bitwords && self.trigger_bitwords.is_empty() {
            return Err(TopologyError::ConfigValidationError {
                field: "ModuleLevelTrigger.trigger_bitwords".to_string(),
                message: "use_bitwords is set but no bitwords are given".to_string(),
            });
        }
        if self.use_readout_map && self.td_readout_map.is_empty() {
            return Err(TopologyError::ConfigValidationError {
                field: "ModuleLevelTrigger.td_readout_map".to_string(),
                message: "use_readout_map is set but the map is empty".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HsiReadoutConf {
    pub connections_file: String,
    pub readout_period_us: u64,
    pub hsi_device_name: String,
    pub uhal_log_level: String,
}

impl Default for HsiReadoutConf {
    fn default() -> Self {
        Self {
            connections_file: "${TIMING_SHARE}/config/etc/connections.xml".to_string(),
            readout_period_us: 1000,
            hsi_device_name: "BOREAS_FMC".to_string(),
            uhal_log_level: "notice".to_string(),
        }
    }
}

impl Validate for HsiReadoutConf {
    fn validate(&self) -> Result<()> {
        validate_positive_number("HSIReadout.readout_period_us", self.readout_period_us, 1)?;
        validate_non_empty_string("HSIReadout.hsi_device_name", &self.hsi_device_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FakeHsiConf {
    pub clock_frequency: u64,
    pub event_period_ns: u64,
    pub mean_signal_multiplicity: u32,
    pub signal_emulation_mode: u32,
    pub enabled_signals: u32,
}

impl Default for FakeHsiConf {
    fn default() -> Self {
        Self {
            clock_frequency: 50_000_000,
            event_period_ns: 20,
            mean_signal_multiplicity: 0,
            signal_emulation_mode: 0,
            enabled_signals: 0b0000_0001,
        }
    }
}

impl Validate for FakeHsiConf {
    fn validate(&self) -> Result<()> {
        validate_positive_number("FakeHSIEventGenerator.clock_frequency", self.clock_frequency, 1)?;
        validate_positive_number("FakeHSIEventGenerator.event_period_ns", self.event_period_ns, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueToNetworkConf {
    pub msg_type: String,
    pub msg_module_name: String,
    pub address: String,
    #[serde(default = "default_sender_plugin")]
    pub ipm_plugin_type: String,
    #[serde(default = "default_stype")]
    pub stype: String,
}

fn default_sender_plugin() -> String {
    "ZmqSender".to_string()
}

fn default_stype() -> String {
    "msgpack".to_string()
}

impl Validate for QueueToNetworkConf {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("QueueToNetwork.msg_type", &self.msg_type)?;
        validate_address("QueueToNetwork.address", &self.address)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkToQueueConf {
    pub msg_type: String,
    pub msg_module_name: String,
    pub address: String,
    #[serde(default = "default_receiver_plugin")]
    pub ipm_plugin_type: String,
}

fn default_receiver_plugin() -> String {
    "ZmqReceiver".to_string()
}

impl Validate for NetworkToQueueConf {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("NetworkToQueue.msg_type", &self.msg_type)?;
        validate_address("NetworkToQueue.address", &self.address)
    }
}
