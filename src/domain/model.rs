use crate::domain::conf::ModuleConf;
use crate::utils::error::{Result, TopologyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subsystem tag of a fragment source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subsystem {
    Unknown,
    DetectorReadout,
    HwSignalsInterface,
    Trigger,
    TrBuilder,
}

impl Subsystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::DetectorReadout => "DetectorReadout",
            Self::HwSignalsInterface => "HwSignalsInterface",
            Self::Trigger => "Trigger",
            Self::TrBuilder => "TrBuilder",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subsystem {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Unknown" => Ok(Self::Unknown),
            "DetectorReadout" => Ok(Self::DetectorReadout),
            "HwSignalsInterface" => Ok(Self::HwSignalsInterface),
            "Trigger" => Ok(Self::Trigger),
            "TrBuilder" => Ok(Self::TrBuilder),
            other => Err(TopologyError::InvalidConfigValueError {
                field: "subsystem".to_string(),
                value: other.to_string(),
                reason: "Unknown subsystem".to_string(),
            }),
        }
    }
}

/// Identifies one fragment producer: `(subsystem, region, element)`.
///
/// The canonical string form is `<Subsystem>_<region>_<element>`. Subsystem
/// names never contain `_`, so two different ids never share a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId {
    pub subsystem: Subsystem,
    pub region: u32,
    pub element: u32,
}

impl SourceId {
    pub fn new(subsystem: Subsystem, region: u32, element: u32) -> Self {
        Self {
            subsystem,
            region,
            element,
        }
    }

    pub fn raw_str(&self) -> String {
        self.to_string()
    }

    pub fn is_detector_readout(&self) -> bool {
        self.subsystem == Subsystem::DetectorReadout
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.subsystem, self.region, self.element)
    }
}

impl FromStr for SourceId {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| TopologyError::InvalidConfigValueError {
            field: "source_id".to_string(),
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.split('_');
        let (Some(subsystem), Some(region), Some(element), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("Expected <subsystem>_<region>_<element>"));
        };

        Ok(Self {
            subsystem: subsystem.parse()?,
            region: region
                .parse()
                .map_err(|_| invalid("Region must be an unsigned integer"))?,
            element: element
                .parse()
                .map_err(|_| invalid("Element must be an unsigned integer"))?,
        })
    }
}

/// A named port on a module, written `module.port`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortRef {
    module: String,
    port: String,
}

impl PortRef {
    pub fn new(module: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            port: port.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.port)
    }
}

impl FromStr for PortRef {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('.') {
            Some((module, port)) if !module.is_empty() && !port.is_empty() => {
                Ok(Self::new(module, port))
            }
            _ => Err(TopologyError::InvalidPortRef(s.to_string())),
        }
    }
}

impl TryFrom<String> for PortRef {
    type Error = TopologyError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PortRef> for String {
    fn from(value: PortRef) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "input",
            Self::Out => "output",
        }
    }
}

/// Delivery semantics of an internal queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueKind {
    #[serde(rename = "FollySPSCQueue")]
    Spsc,
    #[serde(rename = "FollyMPMCQueue")]
    Mpmc,
}

impl QueueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spsc => "FollySPSCQueue",
            Self::Mpmc => "FollyMPMCQueue",
        }
    }
}

/// Closed set of module plugins the generator knows how to wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginKind {
    DataLinkHandler,
    TriggerRecordBuilder,
    FragmentAggregator,
    ModuleLevelTrigger,
    HsiReadout,
    FakeHsiEventGenerator,
    QueueToNetwork,
    NetworkToQueue,
}

impl PluginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataLinkHandler => "DataLinkHandler",
            Self::TriggerRecordBuilder => "TriggerRecordBuilder",
            Self::FragmentAggregator => "FragmentAggregator",
            Self::ModuleLevelTrigger => "ModuleLevelTrigger",
            Self::HsiReadout => "HSIReadout",
            Self::FakeHsiEventGenerator => "FakeHSIEventGenerator",
            Self::QueueToNetwork => "QueueToNetwork",
            Self::NetworkToQueue => "NetworkToQueue",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub name: String,
    pub conf: ModuleConf,
}

impl Module {
    pub fn plugin(&self) -> PluginKind {
        self.conf.plugin()
    }
}

/// Named connection point of an application graph.
///
/// An endpoint without `bound_port` is not attached to any module inside the
/// application; its far side is resolved across the application boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub name: String,
    pub data_type: String,
    pub direction: Direction,
    pub bound_port: Option<PortRef>,
    /// Emitted after every unflagged endpoint.
    pub toposort: bool,
}

/// Internal bounded queue between module ports of one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Queue {
    pub name: String,
    pub data_type: String,
    pub capacity: usize,
    pub senders: Vec<PortRef>,
    pub receivers: Vec<PortRef>,
}

impl Queue {
    pub fn kind(&self) -> QueueKind {
        if self.senders.len() <= 1 && self.receivers.len() <= 1 {
            QueueKind::Spsc
        } else {
            QueueKind::Mpmc
        }
    }
}

/// A module that answers data requests with fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentProducer {
    pub source_id: SourceId,
    pub requests_in: PortRef,
    pub fragments_out: PortRef,
    pub is_mlt_eligible: bool,
}

impl FragmentProducer {
    pub fn new(
        source_id: SourceId,
        requests_in: PortRef,
        fragments_out: PortRef,
        is_mlt_eligible: bool,
    ) -> Self {
        Self {
            source_id,
            requests_in,
            fragments_out,
            is_mlt_eligible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_string_round_trip() {
        let id = SourceId::new(Subsystem::DetectorReadout, 1, 12);
        assert_eq!(id.raw_str(), "DetectorReadout_1_12");
        assert_eq!("DetectorReadout_1_12".parse::<SourceId>().unwrap(), id);
    }

    #[test]
    fn test_source_id_strings_do_not_collide() {
        let a = SourceId::new(Subsystem::Trigger, 1, 12);
        let b = SourceId::new(Subsystem::Trigger, 11, 2);
        assert_ne!(a.raw_str(), b.raw_str());
    }

    #[test]
    fn test_source_id_rejects_malformed() {
        assert!("DetectorReadout_1".parse::<SourceId>().is_err());
        assert!("DetectorReadout_1_2_3".parse::<SourceId>().is_err());
        assert!("Nope_1_2".parse::<SourceId>().is_err());
        assert!("Trigger_x_2".parse::<SourceId>().is_err());
    }

    #[test]
    fn test_port_ref_parse() {
        let port: PortRef = "datahandler_0.request_input".parse().unwrap();
        assert_eq!(port.module(), "datahandler_0");
        assert_eq!(port.port(), "request_input");
        assert_eq!(port.to_string(), "datahandler_0.request_input");

        assert!(matches!(
            "no_separator".parse::<PortRef>(),
            Err(TopologyError::InvalidPortRef(_))
        ));
        assert!(".port".parse::<PortRef>().is_err());
        assert!("module.".parse::<PortRef>().is_err());
    }

    #[test]
    fn test_queue_kind_derived_from_fan_in() {
        let mut queue = Queue {
            name: "fragment_queue".to_string(),
            data_type: "Fragment".to_string(),
            capacity: 100_000,
            senders: vec![PortRef::new("a", "out")],
            receivers: vec![PortRef::new("hub", "in")],
        };
        assert_eq!(queue.kind(), QueueKind::Spsc);

        queue.senders.push(PortRef::new("b", "out"));
        assert_eq!(queue.kind(), QueueKind::Mpmc);
    }
}
