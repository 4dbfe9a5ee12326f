use crate::domain::model::{FragmentProducer, SourceId};
use crate::utils::error::{Result, TopologyError};
use std::collections::BTreeMap;

/// Fragment producers of one application, keyed and ordered by source id.
#[derive(Debug, Clone, Default)]
pub struct ProducerRegistry {
    producers: BTreeMap<SourceId, FragmentProducer>,
}

impl ProducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 註冊後不可修改
    pub fn register(&mut self, app: &str, producer: FragmentProducer) -> Result<()> {
        if self.producers.contains_key(&producer.source_id) {
            return Err(TopologyError::DuplicateProducer {
                app: app.to_string(),
                source_id: producer.source_id.raw_str(),
            });
        }
        self.producers.insert(producer.source_id, producer);
        Ok(())
    }

    pub fn get(&self, source_id: &SourceId) -> Option<&FragmentProducer> {
        self.producers.get(source_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FragmentProducer> + '_ {
        self.producers.values()
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    pub fn has_detector_readout(&self) -> bool {
        self.iter().any(|p| p.source_id.is_detector_readout())
    }

    pub fn mlt_eligible(&self) -> impl Iterator<Item = &FragmentProducer> + '_ {
        self.iter().filter(|p| p.is_mlt_eligible)
    }
}
