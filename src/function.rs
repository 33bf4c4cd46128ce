//! The class-specific Audio Control block of one audio function: header followed by its clock entities, terminals and units
//!
//! Entities share one flat id namespace and refer to each other only by id. [`AudioControlBlock::encode`] validates that namespace and fills wTotalLength of the header from the encoded entities.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::{DescriptorContext, DescriptorKind, CS_INTERFACE};
use crate::codec::{self, DescriptorScanner, ScannedDescriptor};
use crate::controls::ControlMap;
use crate::descriptors::*;
use crate::error::{self, Error, ErrorKind};

/// Role an id plays in the namespace, used to check references point at the right thing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityRole {
    Terminal,
    Unit,
    Clock,
}

/// Header plus entities of an AC interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioControlBlock {
    /// AC interface header; total_length is recomputed on encode
    pub header: AcHeader,
    /// Entities in wire order
    pub entities: Vec<UacDescriptor>,
}

impl AudioControlBlock {
    /// Empty UAC 2.00 block of `category`
    pub fn new(category: FunctionCategory) -> Self {
        AudioControlBlock {
            header: AcHeader {
                version: Version::UAC2,
                category,
                total_length: 0,
                controls: ControlMap::new(),
            },
            entities: Vec::new(),
        }
    }

    /// Builder form of [`AudioControlBlock::push`]
    pub fn with_entity<D: Into<UacDescriptor>>(mut self, entity: D) -> Self {
        self.push(entity);
        self
    }

    /// Append an entity
    pub fn push<D: Into<UacDescriptor>>(&mut self, entity: D) {
        self.entities.push(entity.into());
    }

    /// Entity addressed by `id`
    pub fn entity(&self, id: u8) -> Option<&UacDescriptor> {
        self.entities.iter().find(|e| entity_id(e) == Some(id))
    }

    fn roles(&self) -> error::Result<HashMap<u8, EntityRole>> {
        let mut roles = HashMap::new();
        for e in &self.entities {
            let role = match e {
                UacDescriptor::InputTerminal(_) | UacDescriptor::OutputTerminal(_) => {
                    EntityRole::Terminal
                }
                UacDescriptor::FeatureUnit(_) | UacDescriptor::Generic(_) => EntityRole::Unit,
                UacDescriptor::ClockSource(_)
                | UacDescriptor::ClockSelector(_)
                | UacDescriptor::ClockMultiplier(_) => EntityRole::Clock,
                d => {
                    return Err(Error::new(
                        ErrorKind::InvalidArg,
                        &format!(
                            "{} is not an Audio Control entity",
                            d.kind().map_or("Unknown", |k| k.name())
                        ),
                    ))
                }
            };
            let Some(id) = entity_id(e) else {
                continue;
            };
            if id == 0 {
                return Err(Error::new(
                    ErrorKind::InvalidReference(0),
                    "Entity id 0 is reserved as undefined",
                ));
            }
            if roles.insert(id, role).is_some() {
                return Err(Error::new(
                    ErrorKind::InvalidReference(id),
                    &format!("Entity id {} used more than once", id),
                ));
            }
        }
        Ok(roles)
    }

    /// Check ids are unique and every reference resolves to an entity of the right role
    pub fn validate(&self) -> error::Result<()> {
        let roles = self.roles()?;
        for e in &self.entities {
            let from = entity_id(e).unwrap_or_default();
            for r in e.references() {
                let (expected, what) = match r {
                    EntityRef::Source(_) => (None, "source"),
                    EntityRef::Clock(_) => (Some(EntityRole::Clock), "clock entity"),
                    EntityRef::Terminal(_) => (Some(EntityRole::Terminal), "terminal"),
                };
                let found = roles.get(&r.id());
                let ok = match (found, expected) {
                    (None, _) => false,
                    // audio sources are terminals or units, never clocks
                    (Some(role), None) => *role != EntityRole::Clock,
                    (Some(role), Some(expected)) => *role == expected,
                };
                if !ok {
                    return Err(Error::new(
                        ErrorKind::InvalidReference(r.id()),
                        &format!(
                            "Entity {} references {} {} which is {}",
                            from,
                            what,
                            r.id(),
                            match found {
                                None => "not defined".to_string(),
                                Some(role) => format!("a {:?}", role).to_lowercase(),
                            }
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// wTotalLength: the encoded header plus every entity
    pub fn total_length(&self) -> error::Result<u16> {
        let mut total = DescriptorKind::Header.layout().fixed_size;
        for e in &self.entities {
            total += codec::encode_descriptor(e)?.len();
        }
        u16::try_from(total).map_err(|_| {
            Error::new(
                ErrorKind::DescriptorTooLong(total),
                &format!("AC block of {} bytes does not fit wTotalLength", total),
            )
        })
    }

    /// Validate then encode header and entities; the header carries the computed total length
    pub fn encode(&self) -> error::Result<Vec<u8>> {
        self.validate()?;
        let mut body = Vec::new();
        for e in &self.entities {
            body.extend(codec::encode_descriptor(e)?);
        }
        let total = DescriptorKind::Header.layout().fixed_size + body.len();
        let total_length = u16::try_from(total).map_err(|_| {
            Error::new(
                ErrorKind::DescriptorTooLong(total),
                &format!("AC block of {} bytes does not fit wTotalLength", total),
            )
        })?;
        if self.header.total_length != 0 && self.header.total_length != total_length {
            log::debug!(
                "Replacing header wTotalLength {} with computed {}",
                self.header.total_length,
                total_length
            );
        }
        let header = AcHeader {
            total_length,
            ..self.header.clone()
        };

        let mut ret = codec::encode(&header)?;
        ret.extend(body);
        Ok(ret)
    }

    /// Decode a block that starts with the AC header; bytes beyond wTotalLength are not read
    pub fn decode(data: &[u8]) -> error::Result<Self> {
        let header: AcHeader = codec::decode_as(data)?;
        let total = header.total_length as usize;
        let header_size = DescriptorKind::Header.layout().fixed_size;
        if total < header_size {
            return Err(Error::new_descriptor_len("AC block wTotalLength", header_size, total));
        }
        if total > data.len() {
            return Err(Error::new_truncated("AC block", total, data.len()));
        }
        if total < data.len() {
            log::debug!(
                "{} bytes after wTotalLength {} not part of the AC block",
                data.len() - total,
                total
            );
        }

        let mut scanner = DescriptorScanner::new(&data[..total], DescriptorContext::AudioControl);
        match scanner.next() {
            Some(Ok(ScannedDescriptor {
                offset: 0,
                descriptor: UacDescriptor::Header(_),
            })) => (),
            Some(Err(e)) => return Err(e),
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidArg,
                    "AC block does not start with the AC header",
                ))
            }
        }
        let entities = scanner
            .map(|r| r.map(|s| s.descriptor))
            .collect::<error::Result<Vec<_>>>()?;

        Ok(AudioControlBlock { header, entities })
    }
}

/// Id of an entity; for pass-through descriptors the first byte after the header, which is bUnitID or bTerminalID for every UAC2 unit and terminal
fn entity_id(d: &UacDescriptor) -> Option<u8> {
    match d {
        UacDescriptor::Generic(gd) if gd.descriptor_type == CS_INTERFACE => {
            gd.data.as_ref().and_then(|data| data.first().copied())
        }
        d => d.entity_id(),
    }
}
