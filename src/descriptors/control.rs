//! Audio Control interface header, clock entities and feature unit
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{FunctionCategory, Version};
use crate::catalog::DescriptorKind;
use crate::codec::{check_code, read_controls, write_controls, ClassSpecificDescriptor};
use crate::controls::*;
use crate::error;

/// UAC2: 4.7.2 Class-Specific AC Interface Descriptor; Table 4-5.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct AcHeader {
    pub version: Version,
    pub category: FunctionCategory,
    /// Bytes of the whole class-specific AC block including this header
    pub total_length: u16,
    pub controls: ControlMap<HeaderControl>,
}

impl ClassSpecificDescriptor for AcHeader {
    const KIND: DescriptorKind = DescriptorKind::Header;

    fn validate(&self) -> error::Result<()> {
        check_code::<_, u8>(self.category, "bCategory")
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.extend(self.version.to_bcd().to_le_bytes());
        buf.push(self.category.into());
        buf.extend(self.total_length.to_le_bytes());
        write_controls(buf, &self.controls)
    }

    fn decode_body(value: &[u8], _count: usize) -> error::Result<Self> {
        Ok(AcHeader {
            version: Version::from_bcd(u16::from_le_bytes([value[0], value[1]])),
            category: FunctionCategory::from(value[2]),
            total_length: u16::from_le_bytes([value[3], value[4]]),
            controls: read_controls(value, 5),
        })
    }
}

/// Clock Source bmAttributes D1..0
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ClockType {
    #[default]
    External = 0b00,
    InternalFixed = 0b01,
    InternalVariable = 0b10,
    InternalProgrammable = 0b11,
}

impl From<u8> for ClockType {
    fn from(b: u8) -> Self {
        match b & 0b11 {
            0b00 => ClockType::External,
            0b01 => ClockType::InternalFixed,
            0b10 => ClockType::InternalVariable,
            _ => ClockType::InternalProgrammable,
        }
    }
}

impl fmt::Display for ClockType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClockType::External => write!(f, "External clock"),
            ClockType::InternalFixed => write!(f, "Internal fixed clock"),
            ClockType::InternalVariable => write!(f, "Internal variable clock"),
            ClockType::InternalProgrammable => write!(f, "Internal programmable clock"),
        }
    }
}

/// Clock Source bmAttributes
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSourceAttributes {
    /// D1..0
    pub clock_type: ClockType,
    /// D2: clock is synchronized to the Start of Frame
    pub sof_synced: bool,
}

impl ClockSourceAttributes {
    /// D2
    pub const SOF_SYNC: u8 = 0x04;
}

impl From<u8> for ClockSourceAttributes {
    fn from(b: u8) -> Self {
        if b & !0x07 != 0 {
            log::debug!("Clock Source bmAttributes {:#04x} has reserved bits set", b);
        }
        ClockSourceAttributes {
            clock_type: ClockType::from(b),
            sof_synced: b & Self::SOF_SYNC != 0,
        }
    }
}

impl From<ClockSourceAttributes> for u8 {
    fn from(a: ClockSourceAttributes) -> Self {
        a.clock_type as u8 | if a.sof_synced { ClockSourceAttributes::SOF_SYNC } else { 0 }
    }
}

/// UAC2: 4.7.2.1 Clock Source Descriptor; Table 4-6.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ClockSource {
    pub clock_id: u8,
    pub attributes: ClockSourceAttributes,
    pub controls: ControlMap<ClockSourceControl>,
    pub assoc_terminal: u8,
    pub clock_source_index: u8,
}

impl ClassSpecificDescriptor for ClockSource {
    const KIND: DescriptorKind = DescriptorKind::ClockSource;

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.push(self.clock_id);
        buf.push(self.attributes.into());
        write_controls(buf, &self.controls)?;
        buf.push(self.assoc_terminal);
        buf.push(self.clock_source_index);
        Ok(())
    }

    fn decode_body(value: &[u8], _count: usize) -> error::Result<Self> {
        Ok(ClockSource {
            clock_id: value[0],
            attributes: ClockSourceAttributes::from(value[1]),
            controls: read_controls(value, 2),
            assoc_terminal: value[3],
            clock_source_index: value[4],
        })
    }
}

/// UAC2: 4.7.2.2 Clock Selector Descriptor; Table 4-7.
///
/// bNrInPins is not stored, it is always the length of `source_ids`.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ClockSelector {
    pub clock_id: u8,
    /// baCSourceID(1..N) in pin order
    pub source_ids: Vec<u8>,
    pub controls: ControlMap<ClockSelectorControl>,
    pub clock_selector_index: u8,
}

impl ClockSelector {
    /// bNrInPins
    pub fn nr_in_pins(&self) -> usize {
        self.source_ids.len()
    }
}

impl ClassSpecificDescriptor for ClockSelector {
    const KIND: DescriptorKind = DescriptorKind::ClockSelector;

    fn element_count(&self) -> usize {
        self.source_ids.len()
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.push(self.clock_id);
        buf.push(self.source_ids.len() as u8);
        buf.extend(&self.source_ids);
        write_controls(buf, &self.controls)?;
        buf.push(self.clock_selector_index);
        Ok(())
    }

    fn decode_body(value: &[u8], nr_in_pins: usize) -> error::Result<Self> {
        Ok(ClockSelector {
            clock_id: value[0],
            source_ids: value[2..2 + nr_in_pins].to_vec(),
            controls: read_controls(value, 2 + nr_in_pins),
            clock_selector_index: value[3 + nr_in_pins],
        })
    }
}

/// UAC2: 4.7.2.3 Clock Multiplier Descriptor; Table 4-8.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ClockMultiplier {
    pub clock_id: u8,
    pub source_id: u8,
    pub controls: ControlMap<ClockMultiplierControl>,
    pub clock_multiplier_index: u8,
}

impl ClassSpecificDescriptor for ClockMultiplier {
    const KIND: DescriptorKind = DescriptorKind::ClockMultiplier;

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.push(self.clock_id);
        buf.push(self.source_id);
        write_controls(buf, &self.controls)?;
        buf.push(self.clock_multiplier_index);
        Ok(())
    }

    fn decode_body(value: &[u8], _count: usize) -> error::Result<Self> {
        Ok(ClockMultiplier {
            clock_id: value[0],
            source_id: value[1],
            controls: read_controls(value, 2),
            clock_multiplier_index: value[3],
        })
    }
}

/// UAC2: 4.7.2.8 Feature Unit Descriptor; Table 4-13.
///
/// `controls[0]` is the master channel, `controls[n]` logical channel n. The number of logical channels is not stored on the wire; it is derived from bLength.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct FeatureUnit {
    pub unit_id: u8,
    pub source_id: u8,
    pub controls: Vec<ControlMap<FeatureUnitControl>>,
    pub feature_index: u8,
}

impl Default for FeatureUnit {
    fn default() -> Self {
        FeatureUnit::new(0, 0, 0)
    }
}

impl FeatureUnit {
    /// Feature unit with `channels` logical channels and no controls
    pub fn new(unit_id: u8, source_id: u8, channels: usize) -> Self {
        FeatureUnit {
            unit_id,
            source_id,
            controls: vec![ControlMap::new(); channels + 1],
            feature_index: 0,
        }
    }
}

impl ClassSpecificDescriptor for FeatureUnit {
    const KIND: DescriptorKind = DescriptorKind::FeatureUnit;

    fn element_count(&self) -> usize {
        self.controls.len()
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.push(self.unit_id);
        buf.push(self.source_id);
        for c in &self.controls {
            write_controls(buf, c)?;
        }
        buf.push(self.feature_index);
        Ok(())
    }

    fn decode_body(value: &[u8], count: usize) -> error::Result<Self> {
        Ok(FeatureUnit {
            unit_id: value[0],
            source_id: value[1],
            controls: (0..count).map(|i| read_controls(value, 2 + i * 4)).collect(),
            feature_index: value[2 + count * 4],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_as, encode};

    #[test]
    fn test_clock_source_attributes() {
        let a = ClockSourceAttributes::from(0x07);
        assert_eq!(a.clock_type, ClockType::InternalProgrammable);
        assert!(a.sof_synced);
        assert_eq!(u8::from(a), 0x07);
        assert_eq!(ClockType::from(0x01).to_string(), "Internal fixed clock");
    }

    #[test]
    fn test_clock_source_bytes() {
        let cs = ClockSource {
            clock_id: 0x29,
            attributes: ClockSourceAttributes {
                clock_type: ClockType::InternalFixed,
                sof_synced: false,
            },
            controls: ControlMap::new()
                .with(ClockSourceControl::Frequency, ControlSetting::ReadOnly)
                .with(ClockSourceControl::Validity, ControlSetting::ReadOnly),
            assoc_terminal: 0,
            clock_source_index: 0,
        };
        let bytes = encode(&cs).unwrap();
        assert_eq!(bytes, vec![0x08, 0x24, 0x0a, 0x29, 0x01, 0x05, 0x00, 0x00]);
        assert_eq!(decode_as::<ClockSource>(&bytes).unwrap(), cs);
    }

    #[test]
    fn test_clock_selector_three_pins() {
        let sel = ClockSelector {
            clock_id: 0x28,
            source_ids: vec![0x29, 0x2a, 0x2b],
            controls: ControlMap::new().with(ClockSelectorControl::Selector, ControlSetting::ReadWrite),
            clock_selector_index: 4,
        };
        let bytes = encode(&sel).unwrap();
        assert_eq!(bytes.len(), 10);
        assert_eq!(bytes[0], 10);
        assert_eq!(&bytes[4..8], &[3, 0x29, 0x2a, 0x2b]);
        let decoded = decode_as::<ClockSelector>(&bytes).unwrap();
        assert_eq!(decoded.source_ids, vec![0x29, 0x2a, 0x2b]);
        assert_eq!(decoded, sel);
    }

    #[test]
    fn test_feature_unit_two_channels() {
        let mut fu = FeatureUnit::new(0x0a, 0x02, 2);
        fu.controls[0] = ControlMap::new()
            .with(FeatureUnitControl::Mute, ControlSetting::ReadWrite)
            .with(FeatureUnitControl::Volume, ControlSetting::ReadOnly);
        fu.controls[2].set(FeatureUnitControl::Volume, ControlSetting::ReadWrite);
        let bytes = encode(&fu).unwrap();
        assert_eq!(bytes.len(), 18);
        assert_eq!(&bytes[5..9], &[0x07, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[13..17], &[0x0c, 0x00, 0x00, 0x00]);

        let decoded = decode_as::<FeatureUnit>(&bytes).unwrap();
        assert_eq!(decoded.controls.len(), 3);
        assert_eq!(
            decoded.controls[0].get(FeatureUnitControl::Mute),
            ControlSetting::ReadWrite
        );
        assert_eq!(decoded, fu);
    }

    #[test]
    fn test_header_bytes() {
        let header = AcHeader {
            version: Version::UAC2,
            category: FunctionCategory::IoBox,
            total_length: 0x0040,
            controls: ControlMap::new(),
        };
        assert_eq!(
            encode(&header).unwrap(),
            vec![0x09, 0x24, 0x01, 0x00, 0x02, 0x08, 0x40, 0x00, 0x00]
        );
    }
}
