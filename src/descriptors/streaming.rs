//! Audio Streaming interface and isochronous data endpoint descriptors
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{get_bitmap_names, ChannelConfig};
use crate::catalog::DescriptorKind;
use crate::codec::{check_code, read_controls, write_controls, ClassSpecificDescriptor};
use crate::controls::*;
use crate::error::{self, Error, ErrorKind};

/// Frmts20: A.1 Format Type Codes; Table A-1.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum FormatType {
    Undefined,
    #[default]
    TypeI,
    TypeII,
    TypeIII,
    TypeIV,
    ExtendedTypeI,
    ExtendedTypeII,
    ExtendedTypeIII,
    /// Code not defined by UAC2
    Unknown(u8),
}

impl From<u8> for FormatType {
    fn from(b: u8) -> Self {
        match b {
            0x00 => FormatType::Undefined,
            0x01 => FormatType::TypeI,
            0x02 => FormatType::TypeII,
            0x03 => FormatType::TypeIII,
            0x04 => FormatType::TypeIV,
            0x81 => FormatType::ExtendedTypeI,
            0x82 => FormatType::ExtendedTypeII,
            0x83 => FormatType::ExtendedTypeIII,
            b => FormatType::Unknown(b),
        }
    }
}

impl From<FormatType> for u8 {
    fn from(f: FormatType) -> Self {
        match f {
            FormatType::Undefined => 0x00,
            FormatType::TypeI => 0x01,
            FormatType::TypeII => 0x02,
            FormatType::TypeIII => 0x03,
            FormatType::TypeIV => 0x04,
            FormatType::ExtendedTypeI => 0x81,
            FormatType::ExtendedTypeII => 0x82,
            FormatType::ExtendedTypeIII => 0x83,
            FormatType::Unknown(b) => b,
        }
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatType::Undefined => write!(f, "FORMAT_TYPE_UNDEFINED"),
            FormatType::TypeI => write!(f, "FORMAT_TYPE_I"),
            FormatType::TypeII => write!(f, "FORMAT_TYPE_II"),
            FormatType::TypeIII => write!(f, "FORMAT_TYPE_III"),
            FormatType::TypeIV => write!(f, "FORMAT_TYPE_IV"),
            FormatType::ExtendedTypeI => write!(f, "EXT_FORMAT_TYPE_I"),
            FormatType::ExtendedTypeII => write!(f, "EXT_FORMAT_TYPE_II"),
            FormatType::ExtendedTypeIII => write!(f, "EXT_FORMAT_TYPE_III"),
            FormatType::Unknown(_) => write!(f, "Unknown"),
        }
    }
}

/// bmFormats of an AS interface
///
/// Bit meaning depends on bFormatType; only the Type I names are known here.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDataFormats(pub u32);

impl AudioDataFormats {
    /// Frmts20: A.2.1 Audio Data Format Type I Bit Allocations; Table A-2.
    pub const TYPE_I_NAMES: [&'static str; 5] = ["PCM", "PCM8", "IEEE_FLOAT", "ALAW", "MULAW"];

    #[allow(missing_docs)]
    pub const PCM: u32 = 1 << 0;
    #[allow(missing_docs)]
    pub const PCM8: u32 = 1 << 1;
    #[allow(missing_docs)]
    pub const IEEE_FLOAT: u32 = 1 << 2;
    #[allow(missing_docs)]
    pub const ALAW: u32 = 1 << 3;
    #[allow(missing_docs)]
    pub const MULAW: u32 = 1 << 4;
    /// D31 TYPE_I_RAW_DATA
    pub const RAW_DATA: u32 = 1 << 31;

    /// Names of the set format bits for a format type
    pub fn names(&self, format_type: FormatType) -> Vec<&'static str> {
        match format_type {
            FormatType::TypeI => {
                let mut names = get_bitmap_names(self.0, &Self::TYPE_I_NAMES);
                if self.0 & Self::RAW_DATA != 0 {
                    names.push("TYPE_I_RAW_DATA");
                }
                names
            }
            _ => Vec::new(),
        }
    }
}

/// UAC2: 4.9.2 Class-Specific AS Interface Descriptor; Table 4-27.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct AsGeneral {
    pub terminal_link: u8,
    pub controls: ControlMap<AsInterfaceControl>,
    pub format_type: FormatType,
    pub formats: AudioDataFormats,
    pub nr_channels: u8,
    pub channel_config: ChannelConfig,
    pub channel_names_index: u8,
}

impl ClassSpecificDescriptor for AsGeneral {
    const KIND: DescriptorKind = DescriptorKind::AsGeneral;

    fn validate(&self) -> error::Result<()> {
        check_code::<_, u8>(self.format_type, "bFormatType")
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.push(self.terminal_link);
        write_controls(buf, &self.controls)?;
        buf.push(self.format_type.into());
        buf.extend(self.formats.0.to_le_bytes());
        buf.push(self.nr_channels);
        buf.extend(self.channel_config.0.to_le_bytes());
        buf.push(self.channel_names_index);
        Ok(())
    }

    fn decode_body(value: &[u8], _count: usize) -> error::Result<Self> {
        Ok(AsGeneral {
            terminal_link: value[0],
            controls: read_controls(value, 1),
            format_type: FormatType::from(value[2]),
            formats: AudioDataFormats(u32::from_le_bytes([
                value[3], value[4], value[5], value[6],
            ])),
            nr_channels: value[7],
            channel_config: ChannelConfig(u32::from_le_bytes([
                value[8], value[9], value[10], value[11],
            ])),
            channel_names_index: value[12],
        })
    }
}

/// Frmts20: 2.3.1.6 Type I Format Type Descriptor; Table 2-2.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct FormatTypeI {
    pub format_type: FormatType,
    /// Bytes occupied by one audio subslot: 1, 2, 3 or 4
    pub subslot_size: u8,
    /// Bits of the subslot used by the sample
    pub bit_resolution: u8,
}

impl Default for FormatTypeI {
    fn default() -> Self {
        FormatTypeI {
            format_type: FormatType::TypeI,
            subslot_size: 2,
            bit_resolution: 16,
        }
    }
}

impl FormatTypeI {
    /// Check subslot size and bit resolution against each other
    pub fn check(&self) -> error::Result<()> {
        check_code::<_, u8>(self.format_type, "bFormatType")?;
        if self.format_type != FormatType::TypeI {
            return Err(Error::new(
                ErrorKind::InvalidField("bFormatType"),
                &format!("Format Type I descriptor with bFormatType {}", self.format_type),
            ));
        }
        if !(1..=4).contains(&self.subslot_size) {
            return Err(Error::new(
                ErrorKind::InvalidField("bSubslotSize"),
                &format!("bSubslotSize {} is not 1-4", self.subslot_size),
            ));
        }
        if self.bit_resolution as usize > self.subslot_size as usize * 8 {
            return Err(Error::new(
                ErrorKind::InvalidField("bBitResolution"),
                &format!(
                    "bBitResolution {} exceeds {} byte subslot",
                    self.bit_resolution, self.subslot_size
                ),
            ));
        }
        Ok(())
    }
}

impl ClassSpecificDescriptor for FormatTypeI {
    const KIND: DescriptorKind = DescriptorKind::FormatTypeI;

    fn validate(&self) -> error::Result<()> {
        self.check()
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.push(self.format_type.into());
        buf.push(self.subslot_size);
        buf.push(self.bit_resolution);
        Ok(())
    }

    fn decode_body(value: &[u8], _count: usize) -> error::Result<Self> {
        let ret = FormatTypeI {
            format_type: FormatType::from(value[0]),
            subslot_size: value[1],
            bit_resolution: value[2],
        };
        if let Err(e) = ret.check() {
            log::warn!("{:#}", e);
        }
        Ok(ret)
    }
}

/// wLockDelay units of an isochronous data endpoint
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum LockDelayUnits {
    #[default]
    Undefined,
    Milliseconds,
    DecodedPcmSamples,
    Reserved(u8),
}

impl From<u8> for LockDelayUnits {
    fn from(b: u8) -> Self {
        match b {
            0 => LockDelayUnits::Undefined,
            1 => LockDelayUnits::Milliseconds,
            2 => LockDelayUnits::DecodedPcmSamples,
            b => LockDelayUnits::Reserved(b),
        }
    }
}

impl From<LockDelayUnits> for u8 {
    fn from(u: LockDelayUnits) -> Self {
        match u {
            LockDelayUnits::Undefined => 0,
            LockDelayUnits::Milliseconds => 1,
            LockDelayUnits::DecodedPcmSamples => 2,
            LockDelayUnits::Reserved(b) => b,
        }
    }
}

impl fmt::Display for LockDelayUnits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockDelayUnits::Undefined => write!(f, "Undefined"),
            LockDelayUnits::Milliseconds => write!(f, "Milliseconds"),
            LockDelayUnits::DecodedPcmSamples => write!(f, "Decoded PCM samples"),
            LockDelayUnits::Reserved(_) => write!(f, "Reserved"),
        }
    }
}

/// UAC2: 4.10.1.2 Class-Specific AS Isochronous Audio Data Endpoint Descriptor; Table 4-34.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct IsoEndpoint {
    /// bmAttributes D7: only packets of wMaxPacketSize are sent
    pub max_packets_only: bool,
    pub controls: ControlMap<IsoEndpointControl>,
    pub lock_delay_units: LockDelayUnits,
    pub lock_delay: u16,
}

impl IsoEndpoint {
    /// bmAttributes D7
    pub const MAX_PACKETS_ONLY: u8 = 0x80;
}

impl ClassSpecificDescriptor for IsoEndpoint {
    const KIND: DescriptorKind = DescriptorKind::IsoEndpoint;

    fn validate(&self) -> error::Result<()> {
        check_code::<_, u8>(self.lock_delay_units, "bLockDelayUnits")
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.push(if self.max_packets_only {
            Self::MAX_PACKETS_ONLY
        } else {
            0
        });
        write_controls(buf, &self.controls)?;
        buf.push(self.lock_delay_units.into());
        buf.extend(self.lock_delay.to_le_bytes());
        Ok(())
    }

    fn decode_body(value: &[u8], _count: usize) -> error::Result<Self> {
        if value[0] & !Self::MAX_PACKETS_ONLY != 0 {
            log::debug!("EP General bmAttributes {:#04x} has reserved bits set", value[0]);
        }
        Ok(IsoEndpoint {
            max_packets_only: value[0] & Self::MAX_PACKETS_ONLY != 0,
            controls: read_controls(value, 1),
            lock_delay_units: LockDelayUnits::from(value[2]),
            lock_delay: u16::from_le_bytes([value[3], value[4]]),
        })
    }
}
