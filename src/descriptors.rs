//! Typed values of the UAC2 class-specific descriptors
//!
//! Each kind of the [`crate::catalog`] has a struct here whose fields follow the UAC2 table for the descriptor, minus the 3 byte header and any count field that can be derived from an owned `Vec`. [`UacDescriptor`] wraps them for code handling a mixed stream.
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

use crate::catalog::{DescriptorKind, HEADER_SIZE};
use crate::error::{self, Error};

pub mod control;
pub mod streaming;
pub mod terminal;

pub use control::*;
pub use streaming::*;
pub use terminal::*;

/// Binary Coded Decimal version as found in bcdADC, for example 0x0200 is 2.00
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version(pub u16);

impl Version {
    /// UAC 2.00
    pub const UAC2: Version = Version(0x0200);

    /// Build from decimal parts; major is two digits, minor and sub one digit each
    pub fn from_parts(major: u8, minor: u8, sub_minor: u8) -> Version {
        let major = major.min(99);
        Version(
            ((major / 10) as u16) << 12
                | ((major % 10) as u16) << 8
                | ((minor.min(9)) as u16) << 4
                | (sub_minor.min(9)) as u16,
        )
    }

    /// Version from raw BCD
    pub fn from_bcd(v: u16) -> Version {
        Version(v)
    }

    /// Raw BCD
    pub fn to_bcd(&self) -> u16 {
        self.0
    }

    #[allow(missing_docs)]
    pub fn major(&self) -> u8 {
        (((self.0 >> 12) & 0xf) * 10 + ((self.0 >> 8) & 0xf)) as u8
    }

    #[allow(missing_docs)]
    pub fn minor(&self) -> u8 {
        ((self.0 >> 4) & 0xf) as u8
    }

    #[allow(missing_docs)]
    pub fn sub_minor(&self) -> u8 {
        (self.0 & 0xf) as u8
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}{}", self.major(), self.minor(), self.sub_minor())
    }
}

/// UAC2 spatial locations of the logical channels in a cluster: bmChannelConfig
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig(pub u32);

impl ChannelConfig {
    /// UAC2: 4.1 Audio Channel Cluster Descriptor; Table 4-1. Bit position names
    pub const UAC2_CHANNEL_NAMES: [&'static str; 27] = [
        "Front Left (FL)",
        "Front Right (FR)",
        "Front Center (FC)",
        "Low Frequency Effects (LFE)",
        "Back Left (BL)",
        "Back Right (BR)",
        "Front Left of Center (FLC)",
        "Front Right of Center (FRC)",
        "Back Center (BC)",
        "Side Left (SL)",
        "Side Right (SR)",
        "Top Center (TC)",
        "Top Front Left (TFL)",
        "Top Front Center (TFC)",
        "Top Front Right (TFR)",
        "Top Back Left (TBL)",
        "Top Back Center (TBC)",
        "Top Back Right (TBR)",
        "Top Front Left of Center (TFLC)",
        "Top Front Right of Center (TFRC)",
        "Left Low Frequency Effects (LLFE)",
        "Right Low Frequency Effects (RLFE)",
        "Top Side Left (TSL)",
        "Top Side Right (TSR)",
        "Bottom Center (BC)",
        "Back Left of Center (BLC)",
        "Back Right of Center (BRC)",
    ];

    /// Bit 31: channels carry raw data without spatial meaning
    pub const RAW_DATA: u32 = 1 << 31;
    /// FL | FR
    pub const STEREO: ChannelConfig = ChannelConfig(0x3);

    /// Names of the set spatial location bits
    pub fn names(&self) -> Vec<&'static str> {
        get_bitmap_names(self.0, &Self::UAC2_CHANNEL_NAMES)
    }

    /// Number of spatial locations set
    pub fn count(&self) -> u32 {
        (self.0 & !Self::RAW_DATA).count_ones()
    }

    /// Raw data bit is set
    pub fn is_raw_data(&self) -> bool {
        self.0 & Self::RAW_DATA != 0
    }
}

/// Names for each set bit of a bitmap; bit n is `names[n]`
pub fn get_bitmap_names(bitmap: u32, names: &[&'static str]) -> Vec<&'static str> {
    names
        .iter()
        .enumerate()
        .filter(|(i, _)| bitmap & (1 << i) != 0)
        .map(|(_, s)| *s)
        .collect()
}

/// UAC2: A.7 Audio Function Category Codes; Table A-7.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum FunctionCategory {
    #[default]
    Undefined,
    DesktopSpeaker,
    HomeTheater,
    Microphone,
    Headset,
    Telephone,
    Converter,
    VoiceSoundRecorder,
    IoBox,
    MusicalInstrument,
    ProAudio,
    AudioVideo,
    ControlPanel,
    Other,
    /// Code not defined by UAC2
    Unknown(u8),
}

impl From<u8> for FunctionCategory {
    fn from(b: u8) -> Self {
        match b {
            0x00 => FunctionCategory::Undefined,
            0x01 => FunctionCategory::DesktopSpeaker,
            0x02 => FunctionCategory::HomeTheater,
            0x03 => FunctionCategory::Microphone,
            0x04 => FunctionCategory::Headset,
            0x05 => FunctionCategory::Telephone,
            0x06 => FunctionCategory::Converter,
            0x07 => FunctionCategory::VoiceSoundRecorder,
            0x08 => FunctionCategory::IoBox,
            0x09 => FunctionCategory::MusicalInstrument,
            0x0a => FunctionCategory::ProAudio,
            0x0b => FunctionCategory::AudioVideo,
            0x0c => FunctionCategory::ControlPanel,
            0xff => FunctionCategory::Other,
            b => FunctionCategory::Unknown(b),
        }
    }
}

impl From<FunctionCategory> for u8 {
    fn from(c: FunctionCategory) -> Self {
        match c {
            FunctionCategory::Undefined => 0x00,
            FunctionCategory::DesktopSpeaker => 0x01,
            FunctionCategory::HomeTheater => 0x02,
            FunctionCategory::Microphone => 0x03,
            FunctionCategory::Headset => 0x04,
            FunctionCategory::Telephone => 0x05,
            FunctionCategory::Converter => 0x06,
            FunctionCategory::VoiceSoundRecorder => 0x07,
            FunctionCategory::IoBox => 0x08,
            FunctionCategory::MusicalInstrument => 0x09,
            FunctionCategory::ProAudio => 0x0a,
            FunctionCategory::AudioVideo => 0x0b,
            FunctionCategory::ControlPanel => 0x0c,
            FunctionCategory::Other => 0xff,
            FunctionCategory::Unknown(b) => b,
        }
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FunctionCategory::Undefined => write!(f, "Undefined"),
            FunctionCategory::DesktopSpeaker => write!(f, "Desktop Speaker"),
            FunctionCategory::HomeTheater => write!(f, "Home Theater"),
            FunctionCategory::Microphone => write!(f, "Microphone"),
            FunctionCategory::Headset => write!(f, "Headset"),
            FunctionCategory::Telephone => write!(f, "Telephone"),
            FunctionCategory::Converter => write!(f, "Converter"),
            FunctionCategory::VoiceSoundRecorder => write!(f, "Voice/Sound Recorder"),
            FunctionCategory::IoBox => write!(f, "I/O Box"),
            FunctionCategory::MusicalInstrument => write!(f, "Musical Instrument"),
            FunctionCategory::ProAudio => write!(f, "Pro-Audio"),
            FunctionCategory::AudioVideo => write!(f, "Audio/Video"),
            FunctionCategory::ControlPanel => write!(f, "Control Panel"),
            FunctionCategory::Other => write!(f, "Other"),
            FunctionCategory::Unknown(_) => write!(f, "Unknown"),
        }
    }
}

/// Class-specific descriptor with no catalog entry; kept as bytes so a scanned buffer can be re-emitted
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericDescriptor {
    /// bLength
    pub length: u8,
    /// bDescriptorType
    pub descriptor_type: u8,
    /// bDescriptorSubtype
    pub descriptor_subtype: u8,
    /// Bytes following the header
    pub data: Option<Vec<u8>>,
}

impl TryFrom<&[u8]> for GenericDescriptor {
    type Error = Error;

    fn try_from(value: &[u8]) -> error::Result<Self> {
        if value.len() < HEADER_SIZE {
            return Err(Error::new_truncated(
                "Generic descriptor",
                HEADER_SIZE,
                value.len(),
            ));
        }

        let length = value[0];
        if (length as usize) < HEADER_SIZE {
            return Err(Error::new_descriptor_len(
                "Generic descriptor",
                HEADER_SIZE,
                length as usize,
            ));
        }
        if length as usize > value.len() {
            return Err(Error::new_truncated(
                "Generic descriptor",
                length as usize,
                value.len(),
            ));
        }

        Ok(GenericDescriptor {
            length,
            descriptor_type: value[1],
            descriptor_subtype: value[2],
            data: if length as usize > HEADER_SIZE {
                Some(value[HEADER_SIZE..length as usize].to_vec())
            } else {
                None
            },
        })
    }
}

impl From<GenericDescriptor> for Vec<u8> {
    fn from(gd: GenericDescriptor) -> Self {
        let mut ret = Vec::with_capacity(gd.length as usize);
        ret.push(gd.length);
        ret.push(gd.descriptor_type);
        ret.push(gd.descriptor_subtype);
        if let Some(data) = gd.data {
            ret.extend(data);
        }

        ret
    }
}

impl GenericDescriptor {
    /// Expected length of the data following the header
    pub fn expected_data_length(&self) -> usize {
        (self.length as usize).saturating_sub(HEADER_SIZE)
    }
}

/// Any class-specific descriptor of an audio function
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum UacDescriptor {
    Header(AcHeader),
    InputTerminal(InputTerminal),
    OutputTerminal(OutputTerminal),
    FeatureUnit(FeatureUnit),
    ClockSource(ClockSource),
    ClockSelector(ClockSelector),
    ClockMultiplier(ClockMultiplier),
    AsGeneral(AsGeneral),
    FormatTypeI(FormatTypeI),
    IsoEndpoint(IsoEndpoint),
    /// Not in the catalog
    Generic(GenericDescriptor),
}

impl UacDescriptor {
    /// Catalog kind, `None` for [`UacDescriptor::Generic`]
    pub fn kind(&self) -> Option<DescriptorKind> {
        match self {
            UacDescriptor::Header(_) => Some(DescriptorKind::Header),
            UacDescriptor::InputTerminal(_) => Some(DescriptorKind::InputTerminal),
            UacDescriptor::OutputTerminal(_) => Some(DescriptorKind::OutputTerminal),
            UacDescriptor::FeatureUnit(_) => Some(DescriptorKind::FeatureUnit),
            UacDescriptor::ClockSource(_) => Some(DescriptorKind::ClockSource),
            UacDescriptor::ClockSelector(_) => Some(DescriptorKind::ClockSelector),
            UacDescriptor::ClockMultiplier(_) => Some(DescriptorKind::ClockMultiplier),
            UacDescriptor::AsGeneral(_) => Some(DescriptorKind::AsGeneral),
            UacDescriptor::FormatTypeI(_) => Some(DescriptorKind::FormatTypeI),
            UacDescriptor::IsoEndpoint(_) => Some(DescriptorKind::IsoEndpoint),
            UacDescriptor::Generic(_) => None,
        }
    }

    /// Id the entity is addressed by within the audio function; terminals, units and clock entities only
    pub fn entity_id(&self) -> Option<u8> {
        match self {
            UacDescriptor::InputTerminal(d) => Some(d.terminal_id),
            UacDescriptor::OutputTerminal(d) => Some(d.terminal_id),
            UacDescriptor::FeatureUnit(d) => Some(d.unit_id),
            UacDescriptor::ClockSource(d) => Some(d.clock_id),
            UacDescriptor::ClockSelector(d) => Some(d.clock_id),
            UacDescriptor::ClockMultiplier(d) => Some(d.clock_id),
            _ => None,
        }
    }

    /// True for clock source, selector and multiplier
    pub fn is_clock_entity(&self) -> bool {
        matches!(
            self,
            UacDescriptor::ClockSource(_)
                | UacDescriptor::ClockSelector(_)
                | UacDescriptor::ClockMultiplier(_)
        )
    }

    /// Ids of the entities this descriptor connects to
    pub fn references(&self) -> Vec<EntityRef> {
        match self {
            UacDescriptor::InputTerminal(d) => vec![EntityRef::Clock(d.clock_source_id)]
                .into_iter()
                .chain((d.assoc_terminal != 0).then_some(EntityRef::Terminal(d.assoc_terminal)))
                .collect(),
            UacDescriptor::OutputTerminal(d) => vec![
                EntityRef::Source(d.source_id),
                EntityRef::Clock(d.clock_source_id),
            ]
            .into_iter()
            .chain((d.assoc_terminal != 0).then_some(EntityRef::Terminal(d.assoc_terminal)))
            .collect(),
            UacDescriptor::FeatureUnit(d) => vec![EntityRef::Source(d.source_id)],
            UacDescriptor::ClockSource(d) => (d.assoc_terminal != 0)
                .then_some(EntityRef::Terminal(d.assoc_terminal))
                .into_iter()
                .collect(),
            UacDescriptor::ClockSelector(d) => {
                d.source_ids.iter().map(|id| EntityRef::Clock(*id)).collect()
            }
            UacDescriptor::ClockMultiplier(d) => vec![EntityRef::Clock(d.source_id)],
            UacDescriptor::AsGeneral(d) => vec![EntityRef::Terminal(d.terminal_link)],
            _ => Vec::new(),
        }
    }
}

/// A reference from one entity to another by id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRef {
    /// Audio data source: terminal or unit
    Source(u8),
    /// Clock entity providing the sampling clock
    Clock(u8),
    /// Associated or linked terminal
    Terminal(u8),
}

impl EntityRef {
    /// The referenced id
    pub fn id(&self) -> u8 {
        match self {
            EntityRef::Source(id) | EntityRef::Clock(id) | EntityRef::Terminal(id) => *id,
        }
    }
}

macro_rules! impl_from_descriptor {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for UacDescriptor {
                fn from(d: $ty) -> Self {
                    UacDescriptor::$variant(d)
                }
            }
        )*
    };
}

impl_from_descriptor!(
    Header(AcHeader),
    InputTerminal(InputTerminal),
    OutputTerminal(OutputTerminal),
    FeatureUnit(FeatureUnit),
    ClockSource(ClockSource),
    ClockSelector(ClockSelector),
    ClockMultiplier(ClockMultiplier),
    AsGeneral(AsGeneral),
    FormatTypeI(FormatTypeI),
    IsoEndpoint(IsoEndpoint),
    Generic(GenericDescriptor),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_bcd() {
        assert_eq!(Version::UAC2.to_string(), "2.00");
        assert_eq!(Version::from_parts(2, 0, 0), Version::UAC2);
        let v = Version::from_bcd(0x1234);
        assert_eq!((v.major(), v.minor(), v.sub_minor()), (12, 3, 4));
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(
            ChannelConfig::STEREO.names(),
            vec!["Front Left (FL)", "Front Right (FR)"]
        );
        let c = ChannelConfig(ChannelConfig::RAW_DATA | 0b1000);
        assert_eq!(c.names(), vec!["Low Frequency Effects (LFE)"]);
        assert_eq!(c.count(), 1);
        assert!(c.is_raw_data());
    }

    #[test]
    fn test_function_category_codes() {
        assert_eq!(FunctionCategory::from(0x08), FunctionCategory::IoBox);
        assert_eq!(u8::from(FunctionCategory::ControlPanel), 0x0c);
        assert_eq!(FunctionCategory::from(0x42), FunctionCategory::Unknown(0x42));
        assert_eq!(u8::from(FunctionCategory::from(0x42)), 0x42);
    }

    #[test]
    fn test_generic_descriptor() {
        let bytes = [0x05, 0x24, 0x0f, 0xaa, 0xbb, 0xff];
        let gd = GenericDescriptor::try_from(&bytes[..]).unwrap();
        assert_eq!(gd.expected_data_length(), 2);
        assert_eq!(gd.data, Some(vec![0xaa, 0xbb]));
        assert_eq!(Vec::<u8>::from(gd), bytes[..5].to_vec());
        assert!(GenericDescriptor::try_from(&bytes[..4]).is_err());
    }

    #[test]
    fn test_references() {
        let sel = UacDescriptor::from(ClockSelector {
            clock_id: 0x28,
            source_ids: vec![0x29, 0x2a],
            ..Default::default()
        });
        assert_eq!(sel.entity_id(), Some(0x28));
        assert!(sel.is_clock_entity());
        assert_eq!(
            sel.references(),
            vec![EntityRef::Clock(0x29), EntityRef::Clock(0x2a)]
        );
    }
}
