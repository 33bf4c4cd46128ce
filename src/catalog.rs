//! Catalog of the UAC2 class-specific descriptor kinds: wire layout, subtype code and control tables
//!
//! Pure metadata consulted by [`crate::codec`]. Lookup is by `(context, bDescriptorSubtype)` since subtype codes are only unique within a context: AC header and AS general share 0x01 for example.
use clap::ValueEnum;
use heck::ToShoutySnakeCase;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::controls::ControlTable;

/// bDescriptorType of class-specific interface descriptors
pub const CS_INTERFACE: u8 = 0x24;
/// bDescriptorType of class-specific endpoint descriptors
pub const CS_ENDPOINT: u8 = 0x25;
/// bLength, bDescriptorType, bDescriptorSubtype
pub const HEADER_SIZE: usize = 3;

/// Where a class-specific descriptor was found; decides the descriptor type and the subtype namespace
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum, EnumIter)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptorContext {
    /// Audio Control interface (bInterfaceSubClass 0x01)
    #[serde(alias = "ac")]
    #[value(alias = "ac")]
    AudioControl,
    /// Audio Streaming interface (bInterfaceSubClass 0x02)
    #[serde(alias = "as")]
    #[value(alias = "as")]
    AudioStreaming,
    /// Isochronous data endpoint of an Audio Streaming interface
    #[serde(alias = "endpoint", alias = "ep")]
    #[value(aliases = ["endpoint", "ep"])]
    StreamingEndpoint,
}

impl DescriptorContext {
    /// The class-specific bDescriptorType used within the context
    pub fn descriptor_type(&self) -> u8 {
        match self {
            DescriptorContext::StreamingEndpoint => CS_ENDPOINT,
            _ => CS_INTERFACE,
        }
    }

    /// Kinds that can be found in the context
    pub fn kinds(&self) -> impl Iterator<Item = DescriptorKind> + '_ {
        DescriptorKind::iter().filter(move |k| k.context() == *self)
    }
}

impl fmt::Display for DescriptorContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            match self {
                DescriptorContext::AudioControl => write!(f, "ac"),
                DescriptorContext::AudioStreaming => write!(f, "as"),
                DescriptorContext::StreamingEndpoint => write!(f, "endpoint"),
            }
        } else {
            match self {
                DescriptorContext::AudioControl => write!(f, "AudioControl Interface"),
                DescriptorContext::AudioStreaming => write!(f, "AudioStreaming Interface"),
                DescriptorContext::StreamingEndpoint => write!(f, "AudioStreaming Endpoint"),
            }
        }
    }
}

/// How the element count of a trailing array is known
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountRule {
    /// Count is stored in the byte at this offset from the start of the descriptor
    Field(usize),
    /// Count is `(bLength - fixed_size) / element_size`
    Implied,
}

/// Variable length part of a descriptor
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingArray {
    /// Offset of the first element from the start of the descriptor
    pub offset: usize,
    /// Bytes per element
    pub element_size: usize,
    /// How the element count is derived
    pub count: CountRule,
    /// Least number of elements a valid descriptor carries
    pub min_count: usize,
}

/// Byte layout of a descriptor kind
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Size including the header with an empty trailing array
    pub fixed_size: usize,
    /// Trailing array if the kind is variable length
    pub trailing: Option<TrailingArray>,
}

impl Layout {
    const fn fixed(fixed_size: usize) -> Layout {
        Layout {
            fixed_size,
            trailing: None,
        }
    }

    /// Serialized size with `count` trailing elements
    pub fn length_for(&self, count: usize) -> usize {
        self.fixed_size + self.trailing.map_or(0, |t| t.element_size * count)
    }

    /// True for kinds with a trailing array
    pub fn is_variable(&self) -> bool {
        self.trailing.is_some()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.trailing {
            None => write!(f, "{}", self.fixed_size),
            Some(t) => {
                let n = match t.count {
                    CountRule::Field(_) => "N",
                    CountRule::Implied => "n",
                };
                if t.element_size == 1 {
                    write!(f, "{} + {}", self.fixed_size, n)
                } else {
                    write!(f, "{} + {}*{}", self.fixed_size, t.element_size, n)
                }
            }
        }
    }
}

/// Every UAC2 class-specific descriptor kind understood by the codec
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[allow(missing_docs)]
pub enum DescriptorKind {
    Header,
    InputTerminal,
    OutputTerminal,
    FeatureUnit,
    ClockSource,
    ClockSelector,
    ClockMultiplier,
    AsGeneral,
    FormatTypeI,
    IsoEndpoint,
}

impl DescriptorKind {
    /// Context the kind is found in
    pub fn context(&self) -> DescriptorContext {
        match self {
            DescriptorKind::AsGeneral | DescriptorKind::FormatTypeI => {
                DescriptorContext::AudioStreaming
            }
            DescriptorKind::IsoEndpoint => DescriptorContext::StreamingEndpoint,
            _ => DescriptorContext::AudioControl,
        }
    }

    /// bDescriptorSubtype
    pub fn subtype(&self) -> u8 {
        match self {
            DescriptorKind::Header => 0x01,
            DescriptorKind::InputTerminal => 0x02,
            DescriptorKind::OutputTerminal => 0x03,
            DescriptorKind::FeatureUnit => 0x06,
            DescriptorKind::ClockSource => 0x0a,
            DescriptorKind::ClockSelector => 0x0b,
            DescriptorKind::ClockMultiplier => 0x0c,
            DescriptorKind::AsGeneral => 0x01,
            DescriptorKind::FormatTypeI => 0x02,
            DescriptorKind::IsoEndpoint => 0x01,
        }
    }

    /// bDescriptorType the kind is encoded with
    pub fn descriptor_type(&self) -> u8 {
        self.context().descriptor_type()
    }

    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            DescriptorKind::Header => "Header",
            DescriptorKind::InputTerminal => "Input Terminal",
            DescriptorKind::OutputTerminal => "Output Terminal",
            DescriptorKind::FeatureUnit => "Feature Unit",
            DescriptorKind::ClockSource => "Clock Source",
            DescriptorKind::ClockSelector => "Clock Selector",
            DescriptorKind::ClockMultiplier => "Clock Multiplier",
            DescriptorKind::AsGeneral => "AS General",
            DescriptorKind::FormatTypeI => "Format Type I",
            DescriptorKind::IsoEndpoint => "EP General",
        }
    }

    /// Wire layout
    pub fn layout(&self) -> Layout {
        match self {
            DescriptorKind::Header => Layout::fixed(9),
            DescriptorKind::InputTerminal => Layout::fixed(17),
            DescriptorKind::OutputTerminal => Layout::fixed(12),
            // bmaControls(0) master is mandatory, one further bitmap per logical channel
            DescriptorKind::FeatureUnit => Layout {
                fixed_size: 6,
                trailing: Some(TrailingArray {
                    offset: 5,
                    element_size: 4,
                    count: CountRule::Implied,
                    min_count: 1,
                }),
            },
            DescriptorKind::ClockSource => Layout::fixed(8),
            DescriptorKind::ClockSelector => Layout {
                fixed_size: 7,
                trailing: Some(TrailingArray {
                    offset: 5,
                    element_size: 1,
                    count: CountRule::Field(4),
                    min_count: 0,
                }),
            },
            DescriptorKind::ClockMultiplier => Layout::fixed(7),
            DescriptorKind::AsGeneral => Layout::fixed(16),
            DescriptorKind::FormatTypeI => Layout::fixed(6),
            DescriptorKind::IsoEndpoint => Layout::fixed(8),
        }
    }

    /// Control bitmap table if the kind has bmControls
    pub fn control_table(&self) -> Option<ControlTable> {
        match self {
            DescriptorKind::Header => Some(ControlTable::Header),
            DescriptorKind::InputTerminal => Some(ControlTable::InputTerminal),
            DescriptorKind::OutputTerminal => Some(ControlTable::OutputTerminal),
            DescriptorKind::FeatureUnit => Some(ControlTable::FeatureUnit),
            DescriptorKind::ClockSource => Some(ControlTable::ClockSource),
            DescriptorKind::ClockSelector => Some(ControlTable::ClockSelector),
            DescriptorKind::ClockMultiplier => Some(ControlTable::ClockMultiplier),
            DescriptorKind::AsGeneral => Some(ControlTable::AsInterface),
            DescriptorKind::FormatTypeI => None,
            DescriptorKind::IsoEndpoint => Some(ControlTable::IsoEndpoint),
        }
    }

    /// Find the kind for a subtype within a context
    pub fn lookup(context: DescriptorContext, subtype: u8) -> Option<DescriptorKind> {
        DescriptorKind::iter().find(|k| k.context() == context && k.subtype() == subtype)
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            // uppercase with _ instead of space for lsusb dump
            write!(f, "{}", self.name().to_shouty_snake_case())
        } else {
            write!(f, "{}", self.name())
        }
    }
}

/// UAC2 subtypes the codec has no layout for; they pass through as generic descriptors but are still named in dumps
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[allow(missing_docs)]
pub enum UnmodelledSubtype {
    MixerUnit,
    SelectorUnit,
    EffectUnit,
    ProcessingUnit,
    ExtensionUnit,
    SampleRateConverter,
    Encoder,
    Decoder,
}

impl UnmodelledSubtype {
    /// Context the subtype is found in
    pub fn context(&self) -> DescriptorContext {
        match self {
            UnmodelledSubtype::Encoder | UnmodelledSubtype::Decoder => {
                DescriptorContext::AudioStreaming
            }
            _ => DescriptorContext::AudioControl,
        }
    }

    /// bDescriptorSubtype
    pub fn subtype(&self) -> u8 {
        match self {
            UnmodelledSubtype::MixerUnit => 0x04,
            UnmodelledSubtype::SelectorUnit => 0x05,
            UnmodelledSubtype::EffectUnit => 0x07,
            UnmodelledSubtype::ProcessingUnit => 0x08,
            UnmodelledSubtype::ExtensionUnit => 0x09,
            UnmodelledSubtype::SampleRateConverter => 0x0d,
            UnmodelledSubtype::Encoder => 0x03,
            UnmodelledSubtype::Decoder => 0x04,
        }
    }

    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            UnmodelledSubtype::MixerUnit => "Mixer Unit",
            UnmodelledSubtype::SelectorUnit => "Selector Unit",
            UnmodelledSubtype::EffectUnit => "Effect Unit",
            UnmodelledSubtype::ProcessingUnit => "Processing Unit",
            UnmodelledSubtype::ExtensionUnit => "Extension Unit",
            UnmodelledSubtype::SampleRateConverter => "Sample Rate Converter",
            UnmodelledSubtype::Encoder => "Encoder",
            UnmodelledSubtype::Decoder => "Decoder",
        }
    }

    /// Find the subtype within a context
    pub fn lookup(context: DescriptorContext, subtype: u8) -> Option<UnmodelledSubtype> {
        UnmodelledSubtype::iter().find(|s| s.context() == context && s.subtype() == subtype)
    }
}

impl fmt::Display for UnmodelledSubtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}", self.name().to_shouty_snake_case())
        } else {
            write!(f, "{}", self.name())
        }
    }
}

/// lsusb name of a subtype within a context, modelled or not
pub fn subtype_name(context: DescriptorContext, subtype: u8) -> Option<String> {
    DescriptorKind::lookup(context, subtype)
        .map(|k| format!("{:#}", k))
        .or_else(|| UnmodelledSubtype::lookup(context, subtype).map(|s| format!("{:#}", s)))
}

/// Flattened catalog entry for listing
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    /// The kind
    pub kind: DescriptorKind,
    /// Context the subtype belongs to
    pub context: DescriptorContext,
    /// bDescriptorType
    pub descriptor_type: u8,
    /// bDescriptorSubtype
    pub subtype: u8,
    /// Wire layout
    pub layout: Layout,
    /// bmControls layout if any
    pub controls: Option<ControlTable>,
    /// Width of bmControls in bytes, 0 if none
    pub controls_width: usize,
    /// Named fields of bmControls
    pub control_fields: &'static [crate::controls::ControlField],
}

impl From<DescriptorKind> for CatalogEntry {
    fn from(kind: DescriptorKind) -> Self {
        let controls = kind.control_table();
        CatalogEntry {
            kind,
            context: kind.context(),
            descriptor_type: kind.descriptor_type(),
            subtype: kind.subtype(),
            layout: kind.layout(),
            controls,
            controls_width: controls.map_or(0, |t| t.width()),
            control_fields: controls.map(|t| t.fields()).unwrap_or(&[]),
        }
    }
}

/// The full catalog in declaration order
pub fn entries() -> Vec<CatalogEntry> {
    DescriptorKind::iter().map(CatalogEntry::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_context_scoped() {
        assert_eq!(
            DescriptorKind::lookup(DescriptorContext::AudioControl, 0x01),
            Some(DescriptorKind::Header)
        );
        assert_eq!(
            DescriptorKind::lookup(DescriptorContext::AudioStreaming, 0x01),
            Some(DescriptorKind::AsGeneral)
        );
        assert_eq!(
            DescriptorKind::lookup(DescriptorContext::StreamingEndpoint, 0x01),
            Some(DescriptorKind::IsoEndpoint)
        );
        assert_eq!(
            DescriptorKind::lookup(DescriptorContext::AudioControl, 0xff),
            None
        );
    }

    #[test]
    fn test_subtypes_unique_per_context() {
        for context in DescriptorContext::iter() {
            let mut subtypes: Vec<u8> = context.kinds().map(|k| k.subtype()).collect();
            let n = subtypes.len();
            subtypes.sort();
            subtypes.dedup();
            assert_eq!(subtypes.len(), n, "{:?}", context);
        }
    }

    #[test]
    fn test_layout_lengths() {
        assert_eq!(DescriptorKind::ClockSelector.layout().length_for(3), 10);
        // M = 2 logical channels plus master
        assert_eq!(DescriptorKind::FeatureUnit.layout().length_for(3), 18);
        assert_eq!(DescriptorKind::InputTerminal.layout().length_for(0), 17);
        assert_eq!(DescriptorKind::FeatureUnit.layout().to_string(), "6 + 4*n");
        assert_eq!(DescriptorKind::ClockSelector.layout().to_string(), "7 + N");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{:#}", DescriptorKind::ClockSource), "CLOCK_SOURCE");
        assert_eq!(format!("{:#}", DescriptorKind::AsGeneral), "AS_GENERAL");
        assert_eq!(format!("{:#}", DescriptorKind::IsoEndpoint), "EP_GENERAL");
        assert_eq!(
            format!("{}", DescriptorContext::AudioControl),
            "AudioControl Interface"
        );
    }

    #[test]
    fn test_context_from_str() {
        assert_eq!(
            DescriptorContext::from_str("ac", true),
            Ok(DescriptorContext::AudioControl)
        );
        assert_eq!(
            DescriptorContext::from_str("ep", true),
            Ok(DescriptorContext::StreamingEndpoint)
        );
        let c: DescriptorContext = serde_json::from_str("\"as\"").unwrap();
        assert_eq!(c, DescriptorContext::AudioStreaming);
    }

    #[test]
    fn test_unmodelled_subtype_names() {
        assert_eq!(
            subtype_name(DescriptorContext::AudioControl, 0x04).as_deref(),
            Some("MIXER_UNIT")
        );
        assert_eq!(
            subtype_name(DescriptorContext::AudioStreaming, 0x04).as_deref(),
            Some("DECODER")
        );
        assert_eq!(
            subtype_name(DescriptorContext::AudioControl, 0x0d).as_deref(),
            Some("SAMPLE_RATE_CONVERTER")
        );
        assert_eq!(
            subtype_name(DescriptorContext::AudioControl, 0x0a).as_deref(),
            Some("CLOCK_SOURCE")
        );
        assert_eq!(subtype_name(DescriptorContext::AudioControl, 0xff), None);
        // no overlap with the modelled kinds
        for s in UnmodelledSubtype::iter() {
            assert_eq!(DescriptorKind::lookup(s.context(), s.subtype()), None, "{}", s);
        }
    }

    #[test]
    fn test_entries() {
        let entries = entries();
        assert_eq!(entries.len(), 10);
        let fu = entries
            .iter()
            .find(|e| e.kind == DescriptorKind::FeatureUnit)
            .unwrap();
        assert_eq!(fu.controls_width, 4);
        assert_eq!(fu.control_fields.len(), 15);
        assert_eq!(fu.descriptor_type, CS_INTERFACE);
    }
}
