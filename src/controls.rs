//! UAC2 bmControls bitmaps
//!
//! Every control in a UAC2 descriptor occupies a 2 bit field: 0b00 not present, 0b01 host readable, 0b11 host programmable. 0b10 is not permitted by the class specification. Each descriptor kind has a declarative table of `(name, bit offset)` consulted by the codec to pack and unpack the bitmap, and a [`ControlMap`] holds the decoded settings keyed by the control enum of that table.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::error::{self, Error, ErrorKind};

/// Bit width of every UAC2 control field
pub const CONTROL_BITS: u8 = 2;

/// The control setting for a UAC bmControls field
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ControlSetting {
    #[default]
    None = 0b00,
    ReadOnly = 0b01,
    /// Not permitted by UAC2; preserved when decoding, rejected when encoding
    Reserved = 0b10,
    ReadWrite = 0b11,
}

impl From<u8> for ControlSetting {
    fn from(b: u8) -> Self {
        match b & 0b11 {
            0b00 => ControlSetting::None,
            0b01 => ControlSetting::ReadOnly,
            0b10 => ControlSetting::Reserved,
            _ => ControlSetting::ReadWrite,
        }
    }
}

impl From<ControlSetting> for u8 {
    fn from(s: ControlSetting) -> Self {
        s as u8
    }
}

impl fmt::Display for ControlSetting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControlSetting::None => write!(f, "none"),
            ControlSetting::ReadOnly => write!(f, "read-only"),
            ControlSetting::Reserved => write!(f, "ILLEGAL VALUE (0b10)"),
            ControlSetting::ReadWrite => write!(f, "read/write"),
        }
    }
}

impl ControlSetting {
    /// Control exists on the entity
    pub fn is_present(&self) -> bool {
        !matches!(self, ControlSetting::None)
    }
}

/// One named 2 bit field of a control bitmap
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize)]
pub struct ControlField {
    /// lsusb style control name
    pub name: &'static str,
    /// Bit offset of the low bit within the bitmap
    pub offset: u8,
}

impl ControlField {
    /// Mask of the field within the bitmap
    pub const fn mask(&self) -> u32 {
        ((1 << CONTROL_BITS) - 1) << self.offset
    }
}

/// A control enum generated by `control_table!`
pub trait Control:
    Copy + Ord + fmt::Debug + IntoEnumIterator + Send + Sync + 'static
{
    /// Table the control belongs to
    const TABLE: ControlTable;

    /// Name and offset entry of the control
    fn field(self) -> &'static ControlField;

    /// Bit offset within the bitmap
    fn offset(self) -> u8 {
        self.field().offset
    }

    /// lsusb style name
    fn name(self) -> &'static str {
        self.field().name
    }
}

macro_rules! control_table {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $table:ident {
            $( $variant:ident = ($offset:expr, $label:expr), )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
        #[allow(missing_docs)]
        $vis enum $name {
            $( $variant, )*
        }

        impl $name {
            /// Fields in declaration order, indexed by discriminant
            pub const FIELDS: &'static [ControlField] = &[
                $( ControlField { name: $label, offset: $offset }, )*
            ];
        }

        impl Control for $name {
            const TABLE: ControlTable = ControlTable::$table;

            fn field(self) -> &'static ControlField {
                &Self::FIELDS[self as usize]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}

control_table! {
    /// UAC2: 4.7.2 Class-Specific AC Interface Header Descriptor; Table 4-5.
    pub enum HeaderControl: Header {
        Latency = (0, "Latency"),
    }
}

control_table! {
    /// UAC2: 4.7.2.1 Clock Source Descriptor; Table 4-6.
    pub enum ClockSourceControl: ClockSource {
        Frequency = (0, "Clock Frequency"),
        Validity = (2, "Clock Validity"),
    }
}

control_table! {
    /// UAC2: 4.7.2.2 Clock Selector Descriptor; Table 4-7.
    pub enum ClockSelectorControl: ClockSelector {
        Selector = (0, "Clock Selector"),
    }
}

control_table! {
    /// UAC2: 4.7.2.3 Clock Multiplier Descriptor; Table 4-8.
    pub enum ClockMultiplierControl: ClockMultiplier {
        Numerator = (0, "Clock Numerator"),
        Denominator = (2, "Clock Denominator"),
    }
}

control_table! {
    /// UAC2: 4.7.2.4 Input Terminal Descriptor; Table 4-9.
    pub enum InputTerminalControl: InputTerminal {
        CopyProtect = (0, "Copy Protect"),
        Connector = (2, "Connector"),
        Overload = (4, "Overload"),
        Cluster = (6, "Cluster"),
        Underflow = (8, "Underflow"),
        Overflow = (10, "Overflow"),
    }
}

control_table! {
    /// UAC2: 4.7.2.5 Output Terminal Descriptor; Table 4-10.
    pub enum OutputTerminalControl: OutputTerminal {
        CopyProtect = (0, "Copy Protect"),
        Connector = (2, "Connector"),
        Overload = (4, "Overload"),
        Underflow = (6, "Underflow"),
        Overflow = (8, "Overflow"),
    }
}

control_table! {
    /// UAC2: 4.7.2.8 Feature Unit Descriptor; Table 4-13.
    pub enum FeatureUnitControl: FeatureUnit {
        Mute = (0, "Mute"),
        Volume = (2, "Volume"),
        Bass = (4, "Bass"),
        Mid = (6, "Mid"),
        Treble = (8, "Treble"),
        GraphicEqualizer = (10, "Graphic Equalizer"),
        AutomaticGain = (12, "Automatic Gain"),
        Delay = (14, "Delay"),
        BassBoost = (16, "Bass Boost"),
        Loudness = (18, "Loudness"),
        InputGain = (20, "Input Gain"),
        InputGainPad = (22, "Input Gain Pad"),
        PhaseInverter = (24, "Phase Inverter"),
        Underflow = (26, "Underflow"),
        Overflow = (28, "Overflow"),
    }
}

control_table! {
    /// UAC2: 4.9.2 Class-Specific AS Interface Descriptor; Table 4-27.
    pub enum AsInterfaceControl: AsInterface {
        ActiveAlternateSetting = (0, "Active Alternate Setting"),
        ValidAlternateSettings = (2, "Valid Alternate Setting"),
    }
}

control_table! {
    /// UAC2: 4.10.1.2 Class-Specific AS Isochronous Audio Data Endpoint Descriptor; Table 4-34.
    pub enum IsoEndpointControl: IsoEndpoint {
        Pitch = (0, "Pitch"),
        DataOverrun = (2, "Data Overrun"),
        DataUnderrun = (4, "Data Underrun"),
    }
}

/// Every control bitmap layout known to the catalog
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[allow(missing_docs)]
pub enum ControlTable {
    Header,
    ClockSource,
    ClockSelector,
    ClockMultiplier,
    InputTerminal,
    OutputTerminal,
    FeatureUnit,
    AsInterface,
    IsoEndpoint,
}

impl ControlTable {
    /// Named fields of the bitmap
    pub fn fields(&self) -> &'static [ControlField] {
        match self {
            ControlTable::Header => HeaderControl::FIELDS,
            ControlTable::ClockSource => ClockSourceControl::FIELDS,
            ControlTable::ClockSelector => ClockSelectorControl::FIELDS,
            ControlTable::ClockMultiplier => ClockMultiplierControl::FIELDS,
            ControlTable::InputTerminal => InputTerminalControl::FIELDS,
            ControlTable::OutputTerminal => OutputTerminalControl::FIELDS,
            ControlTable::FeatureUnit => FeatureUnitControl::FIELDS,
            ControlTable::AsInterface => AsInterfaceControl::FIELDS,
            ControlTable::IsoEndpoint => IsoEndpointControl::FIELDS,
        }
    }

    /// Width of the bitmap on the wire in bytes
    pub fn width(&self) -> usize {
        match self {
            ControlTable::FeatureUnit => 4,
            ControlTable::InputTerminal | ControlTable::OutputTerminal => 2,
            _ => 1,
        }
    }

    /// Bits covered by a named control
    pub fn mask(&self) -> u32 {
        self.fields().iter().fold(0, |acc, f| acc | f.mask())
    }

    /// Bits available in the bitmap
    pub fn width_mask(&self) -> u32 {
        match self.width() {
            4 => u32::MAX,
            w => (1u32 << (w * 8)) - 1,
        }
    }
}

/// Settings of every control in one bitmap
///
/// Only present controls are stored so two maps describing the same bitmap compare equal. Bits outside any named control are kept in `unassigned` so a decoded bitmap encodes back to the same value.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "RawControlMap<C>",
    bound(serialize = "C: Serialize", deserialize = "C: Control + Deserialize<'de>")
)]
pub struct ControlMap<C: Ord> {
    controls: BTreeMap<C, ControlSetting>,
    #[serde(default, skip_serializing_if = "is_zero")]
    unassigned: u32,
}

/// [`ControlMap`] as written in JSON, before absent controls are dropped
#[derive(Deserialize)]
#[serde(bound(deserialize = "C: Ord + Deserialize<'de>"))]
struct RawControlMap<C: Ord> {
    controls: BTreeMap<C, ControlSetting>,
    #[serde(default)]
    unassigned: u32,
}

impl<C: Control> From<RawControlMap<C>> for ControlMap<C> {
    fn from(raw: RawControlMap<C>) -> Self {
        let mut map: ControlMap<C> = raw.controls.into_iter().collect();
        map.unassigned = raw.unassigned;
        map
    }
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl<C: Control> Default for ControlMap<C> {
    fn default() -> Self {
        ControlMap {
            controls: BTreeMap::new(),
            unassigned: 0,
        }
    }
}

impl<C: Control> ControlMap<C> {
    /// Empty map; every control absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ControlMap::set`]
    pub fn with(mut self, control: C, setting: ControlSetting) -> Self {
        self.set(control, setting);
        self
    }

    /// Set a control; [`ControlSetting::None`] removes it
    pub fn set(&mut self, control: C, setting: ControlSetting) {
        if setting.is_present() {
            self.controls.insert(control, setting);
        } else {
            self.controls.remove(&control);
        }
    }

    /// Setting of the control, [`ControlSetting::None`] if absent
    pub fn get(&self, control: C) -> ControlSetting {
        self.controls.get(&control).copied().unwrap_or_default()
    }

    /// Present controls in table order
    pub fn iter(&self) -> impl Iterator<Item = (C, ControlSetting)> + '_ {
        self.controls.iter().map(|(c, s)| (*c, *s))
    }

    /// True if no control is present and no unassigned bits are set
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty() && self.unassigned == 0
    }

    /// Controls carrying the reserved 0b10 value
    pub fn reserved(&self) -> Vec<C> {
        self.iter()
            .filter(|(_, s)| *s == ControlSetting::Reserved)
            .map(|(c, _)| c)
            .collect()
    }

    /// Bits outside any named control
    pub fn unassigned(&self) -> u32 {
        self.unassigned
    }

    /// Unpack a bitmap read from the wire
    pub fn from_bits(bits: u32) -> Self {
        let mut map = ControlMap {
            controls: BTreeMap::new(),
            unassigned: bits & !C::TABLE.mask(),
        };
        for control in C::iter() {
            let setting = ControlSetting::from((bits >> control.offset()) as u8);
            if setting == ControlSetting::Reserved {
                log::warn!(
                    "{} Control of {:?} bitmap {:#x} has reserved value 0b10",
                    control.name(),
                    C::TABLE,
                    bits
                );
            }
            map.set(control, setting);
        }
        if map.unassigned != 0 {
            log::debug!(
                "{:?} bitmap {:#x} has bits outside named controls: {:#x}",
                C::TABLE,
                bits,
                map.unassigned
            );
        }
        map
    }

    /// Pack into a bitmap; fails on a reserved setting or unassigned bits that are not free in the table
    pub fn to_bits(&self) -> error::Result<u32> {
        if self.unassigned & C::TABLE.mask() != 0 {
            return Err(Error::new(
                ErrorKind::InvalidField("bmControls"),
                &format!(
                    "unassigned bits {:#x} overlap named {:?} controls {:#x}",
                    self.unassigned,
                    C::TABLE,
                    C::TABLE.mask()
                ),
            ));
        }
        if self.unassigned & !C::TABLE.width_mask() != 0 {
            return Err(Error::new(
                ErrorKind::InvalidField("bmControls"),
                &format!(
                    "{:?} bitmap is {} bytes, unassigned bits {:#x} do not fit",
                    C::TABLE,
                    C::TABLE.width(),
                    self.unassigned
                ),
            ));
        }
        let mut bits = self.unassigned;
        for (control, setting) in self.iter() {
            if setting == ControlSetting::Reserved {
                return Err(Error::new(
                    ErrorKind::InvalidControlValue(control.name()),
                    &format!(
                        "{} Control cannot be encoded with reserved value 0b10",
                        control.name()
                    ),
                ));
            }
            bits |= (u8::from(setting) as u32) << control.offset();
        }
        Ok(bits)
    }
}

impl<C: Control> FromIterator<(C, ControlSetting)> for ControlMap<C> {
    fn from_iter<I: IntoIterator<Item = (C, ControlSetting)>>(iter: I) -> Self {
        let mut map = ControlMap::new();
        for (c, s) in iter {
            map.set(c, s);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_rw_volume_ro() {
        let map = ControlMap::new()
            .with(FeatureUnitControl::Mute, ControlSetting::ReadWrite)
            .with(FeatureUnitControl::Volume, ControlSetting::ReadOnly);
        assert_eq!(map.to_bits().unwrap(), 0x07);

        let decoded = ControlMap::<FeatureUnitControl>::from_bits(0x07);
        assert_eq!(decoded, map);
        assert_eq!(decoded.get(FeatureUnitControl::Mute), ControlSetting::ReadWrite);
        assert_eq!(decoded.get(FeatureUnitControl::Volume), ControlSetting::ReadOnly);
        for c in FeatureUnitControl::iter().skip(2) {
            assert_eq!(decoded.get(c), ControlSetting::None);
        }
    }

    #[test]
    fn test_reserved_preserved_and_rejected() {
        let decoded = ControlMap::<ClockSourceControl>::from_bits(0b1000);
        assert_eq!(
            decoded.get(ClockSourceControl::Validity),
            ControlSetting::Reserved
        );
        assert_eq!(decoded.reserved(), vec![ClockSourceControl::Validity]);
        let err = decoded.to_bits().unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::InvalidControlValue("Clock Validity")
        );
    }

    #[test]
    fn test_unassigned_bits_kept() {
        // bits 4-7 of a clock source bitmap are reserved by UAC2
        let decoded = ControlMap::<ClockSourceControl>::from_bits(0xf3);
        assert_eq!(decoded.unassigned(), 0xf0);
        assert_eq!(decoded.to_bits().unwrap(), 0xf3);
    }

    #[test]
    fn test_json_absent_control_dropped() {
        let map: ControlMap<ClockSourceControl> = serde_json::from_str(
            r#"{"controls": {"Frequency": "None", "Validity": "ReadOnly"}}"#,
        )
        .unwrap();
        assert_eq!(
            map,
            ControlMap::new().with(ClockSourceControl::Validity, ControlSetting::ReadOnly)
        );
        assert_eq!(ControlMap::from_bits(map.to_bits().unwrap()), map);
    }

    #[test]
    fn test_unassigned_overlapping_controls_rejected() {
        let map: ControlMap<FeatureUnitControl> =
            serde_json::from_str(r#"{"controls": {}, "unassigned": 3}"#).unwrap();
        assert_eq!(
            map.to_bits().unwrap_err().kind(),
            ErrorKind::InvalidField("bmControls")
        );

        let map: ControlMap<ClockSourceControl> =
            serde_json::from_str(r#"{"controls": {}, "unassigned": 240}"#).unwrap();
        assert_eq!(map.to_bits().unwrap(), 0xf0);
    }

    #[test]
    fn test_table_masks() {
        assert_eq!(ControlTable::FeatureUnit.mask(), 0x3fff_ffff);
        assert_eq!(ControlTable::InputTerminal.mask(), 0x0fff);
        assert_eq!(ControlTable::OutputTerminal.mask(), 0x03ff);
        assert_eq!(ControlTable::IsoEndpoint.mask(), 0x3f);
        assert_eq!(ControlTable::Header.width_mask(), 0xff);
        assert_eq!(ControlTable::FeatureUnit.width_mask(), u32::MAX);
    }

    #[test]
    fn test_fields_follow_discriminant() {
        for c in FeatureUnitControl::iter() {
            assert_eq!(c.field().offset, c as u8 * CONTROL_BITS);
        }
        assert_eq!(InputTerminalControl::Overflow.offset(), 10);
        assert_eq!(OutputTerminalControl::Underflow.offset(), 6);
        assert_eq!(ClockMultiplierControl::Denominator.name(), "Clock Denominator");
    }

    #[test]
    fn test_setting_display() {
        assert_eq!(ControlSetting::ReadOnly.to_string(), "read-only");
        assert_eq!(ControlSetting::ReadWrite.to_string(), "read/write");
        assert_eq!(ControlSetting::Reserved.to_string(), "ILLEGAL VALUE (0b10)");
    }
}
