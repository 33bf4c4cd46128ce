//! Encode typed descriptors to bytes and decode bytes back, enforcing the catalog layout both ways
//!
//! Every kind implements [`ClassSpecificDescriptor`] for its body (the bytes after the 3 byte header); the header, `bLength` and trailing array count are owned here so the declared length always equals the serialized size.
//!
//! ```
//! use uacdesc::codec;
//! use uacdesc::catalog::DescriptorContext;
//! use uacdesc::descriptors::UacDescriptor;
//!
//! let bytes = [0x08, 0x24, 0x0a, 0x29, 0x01, 0x07, 0x00, 0x00];
//! let d = codec::decode(&bytes, DescriptorContext::AudioControl).unwrap();
//! assert!(matches!(d, UacDescriptor::ClockSource(_)));
//! assert_eq!(codec::encode_descriptor(&d).unwrap(), bytes);
//! ```
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::catalog::{CountRule, DescriptorContext, DescriptorKind, HEADER_SIZE};
use crate::controls::{Control, ControlMap};
use crate::descriptors::*;
use crate::error::{self, Error, ErrorArg, ErrorKind};

/// Largest value of bLength
pub const MAX_DESCRIPTOR_LENGTH: usize = u8::MAX as usize;

/// Body of a catalog descriptor kind
///
/// `decode_body` is handed exactly `layout.length_for(count) - HEADER_SIZE` bytes so implementations index without bounds checks of their own.
pub trait ClassSpecificDescriptor: Sized {
    /// Catalog entry
    const KIND: DescriptorKind;

    /// Elements in the trailing array, 0 for fixed kinds
    fn element_count(&self) -> usize {
        0
    }

    /// Field domain checks run before encoding
    fn validate(&self) -> error::Result<()> {
        Ok(())
    }

    /// Append the bytes following the header
    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()>;

    /// Read from the bytes following the header
    fn decode_body(value: &[u8], count: usize) -> error::Result<Self>;
}

pub(crate) fn read_controls<C: Control>(value: &[u8], offset: usize) -> ControlMap<C> {
    let width = C::TABLE.width();
    let mut le = [0u8; 4];
    le[..width].copy_from_slice(&value[offset..offset + width]);
    ControlMap::from_bits(u32::from_le_bytes(le))
}

pub(crate) fn write_controls<C: Control>(
    buf: &mut Vec<u8>,
    controls: &ControlMap<C>,
) -> error::Result<()> {
    let bits = controls.to_bits()?;
    buf.extend(&bits.to_le_bytes()[..C::TABLE.width()]);
    Ok(())
}

/// Fail if `value` is a raw fallback variant holding a code that has a named variant, which would decode to something else
pub(crate) fn check_code<T, R>(value: T, field: &'static str) -> error::Result<()>
where
    T: Copy + PartialEq + std::fmt::Debug + From<R>,
    R: From<T>,
{
    let named = T::from(R::from(value));
    if named != value {
        return Err(Error::new(
            ErrorKind::InvalidField(field),
            &format!("{:?} is the code of {:?}; use the named value", value, named),
        ));
    }
    Ok(())
}

/// The 3 byte header common to every class-specific descriptor
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorHeader {
    /// bLength
    pub length: u8,
    /// bDescriptorType
    pub descriptor_type: u8,
    /// bDescriptorSubtype
    pub descriptor_subtype: u8,
}

impl DescriptorHeader {
    /// Read the header and check the declared length is available in `value`
    pub fn read(value: &[u8]) -> error::Result<Self> {
        if value.len() < HEADER_SIZE {
            return Err(Error::new_truncated("Descriptor header", HEADER_SIZE, value.len()));
        }
        let header = DescriptorHeader {
            length: value[0],
            descriptor_type: value[1],
            descriptor_subtype: value[2],
        };
        if (header.length as usize) < HEADER_SIZE {
            return Err(Error::new_descriptor_len(
                "Descriptor header",
                HEADER_SIZE,
                header.length as usize,
            ));
        }
        if header.length as usize > value.len() {
            return Err(Error::new_truncated(
                "Descriptor",
                header.length as usize,
                value.len(),
            ));
        }
        Ok(header)
    }

    /// Check the header belongs to `context`, returning the catalog kind
    pub fn kind(&self, context: DescriptorContext) -> error::Result<DescriptorKind> {
        if self.descriptor_type != context.descriptor_type() {
            return Err(Error::new(
                ErrorKind::DescriptorTypeMismatch(ErrorArg::new(
                    context.descriptor_type(),
                    self.descriptor_type,
                )),
                &format!(
                    "bDescriptorType {:#04x} is not class-specific for {}",
                    self.descriptor_type, context
                ),
            ));
        }
        DescriptorKind::lookup(context, self.descriptor_subtype).ok_or_else(|| {
            Error::new(
                ErrorKind::UnknownSubtype(self.descriptor_subtype),
                &format!(
                    "bDescriptorSubtype {:#04x} unknown for {}",
                    self.descriptor_subtype, context
                ),
            )
        })
    }
}

/// Number of trailing elements in a descriptor of `kind` whose bytes are exactly `value`
fn element_count(kind: DescriptorKind, value: &[u8]) -> error::Result<usize> {
    let layout = kind.layout();
    let length = value.len();
    if length < layout.fixed_size {
        return Err(Error::new_descriptor_len(kind.name(), layout.fixed_size, length));
    }

    match layout.trailing {
        None => {
            if length > layout.fixed_size {
                log::debug!(
                    "{} has {} bytes beyond its fixed size {}; ignoring",
                    kind,
                    length - layout.fixed_size,
                    layout.fixed_size
                );
            }
            Ok(0)
        }
        Some(trailing) => {
            let extra = length - layout.fixed_size;
            if extra % trailing.element_size != 0 {
                return Err(Error::new_descriptor_len(
                    kind.name(),
                    length - extra % trailing.element_size,
                    length,
                ));
            }
            let count = extra / trailing.element_size;
            if count < trailing.min_count {
                return Err(Error::new_descriptor_len(
                    kind.name(),
                    layout.length_for(trailing.min_count),
                    length,
                ));
            }
            if let CountRule::Field(offset) = trailing.count {
                let declared = value[offset] as usize;
                if declared != count {
                    return Err(Error::new_descriptor_len(
                        kind.name(),
                        layout.length_for(declared),
                        length,
                    ));
                }
            }
            Ok(count)
        }
    }
}

fn decode_kind<T: ClassSpecificDescriptor>(value: &[u8]) -> error::Result<T> {
    let count = element_count(T::KIND, value)?;
    let end = T::KIND.layout().length_for(count);
    log::trace!("Decoding {} with {} trailing elements", T::KIND, count);
    T::decode_body(&value[HEADER_SIZE..end], count)
}

/// Decode one descriptor of a known kind from the start of `value`
///
/// Bytes beyond the declared bLength are left alone.
pub fn decode_as<T: ClassSpecificDescriptor>(value: &[u8]) -> error::Result<T> {
    let header = DescriptorHeader::read(value)?;
    let kind = header.kind(T::KIND.context())?;
    if kind != T::KIND {
        return Err(Error::new(
            ErrorKind::InvalidArg,
            &format!("Expected {} descriptor, found {}", T::KIND, kind),
        ));
    }
    decode_kind(&value[..header.length as usize])
}

/// Decode one descriptor from the start of `value` within `context`
pub fn decode(value: &[u8], context: DescriptorContext) -> error::Result<UacDescriptor> {
    let header = DescriptorHeader::read(value)?;
    let kind = header.kind(context)?;
    let value = &value[..header.length as usize];

    match kind {
        DescriptorKind::Header => decode_kind(value).map(UacDescriptor::Header),
        DescriptorKind::InputTerminal => decode_kind(value).map(UacDescriptor::InputTerminal),
        DescriptorKind::OutputTerminal => decode_kind(value).map(UacDescriptor::OutputTerminal),
        DescriptorKind::FeatureUnit => decode_kind(value).map(UacDescriptor::FeatureUnit),
        DescriptorKind::ClockSource => decode_kind(value).map(UacDescriptor::ClockSource),
        DescriptorKind::ClockSelector => decode_kind(value).map(UacDescriptor::ClockSelector),
        DescriptorKind::ClockMultiplier => {
            decode_kind(value).map(UacDescriptor::ClockMultiplier)
        }
        DescriptorKind::AsGeneral => decode_kind(value).map(UacDescriptor::AsGeneral),
        DescriptorKind::FormatTypeI => decode_kind(value).map(UacDescriptor::FormatTypeI),
        DescriptorKind::IsoEndpoint => decode_kind(value).map(UacDescriptor::IsoEndpoint),
    }
}

/// Encode a typed descriptor, header included
pub fn encode<T: ClassSpecificDescriptor>(value: &T) -> error::Result<Vec<u8>> {
    let kind = T::KIND;
    let layout = kind.layout();
    let count = value.element_count();

    if let Some(trailing) = layout.trailing {
        if count < trailing.min_count {
            return Err(Error::new_descriptor_len(
                kind.name(),
                layout.length_for(trailing.min_count),
                layout.length_for(count),
            ));
        }
    }
    let length = layout.length_for(count);
    if length > MAX_DESCRIPTOR_LENGTH {
        return Err(Error::new(
            ErrorKind::DescriptorTooLong(length),
            &format!(
                "{} with {} elements is {} bytes, bLength is at most {}",
                kind.name(),
                count,
                length,
                MAX_DESCRIPTOR_LENGTH
            ),
        ));
    }
    value.validate()?;

    let mut buf = Vec::with_capacity(length);
    buf.push(length as u8);
    buf.push(kind.descriptor_type());
    buf.push(kind.subtype());
    value.encode_body(&mut buf)?;

    if buf.len() != length {
        return Err(Error::new(
            ErrorKind::Other("encode_body"),
            &format!(
                "{} body wrote {} bytes for bLength {}",
                kind.name(),
                buf.len(),
                length
            ),
        ));
    }

    Ok(buf)
}

/// Encode any descriptor; [`UacDescriptor::Generic`] is re-emitted as held
pub fn encode_descriptor(descriptor: &UacDescriptor) -> error::Result<Vec<u8>> {
    match descriptor {
        UacDescriptor::Header(d) => encode(d),
        UacDescriptor::InputTerminal(d) => encode(d),
        UacDescriptor::OutputTerminal(d) => encode(d),
        UacDescriptor::FeatureUnit(d) => encode(d),
        UacDescriptor::ClockSource(d) => encode(d),
        UacDescriptor::ClockSelector(d) => encode(d),
        UacDescriptor::ClockMultiplier(d) => encode(d),
        UacDescriptor::AsGeneral(d) => encode(d),
        UacDescriptor::FormatTypeI(d) => encode(d),
        UacDescriptor::IsoEndpoint(d) => encode(d),
        UacDescriptor::Generic(gd) => {
            let data_len = gd.data.as_ref().map_or(0, |d| d.len());
            if (gd.length as usize) < HEADER_SIZE || gd.expected_data_length() != data_len {
                return Err(Error::new_descriptor_len(
                    "Generic descriptor",
                    HEADER_SIZE + data_len,
                    gd.length as usize,
                ));
            }
            Ok(gd.to_owned().into())
        }
    }
}

macro_rules! impl_byte_conversions {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TryFrom<&[u8]> for $ty {
                type Error = Error;

                fn try_from(value: &[u8]) -> error::Result<Self> {
                    decode_as(value)
                }
            }

            impl TryFrom<&$ty> for Vec<u8> {
                type Error = Error;

                fn try_from(value: &$ty) -> error::Result<Self> {
                    encode(value)
                }
            }
        )*
    };
}

impl_byte_conversions!(
    AcHeader,
    InputTerminal,
    OutputTerminal,
    FeatureUnit,
    ClockSource,
    ClockSelector,
    ClockMultiplier,
    AsGeneral,
    FormatTypeI,
    IsoEndpoint,
);

/// A descriptor found by [`DescriptorScanner`] with its position in the scanned buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedDescriptor {
    /// Byte offset of bLength
    pub offset: usize,
    /// Decoded value
    pub descriptor: UacDescriptor,
}

/// Iterator over concatenated class-specific descriptors
///
/// A truncated or zero length descriptor ends the scan since the next header cannot be located. Any other error is yielded and the scan resumes after the declared bLength. With pass-through (the default) descriptors of another type or an unknown subtype are yielded as [`UacDescriptor::Generic`] rather than errors.
#[derive(Debug, Clone)]
pub struct DescriptorScanner<'a> {
    data: &'a [u8],
    offset: usize,
    context: DescriptorContext,
    passthrough: bool,
    done: bool,
}

impl<'a> DescriptorScanner<'a> {
    /// Scan `data` within `context`
    pub fn new(data: &'a [u8], context: DescriptorContext) -> Self {
        DescriptorScanner {
            data,
            offset: 0,
            context,
            passthrough: true,
            done: false,
        }
    }

    /// Yield unknown descriptors as [`UacDescriptor::Generic`] rather than errors
    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }

    fn stop(&mut self, e: Error) -> Option<error::Result<ScannedDescriptor>> {
        self.done = true;
        Some(Err(e.at_offset(self.offset)))
    }
}

impl Iterator for DescriptorScanner<'_> {
    type Item = error::Result<ScannedDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.data.len() {
            return None;
        }

        let rest = &self.data[self.offset..];
        let header = match DescriptorHeader::read(rest) {
            Ok(h) => h,
            Err(e) => return self.stop(e),
        };
        let length = header.length as usize;
        let offset = self.offset;

        let ret = match decode(rest, self.context) {
            Ok(descriptor) => Ok(ScannedDescriptor { offset, descriptor }),
            Err(e)
                if self.passthrough
                    && matches!(
                        e.kind,
                        ErrorKind::UnknownSubtype(_) | ErrorKind::DescriptorTypeMismatch(_)
                    ) =>
            {
                log::debug!("{:#}; passing through as generic", e.clone().at_offset(offset));
                GenericDescriptor::try_from(&rest[..length]).map(|gd| ScannedDescriptor {
                    offset,
                    descriptor: UacDescriptor::Generic(gd),
                })
            }
            Err(e) => Err(e),
        };

        self.offset += length;
        Some(ret.map_err(|e| e.at_offset(offset)))
    }
}

impl std::iter::FusedIterator for DescriptorScanner<'_> {}

/// Decode every descriptor in `data`, failing on the first error
pub fn decode_all(
    data: &[u8],
    context: DescriptorContext,
) -> error::Result<Vec<ScannedDescriptor>> {
    DescriptorScanner::new(data, context).collect()
}

/// Parse hex bytes as typed or pasted from lsusb/usbmon: whitespace, commas and colons separate bytes, `0x` prefixes are optional and unseparated runs are read in pairs
pub fn parse_hex(s: &str) -> error::Result<Vec<u8>> {
    let mut ret = Vec::new();
    for token in s
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|t| !t.is_empty())
    {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::new(
                ErrorKind::Parsing,
                &format!("'{}' is not hex digits", token),
            ));
        }
        if token.len() <= 2 {
            ret.push(u8::from_str_radix(token, 16).map_err(|e| {
                Error::new(ErrorKind::Parsing, &format!("'{}': {}", token, e))
            })?);
        } else if token.len() % 2 == 0 {
            for i in (0..token.len()).step_by(2) {
                ret.push(u8::from_str_radix(&token[i..i + 2], 16).map_err(|e| {
                    Error::new(ErrorKind::Parsing, &format!("'{}': {}", token, e))
                })?);
            }
        } else {
            return Err(Error::new(
                ErrorKind::Parsing,
                &format!("'{}' is not a byte or an even length hex run", token),
            ));
        }
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::*;

    #[test]
    fn test_truncated() {
        let e = decode(&[0x08, 0x24], DescriptorContext::AudioControl).unwrap_err();
        assert!(matches!(e.kind, ErrorKind::TruncatedDescriptor(_)));
        let e = decode(&[0x08, 0x24, 0x0a, 0x01], DescriptorContext::AudioControl).unwrap_err();
        assert_eq!(
            e.kind,
            ErrorKind::TruncatedDescriptor(ErrorArg::new(8, 4))
        );
    }

    #[test]
    fn test_unknown_subtype() {
        let e = decode(&[0x03, 0x24, 0xff], DescriptorContext::AudioControl).unwrap_err();
        assert_eq!(e.kind, ErrorKind::UnknownSubtype(0xff));
    }

    #[test]
    fn test_type_mismatch() {
        let e = decode(
            &[0x08, 0x24, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00],
            DescriptorContext::StreamingEndpoint,
        )
        .unwrap_err();
        assert_eq!(
            e.kind,
            ErrorKind::DescriptorTypeMismatch(ErrorArg::new(0x25, 0x24))
        );
    }

    #[test]
    fn test_fixed_kind_too_short() {
        let e = decode(
            &[0x07, 0x24, 0x0a, 0x29, 0x01, 0x07, 0x00],
            DescriptorContext::AudioControl,
        )
        .unwrap_err();
        assert_eq!(e.kind, ErrorKind::MalformedLength(ErrorArg::new(8, 7)));
    }

    #[test]
    fn test_fixed_kind_extra_ignored() {
        let bytes = [0x09, 0x24, 0x0a, 0x29, 0x01, 0x07, 0x00, 0x00, 0xee];
        let d = decode(&bytes, DescriptorContext::AudioControl).unwrap();
        assert_eq!(encode_descriptor(&d).unwrap(), bytes[..8].to_vec());
    }

    #[test]
    fn test_feature_unit_remainder() {
        // 6 + 4 + 1 is not a whole number of bitmaps
        let mut bytes = vec![0x0b, 0x24, 0x06, 0x0a, 0x02];
        bytes.extend([0u8; 6]);
        let e = decode(&bytes, DescriptorContext::AudioControl).unwrap_err();
        assert!(matches!(e.kind, ErrorKind::MalformedLength(_)));
    }

    #[test]
    fn test_feature_unit_needs_master() {
        let e = decode(
            &[0x06, 0x24, 0x06, 0x0a, 0x02, 0x00],
            DescriptorContext::AudioControl,
        )
        .unwrap_err();
        assert_eq!(e.kind, ErrorKind::MalformedLength(ErrorArg::new(10, 6)));

        let empty = FeatureUnit {
            controls: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            encode(&empty).unwrap_err().kind,
            ErrorKind::MalformedLength(_)
        ));
    }

    #[test]
    fn test_clock_selector_count_mismatch() {
        // bNrInPins says 3 but bLength only holds 2
        let bytes = [0x09, 0x24, 0x0b, 0x28, 0x03, 0x29, 0x2a, 0x00, 0x00];
        let e = decode(&bytes, DescriptorContext::AudioControl).unwrap_err();
        assert_eq!(e.kind, ErrorKind::MalformedLength(ErrorArg::new(10, 9)));
    }

    #[test]
    fn test_too_long() {
        let sel = ClockSelector {
            clock_id: 1,
            source_ids: vec![2; 249],
            ..Default::default()
        };
        assert_eq!(encode(&sel).unwrap_err().kind, ErrorKind::DescriptorTooLong(256));
        let sel = ClockSelector {
            source_ids: vec![2; 248],
            ..sel
        };
        assert_eq!(encode(&sel).unwrap()[0], 255);
    }

    #[test]
    fn test_reserved_control_not_encoded() {
        let cs = ClockSource {
            controls: ControlMap::new().with(ClockSourceControl::Frequency, ControlSetting::Reserved),
            ..Default::default()
        };
        assert_eq!(
            encode(&cs).unwrap_err().kind,
            ErrorKind::InvalidControlValue("Clock Frequency")
        );
    }

    #[test]
    fn test_generic_length_must_match_data() {
        let mut gd = GenericDescriptor::try_from(&[0x05, 0x24, 0x04, 0x0b, 0x0a][..]).unwrap();
        assert_eq!(
            encode_descriptor(&UacDescriptor::Generic(gd.clone())).unwrap(),
            vec![0x05, 0x24, 0x04, 0x0b, 0x0a]
        );
        gd.length = 4;
        assert_eq!(
            encode_descriptor(&UacDescriptor::Generic(gd)).unwrap_err().kind,
            ErrorKind::MalformedLength(ErrorArg::new(5, 4))
        );
    }

    #[test]
    fn test_decode_as_wrong_kind() {
        let bytes = [0x08, 0x24, 0x0a, 0x29, 0x01, 0x07, 0x00, 0x00];
        assert!(decode_as::<ClockSource>(&bytes).is_ok());
        assert_eq!(
            decode_as::<ClockMultiplier>(&bytes).unwrap_err().kind,
            ErrorKind::InvalidArg
        );
        assert!(ClockSource::try_from(&bytes[..]).is_ok());
    }

    #[test]
    fn test_scanner_offsets_and_passthrough() {
        let data = [
            0x08, 0x24, 0x0a, 0x29, 0x01, 0x07, 0x00, 0x00, // clock source
            0x04, 0x24, 0x0f, 0x55, // unknown subtype
            0x07, 0x24, 0x0c, 0x2a, 0x29, 0x00, 0x00, // clock multiplier
        ];
        let found: Vec<ScannedDescriptor> = DescriptorScanner::new(&data, DescriptorContext::AudioControl)
            .collect::<error::Result<_>>()
            .unwrap();
        assert_eq!(
            found.iter().map(|s| s.offset).collect::<Vec<_>>(),
            vec![0, 8, 12]
        );
        assert!(matches!(found[1].descriptor, UacDescriptor::Generic(_)));

        let strict: Vec<_> = DescriptorScanner::new(&data, DescriptorContext::AudioControl)
            .passthrough(false)
            .collect();
        assert_eq!(strict.len(), 3);
        let e = strict[1].as_ref().unwrap_err();
        assert_eq!(e.kind, ErrorKind::UnknownSubtype(0x0f));
        assert_eq!(e.offset, Some(8));
        assert!(strict[2].is_ok());
    }

    #[test]
    fn test_scanner_stops_on_truncation() {
        let data = [0x08, 0x24, 0x0a, 0x29, 0x01, 0x07, 0x00, 0x00, 0x07, 0x24, 0x0c];
        let mut scanner = DescriptorScanner::new(&data, DescriptorContext::AudioControl);
        assert!(scanner.next().unwrap().is_ok());
        let e = scanner.next().unwrap().unwrap_err();
        assert!(matches!(e.kind, ErrorKind::TruncatedDescriptor(_)));
        assert_eq!(e.offset, Some(8));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(
            parse_hex("0x08, 0x24 0a:29\n0107").unwrap(),
            vec![0x08, 0x24, 0x0a, 0x29, 0x01, 0x07]
        );
        assert!(parse_hex("0x123").is_err());
        assert!(parse_hex("zz").is_err());
        for bad in ["+f", "0x+f", "-1", "+0ff", "0x"] {
            assert_eq!(parse_hex(bad).unwrap_err().kind, ErrorKind::Parsing, "{}", bad);
        }
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }
}
