//! Input and Output Terminals with their direction tagged terminal types
//!
//! A wTerminalType code means something different depending on which side of the function the terminal sits: USB types (0x01xx) are legal on both, input types (0x02xx) only on an Input Terminal and output types (0x03xx) only on an Output Terminal. Codes outside those sets (bi-directional, telephony, external, embedded) are kept raw.
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ChannelConfig;
use crate::catalog::DescriptorKind;
use crate::codec::{check_code, read_controls, write_controls, ClassSpecificDescriptor};
use crate::controls::*;
use crate::error;

/// Universal Serial Bus Terminal Types 2.1; Table 2-1.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum UsbTerminalType {
    Undefined = 0x0100,
    #[default]
    Streaming = 0x0101,
    VendorSpecific = 0x01ff,
}

impl UsbTerminalType {
    fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0100 => Some(UsbTerminalType::Undefined),
            0x0101 => Some(UsbTerminalType::Streaming),
            0x01ff => Some(UsbTerminalType::VendorSpecific),
            _ => None,
        }
    }
}

impl fmt::Display for UsbTerminalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UsbTerminalType::Undefined => write!(f, "USB Undefined"),
            UsbTerminalType::Streaming => write!(f, "USB Streaming"),
            UsbTerminalType::VendorSpecific => write!(f, "USB Vendor Specific"),
        }
    }
}

/// Universal Serial Bus Terminal Types 2.2; Table 2-2.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum InputType {
    Undefined = 0x0200,
    Microphone = 0x0201,
    DesktopMicrophone = 0x0202,
    PersonalMicrophone = 0x0203,
    OmniDirectionalMicrophone = 0x0204,
    MicrophoneArray = 0x0205,
    ProcessingMicrophoneArray = 0x0206,
}

impl InputType {
    fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0200 => Some(InputType::Undefined),
            0x0201 => Some(InputType::Microphone),
            0x0202 => Some(InputType::DesktopMicrophone),
            0x0203 => Some(InputType::PersonalMicrophone),
            0x0204 => Some(InputType::OmniDirectionalMicrophone),
            0x0205 => Some(InputType::MicrophoneArray),
            0x0206 => Some(InputType::ProcessingMicrophoneArray),
            _ => None,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InputType::Undefined => write!(f, "Input Undefined"),
            InputType::Microphone => write!(f, "Microphone"),
            InputType::DesktopMicrophone => write!(f, "Desktop Microphone"),
            InputType::PersonalMicrophone => write!(f, "Personal Microphone"),
            InputType::OmniDirectionalMicrophone => write!(f, "Omni-directional Microphone"),
            InputType::MicrophoneArray => write!(f, "Microphone Array"),
            InputType::ProcessingMicrophoneArray => write!(f, "Processing Microphone Array"),
        }
    }
}

/// Universal Serial Bus Terminal Types 2.3; Table 2-3.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum OutputType {
    Undefined = 0x0300,
    Speaker = 0x0301,
    Headphones = 0x0302,
    HeadMountedDisplayAudio = 0x0303,
    DesktopSpeaker = 0x0304,
    RoomSpeaker = 0x0305,
    CommunicationSpeaker = 0x0306,
    LowFrequencyEffectsSpeaker = 0x0307,
}

impl OutputType {
    fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0300 => Some(OutputType::Undefined),
            0x0301 => Some(OutputType::Speaker),
            0x0302 => Some(OutputType::Headphones),
            0x0303 => Some(OutputType::HeadMountedDisplayAudio),
            0x0304 => Some(OutputType::DesktopSpeaker),
            0x0305 => Some(OutputType::RoomSpeaker),
            0x0306 => Some(OutputType::CommunicationSpeaker),
            0x0307 => Some(OutputType::LowFrequencyEffectsSpeaker),
            _ => None,
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputType::Undefined => write!(f, "Output Undefined"),
            OutputType::Speaker => write!(f, "Speaker"),
            OutputType::Headphones => write!(f, "Headphones"),
            OutputType::HeadMountedDisplayAudio => write!(f, "Head Mounted Display Audio"),
            OutputType::DesktopSpeaker => write!(f, "Desktop Speaker"),
            OutputType::RoomSpeaker => write!(f, "Room Speaker"),
            OutputType::CommunicationSpeaker => write!(f, "Communication Speaker"),
            OutputType::LowFrequencyEffectsSpeaker => write!(f, "Low Frequency Effects Speaker"),
        }
    }
}

/// wTerminalType of an Input Terminal
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputTerminalType {
    /// Audio arrives from the host over a streaming interface
    Usb(UsbTerminalType),
    /// Physical input transducer
    Input(InputType),
    /// Code not legal for an input or without a named type
    Other(u16),
}

impl Default for InputTerminalType {
    fn default() -> Self {
        InputTerminalType::Usb(UsbTerminalType::Streaming)
    }
}

impl From<u16> for InputTerminalType {
    fn from(code: u16) -> Self {
        if let Some(t) = UsbTerminalType::from_code(code) {
            InputTerminalType::Usb(t)
        } else if let Some(t) = InputType::from_code(code) {
            InputTerminalType::Input(t)
        } else {
            InputTerminalType::Other(code)
        }
    }
}

impl From<InputTerminalType> for u16 {
    fn from(t: InputTerminalType) -> Self {
        match t {
            InputTerminalType::Usb(t) => t as u16,
            InputTerminalType::Input(t) => t as u16,
            InputTerminalType::Other(code) => code,
        }
    }
}

impl fmt::Display for InputTerminalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InputTerminalType::Usb(t) => write!(f, "{}", t),
            InputTerminalType::Input(t) => write!(f, "{}", t),
            InputTerminalType::Other(code) => write!(f, "Unknown ({:#06x})", code),
        }
    }
}

/// wTerminalType of an Output Terminal
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputTerminalType {
    /// Audio leaves to the host over a streaming interface
    Usb(UsbTerminalType),
    /// Physical output transducer
    Output(OutputType),
    /// Code not legal for an output or without a named type
    Other(u16),
}

impl Default for OutputTerminalType {
    fn default() -> Self {
        OutputTerminalType::Usb(UsbTerminalType::Streaming)
    }
}

impl From<u16> for OutputTerminalType {
    fn from(code: u16) -> Self {
        if let Some(t) = UsbTerminalType::from_code(code) {
            OutputTerminalType::Usb(t)
        } else if let Some(t) = OutputType::from_code(code) {
            OutputTerminalType::Output(t)
        } else {
            OutputTerminalType::Other(code)
        }
    }
}

impl From<OutputTerminalType> for u16 {
    fn from(t: OutputTerminalType) -> Self {
        match t {
            OutputTerminalType::Usb(t) => t as u16,
            OutputTerminalType::Output(t) => t as u16,
            OutputTerminalType::Other(code) => code,
        }
    }
}

impl fmt::Display for OutputTerminalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputTerminalType::Usb(t) => write!(f, "{}", t),
            OutputTerminalType::Output(t) => write!(f, "{}", t),
            OutputTerminalType::Other(code) => write!(f, "Unknown ({:#06x})", code),
        }
    }
}

/// UAC2: 4.7.2.4 Input Terminal Descriptor; Table 4-9.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct InputTerminal {
    pub terminal_id: u8,
    pub terminal_type: InputTerminalType,
    pub assoc_terminal: u8,
    pub clock_source_id: u8,
    pub nr_channels: u8,
    pub channel_config: ChannelConfig,
    pub channel_names_index: u8,
    pub controls: ControlMap<InputTerminalControl>,
    pub terminal_index: u8,
}

impl ClassSpecificDescriptor for InputTerminal {
    const KIND: DescriptorKind = DescriptorKind::InputTerminal;

    fn validate(&self) -> error::Result<()> {
        check_code::<_, u16>(self.terminal_type, "wTerminalType")
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.push(self.terminal_id);
        buf.extend(u16::from(self.terminal_type).to_le_bytes());
        buf.push(self.assoc_terminal);
        buf.push(self.clock_source_id);
        buf.push(self.nr_channels);
        buf.extend(self.channel_config.0.to_le_bytes());
        buf.push(self.channel_names_index);
        write_controls(buf, &self.controls)?;
        buf.push(self.terminal_index);
        Ok(())
    }

    fn decode_body(value: &[u8], _count: usize) -> error::Result<Self> {
        Ok(InputTerminal {
            terminal_id: value[0],
            terminal_type: InputTerminalType::from(u16::from_le_bytes([value[1], value[2]])),
            assoc_terminal: value[3],
            clock_source_id: value[4],
            nr_channels: value[5],
            channel_config: ChannelConfig(u32::from_le_bytes([
                value[6], value[7], value[8], value[9],
            ])),
            channel_names_index: value[10],
            controls: read_controls(value, 11),
            terminal_index: value[13],
        })
    }
}

/// UAC2: 4.7.2.5 Output Terminal Descriptor; Table 4-10.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OutputTerminal {
    pub terminal_id: u8,
    pub terminal_type: OutputTerminalType,
    pub assoc_terminal: u8,
    pub source_id: u8,
    pub clock_source_id: u8,
    pub controls: ControlMap<OutputTerminalControl>,
    pub terminal_index: u8,
}

impl ClassSpecificDescriptor for OutputTerminal {
    const KIND: DescriptorKind = DescriptorKind::OutputTerminal;

    fn validate(&self) -> error::Result<()> {
        check_code::<_, u16>(self.terminal_type, "wTerminalType")
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> error::Result<()> {
        buf.push(self.terminal_id);
        buf.extend(u16::from(self.terminal_type).to_le_bytes());
        buf.push(self.assoc_terminal);
        buf.push(self.source_id);
        buf.push(self.clock_source_id);
        write_controls(buf, &self.controls)?;
        buf.push(self.terminal_index);
        Ok(())
    }

    fn decode_body(value: &[u8], _count: usize) -> error::Result<Self> {
        Ok(OutputTerminal {
            terminal_id: value[0],
            terminal_type: OutputTerminalType::from(u16::from_le_bytes([value[1], value[2]])),
            assoc_terminal: value[3],
            source_id: value[4],
            clock_source_id: value[5],
            controls: read_controls(value, 6),
            terminal_index: value[8],
        })
    }
}
