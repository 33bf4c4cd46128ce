//! lsusb --verbose style dumps of decoded descriptors
//!
//! Field lines are the UAC2 field name left aligned and the value right aligned to [`LSUSB_DUMP_WIDTH`], with decoded detail such as control access or channel names on the lines below.
use colored::Color;
use itertools::Itertools;
use std::fmt::{self, Write};
use strum::IntoEnumIterator;

use crate::catalog::{self, DescriptorContext, UnmodelledSubtype, CS_ENDPOINT};
use crate::codec::ScannedDescriptor;
use crate::colour::ColourTheme;
use crate::controls::{Control, ControlMap, ControlSetting};
use crate::descriptors::*;
use crate::error::Error;

/// Column the value of a field line ends at
pub const LSUSB_DUMP_WIDTH: usize = 25;

/// Accumulates dump lines with optional colouring
#[derive(Debug, Clone)]
pub struct Dumper {
    out: String,
    theme: ColourTheme,
}

impl Default for Dumper {
    fn default() -> Self {
        Dumper::new(ColourTheme::plain())
    }
}

impl Dumper {
    /// Dumper colouring with `theme`
    pub fn new(theme: ColourTheme) -> Self {
        Dumper {
            out: String::new(),
            theme,
        }
    }

    /// The dump so far
    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, indent: usize, s: &str) {
        // writing to a String cannot fail
        let _ = writeln!(self.out, "{:indent$}{}", "", s, indent = indent);
    }

    fn dump_string(&mut self, title: &str, indent: usize) {
        let s = ColourTheme::paint(self.theme.title, &format!("{}:", title));
        self.line(indent, &s);
    }

    fn field(&mut self, name: &str, value: String, colour: Option<Color>, suffix: &str, indent: usize) {
        let pad = LSUSB_DUMP_WIDTH
            .checked_sub(name.len() + value.len())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let value = ColourTheme::paint(colour, &value);
        let suffix = if suffix.is_empty() {
            String::new()
        } else {
            format!(" {}", ColourTheme::paint(self.theme.string, suffix))
        };
        let s = format!("{}{:pad$}{}{}", name, "", value, suffix, pad = pad);
        self.line(indent, &s);
    }

    fn dump_value<T: fmt::Display>(&mut self, value: T, name: &str, indent: usize) {
        self.field(name, value.to_string(), self.theme.number, "", indent);
    }

    fn dump_value_string<T: fmt::Display, S: fmt::Display>(
        &mut self,
        value: T,
        name: &str,
        string: S,
        indent: usize,
    ) {
        self.field(
            name,
            value.to_string(),
            self.theme.number,
            &string.to_string(),
            indent,
        );
    }

    /// Hex with zero padding to `bytes` width
    fn dump_hex(&mut self, value: u32, bytes: usize, name: &str, indent: usize) {
        let s = format!("{:#0w$x}", value, w = bytes * 2 + 2);
        self.field(name, s, self.theme.hex, "", indent);
    }

    fn dump_array(&mut self, values: &[u8], name: &str, indent: usize) {
        for (i, v) in values.iter().enumerate() {
            self.dump_value(v, &format!("{}({})", name, i), indent);
        }
    }

    fn dump_names(&mut self, names: &[&str], indent: usize) {
        for n in names {
            let s = ColourTheme::paint(self.theme.string, n);
            self.line(indent, &s);
        }
    }

    fn dump_warning(&mut self, message: &str, indent: usize) {
        let s = ColourTheme::paint(self.theme.warning, &format!("Warning: {}", message));
        self.line(indent, &s);
    }

    fn dump_bitmap_controls<C: Control>(&mut self, controls: &ControlMap<C>, indent: usize) {
        for (control, setting) in controls.iter() {
            let colour = if setting == ControlSetting::Reserved {
                self.theme.warning
            } else {
                self.theme.control
            };
            let s = ColourTheme::paint(
                colour,
                &format!("{} Control ({})", control.name(), setting),
            );
            self.line(indent, &s);
        }
        if controls.unassigned() != 0 {
            self.dump_warning(
                &format!("reserved bits set {:#x}", controls.unassigned()),
                indent,
            );
        }
    }

    fn dump_controls<C: Control>(&mut self, controls: &ControlMap<C>, name: &str, indent: usize) {
        let bits = controls
            .iter()
            .fold(controls.unassigned(), |acc, (c, s)| {
                acc | ((u8::from(s) as u32) << c.offset())
            });
        self.dump_hex(bits, C::TABLE.width(), name, indent);
        self.dump_bitmap_controls(controls, indent + 2);
    }

    fn dump_header(&mut self, h: &AcHeader, indent: usize) {
        self.dump_value(h.version, "bcdADC", indent);
        self.dump_value_string(u8::from(h.category), "bCategory", h.category, indent);
        self.dump_hex(h.total_length as u32, 2, "wTotalLength", indent);
        self.dump_controls(&h.controls, "bmControls", indent);
    }

    fn dump_clock_source(&mut self, cs: &ClockSource, indent: usize) {
        self.dump_value(cs.clock_id, "bClockID", indent);
        self.dump_hex(u8::from(cs.attributes) as u32, 1, "bmAttributes", indent);
        self.dump_names(&[cs.attributes.clock_type.to_string().as_str()], indent + 2);
        if cs.attributes.sof_synced {
            self.dump_names(&["Synced to SOF"], indent + 2);
        }
        self.dump_controls(&cs.controls, "bmControls", indent);
        self.dump_value(cs.assoc_terminal, "bAssocTerminal", indent);
        self.dump_value(cs.clock_source_index, "iClockSource", indent);
    }

    fn dump_clock_selector(&mut self, sel: &ClockSelector, indent: usize) {
        self.dump_value(sel.clock_id, "bClockID", indent);
        self.dump_value(sel.nr_in_pins(), "bNrInPins", indent);
        self.dump_array(&sel.source_ids, "baCSourceID", indent);
        self.dump_controls(&sel.controls, "bmControls", indent);
        self.dump_value(sel.clock_selector_index, "iClockSelector", indent);
    }

    fn dump_clock_multiplier(&mut self, m: &ClockMultiplier, indent: usize) {
        self.dump_value(m.clock_id, "bClockID", indent);
        self.dump_value(m.source_id, "bCSourceID", indent);
        self.dump_controls(&m.controls, "bmControls", indent);
        self.dump_value(m.clock_multiplier_index, "iClockMultiplier", indent);
    }

    fn dump_channel_config(&mut self, config: ChannelConfig, indent: usize) {
        self.dump_hex(config.0, 4, "bmChannelConfig", indent);
        self.dump_names(&config.names(), indent + 2);
        if config.is_raw_data() {
            self.dump_names(&["Raw Data"], indent + 2);
        }
    }

    fn dump_input_terminal(&mut self, it: &InputTerminal, indent: usize) {
        self.dump_value(it.terminal_id, "bTerminalID", indent);
        self.dump_value_string(
            format!("{:#06x}", u16::from(it.terminal_type)),
            "wTerminalType",
            it.terminal_type,
            indent,
        );
        self.dump_value(it.assoc_terminal, "bAssocTerminal", indent);
        self.dump_value(it.clock_source_id, "bCSourceID", indent);
        self.dump_value(it.nr_channels, "bNrChannels", indent);
        self.dump_channel_config(it.channel_config, indent);
        self.dump_value(it.channel_names_index, "iChannelNames", indent);
        self.dump_controls(&it.controls, "bmControls", indent);
        self.dump_value(it.terminal_index, "iTerminal", indent);
    }

    fn dump_output_terminal(&mut self, ot: &OutputTerminal, indent: usize) {
        self.dump_value(ot.terminal_id, "bTerminalID", indent);
        self.dump_value_string(
            format!("{:#06x}", u16::from(ot.terminal_type)),
            "wTerminalType",
            ot.terminal_type,
            indent,
        );
        self.dump_value(ot.assoc_terminal, "bAssocTerminal", indent);
        self.dump_value(ot.source_id, "bSourceID", indent);
        self.dump_value(ot.clock_source_id, "bCSourceID", indent);
        self.dump_controls(&ot.controls, "bmControls", indent);
        self.dump_value(ot.terminal_index, "iTerminal", indent);
    }

    fn dump_feature_unit(&mut self, fu: &FeatureUnit, indent: usize) {
        self.dump_value(fu.unit_id, "bUnitID", indent);
        self.dump_value(fu.source_id, "bSourceID", indent);
        for (i, c) in fu.controls.iter().enumerate() {
            self.dump_controls(c, &format!("bmaControls({:2})", i), indent);
        }
        self.dump_value(fu.feature_index, "iFeature", indent);
    }

    fn dump_as_general(&mut self, asg: &AsGeneral, indent: usize) {
        self.dump_value(asg.terminal_link, "bTerminalLink", indent);
        self.dump_controls(&asg.controls, "bmControls", indent);
        self.dump_value_string(
            u8::from(asg.format_type),
            "bFormatType",
            format!("({})", asg.format_type),
            indent,
        );
        self.dump_hex(asg.formats.0, 4, "bmFormats", indent);
        self.dump_names(&asg.formats.names(asg.format_type), indent + 2);
        self.dump_value(asg.nr_channels, "bNrChannels", indent);
        self.dump_channel_config(asg.channel_config, indent);
        self.dump_value(asg.channel_names_index, "iChannelNames", indent);
    }

    fn dump_format_type_i(&mut self, ft: &FormatTypeI, indent: usize) {
        self.dump_value_string(
            u8::from(ft.format_type),
            "bFormatType",
            format!("({})", ft.format_type),
            indent,
        );
        self.dump_value(ft.subslot_size, "bSubslotSize", indent);
        self.dump_value(ft.bit_resolution, "bBitResolution", indent);
        if let Err(e) = ft.check() {
            self.dump_warning(&format!("{:#}", e), indent);
        }
    }

    fn dump_iso_endpoint(&mut self, ep: &IsoEndpoint, indent: usize) {
        self.dump_hex(
            if ep.max_packets_only {
                IsoEndpoint::MAX_PACKETS_ONLY as u32
            } else {
                0
            },
            1,
            "bmAttributes",
            indent,
        );
        if ep.max_packets_only {
            self.dump_names(&["MaxPacketsOnly"], indent + 2);
        }
        self.dump_controls(&ep.controls, "bmControls", indent);
        self.dump_value_string(
            u8::from(ep.lock_delay_units),
            "bLockDelayUnits",
            ep.lock_delay_units,
            indent,
        );
        self.dump_value(ep.lock_delay, "wLockDelay", indent);
    }

    fn dump_generic(&mut self, gd: &GenericDescriptor, indent: usize) {
        if let Some(data) = &gd.data {
            let s = data.iter().map(|b| format!("{:02x}", b)).join(" ");
            self.field("data", s, self.theme.hex, "", indent);
        }
    }

    /// Dump one descriptor found in `context`
    pub fn dump_descriptor(&mut self, d: &UacDescriptor, context: DescriptorContext, indent: usize) {
        let (title, length, descriptor_type, subtype) = match (d, d.kind()) {
            (UacDescriptor::Generic(gd), _) => {
                let title = if gd.descriptor_type == CS_ENDPOINT {
                    DescriptorContext::StreamingEndpoint
                } else {
                    context
                };
                (title, gd.length as usize, gd.descriptor_type, gd.descriptor_subtype)
            }
            (_, Some(kind)) => {
                let count = match d {
                    UacDescriptor::ClockSelector(s) => s.source_ids.len(),
                    UacDescriptor::FeatureUnit(f) => f.controls.len(),
                    _ => 0,
                };
                (
                    kind.context(),
                    kind.layout().length_for(count),
                    kind.descriptor_type(),
                    kind.subtype(),
                )
            }
            (_, None) => (context, 0, 0, 0),
        };
        self.dump_string(&format!("{} Descriptor", title), indent);
        self.dump_value(length, "bLength", indent + 2);
        self.dump_value(descriptor_type, "bDescriptorType", indent + 2);
        let subtype_name = match (d, d.kind()) {
            (_, Some(k)) => format!("({:#})", k),
            (UacDescriptor::Generic(gd), None) if gd.descriptor_type == title.descriptor_type() => {
                catalog::subtype_name(title, subtype)
                    .map_or_else(|| "(unknown)".to_string(), |n| format!("({})", n))
            }
            _ => "(unknown)".to_string(),
        };
        self.dump_value_string(subtype, "bDescriptorSubtype", subtype_name, indent + 2);

        let indent = indent + 2;
        match d {
            UacDescriptor::Header(h) => self.dump_header(h, indent),
            UacDescriptor::InputTerminal(it) => self.dump_input_terminal(it, indent),
            UacDescriptor::OutputTerminal(ot) => self.dump_output_terminal(ot, indent),
            UacDescriptor::FeatureUnit(fu) => self.dump_feature_unit(fu, indent),
            UacDescriptor::ClockSource(cs) => self.dump_clock_source(cs, indent),
            UacDescriptor::ClockSelector(sel) => self.dump_clock_selector(sel, indent),
            UacDescriptor::ClockMultiplier(m) => self.dump_clock_multiplier(m, indent),
            UacDescriptor::AsGeneral(asg) => self.dump_as_general(asg, indent),
            UacDescriptor::FormatTypeI(ft) => self.dump_format_type_i(ft, indent),
            UacDescriptor::IsoEndpoint(ep) => self.dump_iso_endpoint(ep, indent),
            UacDescriptor::Generic(gd) => self.dump_generic(gd, indent),
        }
    }

    /// Dump the results of a scan, errors inline as warnings
    pub fn dump_scan<'a, I>(&mut self, results: I, context: DescriptorContext, indent: usize)
    where
        I: IntoIterator<Item = &'a Result<ScannedDescriptor, Error>>,
    {
        for r in results {
            match r {
                Ok(s) => self.dump_descriptor(&s.descriptor, context, indent),
                Err(e) => self.dump_warning(&format!("{:#}", e), indent),
            }
        }
    }

    /// Dump the catalog: one entry per kind with its layout and control table
    pub fn dump_catalog(&mut self) {
        for entry in catalog::entries() {
            self.dump_string(&format!("{} ({:#})", entry.kind, entry.kind), 0);
            self.dump_value(format!("{:#}", entry.context), "context", 2);
            self.dump_hex(entry.descriptor_type as u32, 1, "bDescriptorType", 2);
            self.dump_hex(entry.subtype as u32, 1, "bDescriptorSubtype", 2);
            self.dump_value(entry.layout, "bLength", 2);
            if let Some(table) = entry.controls {
                self.dump_value(table.width(), "bmControls width", 2);
                for field in table.fields() {
                    self.dump_value(format!("D{}..{}", field.offset + 1, field.offset), field.name, 4);
                }
            }
        }
        self.dump_string("Passed through as generic", 0);
        for s in UnmodelledSubtype::iter() {
            self.dump_value_string(
                format!("{:#04x}", s.subtype()),
                &format!("{:#}", s.context()),
                format!("{} ({:#})", s, s),
                2,
            );
        }
    }
}

impl fmt::Display for UacDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let context = self
            .kind()
            .map(|k| k.context())
            .unwrap_or(DescriptorContext::AudioControl);
        let mut d = Dumper::default();
        d.dump_descriptor(self, context, 0);
        write!(f, "{}", d.finish())
    }
}
