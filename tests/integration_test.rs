use serde_json::json;

mod common;

/// lsusb style dump of a single descriptor from args
#[test]
fn test_decode_dump() {
    let te = common::TestEnv::new();

    let comp = common::read_dump_to_string(common::CLOCK_SOURCE_DUMP);
    let mut args = vec!["decode"];
    args.extend(common::CLOCK_SOURCE_BYTES);

    te.assert_output(&args, comp.as_str(), false);
}

#[test]
fn test_decode_json() {
    let te = common::TestEnv::new();

    let mut args = vec!["decode", "--json"];
    args.extend(common::CLOCK_SOURCE_BYTES);

    te.assert_output_json(
        &args,
        json!([{
            "offset": 0,
            "descriptor": {
                "ClockSource": {
                    "clock_id": 41,
                    "attributes": { "clock_type": "InternalProgrammable", "sof_synced": false },
                    "controls": { "controls": { "Frequency": "ReadWrite", "Validity": "ReadOnly" } }
                }
            }
        }]),
    );
}

/// Whole AC interface from file: every entity dumped with header total length
#[test]
fn test_decode_block_file() {
    let te = common::TestEnv::new().strip_start(true);
    let args = ["decode", "--block", "--file", common::SPEAKER_AC_HEX];

    te.assert_output(&args, "wTotalLength       0x0040\n", true);
    te.assert_output(&args, "bCategory               1 Desktop Speaker\n", true);
    te.assert_output(&args, "wTerminalType      0x0301 Speaker\n", true);
    te.assert_output(
        &args,
        "bmaControls( 0) 0x0000000f\nMute Control (read/write)\nVolume Control (read/write)\n",
        true,
    );
}

#[test]
fn test_decode_scan_offsets() {
    let te = common::TestEnv::new();

    te.assert_output_json(
        &["decode", "--json", "--file", common::SPEAKER_AC_HEX],
        json!([
            { "offset": 0, "descriptor": { "Header": { "total_length": 64 } } },
            { "offset": 9, "descriptor": { "ClockSource": { "clock_id": 41 } } },
            { "offset": 17, "descriptor": { "InputTerminal": { "terminal_id": 2, "nr_channels": 2 } } },
            { "offset": 34, "descriptor": { "FeatureUnit": { "unit_id": 10, "source_id": 2 } } },
            { "offset": 52, "descriptor": { "OutputTerminal": { "terminal_id": 20, "source_id": 10 } } }
        ]),
    );
}

/// Comma separated 0x hex read from stdin in the streaming interface context
#[test]
fn test_decode_stdin_streaming() {
    let te = common::TestEnv::new().strip_start(true);

    let input = common::read_dump_to_string(common::AS_INTERFACE_HEX);
    let actual = te.assert_success_and_get_output(&["decode", "--context", "as"], Some(&input));

    assert!(actual.starts_with("AudioStreaming Interface Descriptor:\n"));
    assert!(actual.contains("bmFormats      0x00000001\nPCM\n"));
    assert!(actual.contains("bFormatType             1 (FORMAT_TYPE_I)\n"));
    assert!(actual.contains("bSubslotSize            3\n"));
    assert!(actual.contains("bBitResolution         24\n"));
}

/// Unknown subtype passes through as generic by default
#[test]
fn test_decode_passthrough() {
    let te = common::TestEnv::new().strip_start(true);

    te.assert_output(
        &["decode", "04", "24", "ff", "00"],
        "bDescriptorSubtype    255 (unknown)\n",
        true,
    );
}

#[test]
fn test_decode_strict_unknown_subtype() {
    let te = common::TestEnv::new();

    let stderr = te.assert_failure_and_get_stderr(&["decode", "--strict", "04", "24", "ff", "00"]);
    assert!(stderr.contains("UnknownSubtype(255)"), "{}", stderr);
}

#[test]
fn test_decode_truncated() {
    let te = common::TestEnv::new();

    let stderr = te.assert_failure_and_get_stderr(&["decode", "08", "24", "0a", "29"]);
    assert!(stderr.contains("TruncatedDescriptor"), "{}", stderr);
}

#[test]
fn test_decode_bad_hex() {
    let te = common::TestEnv::new();

    let stderr = te.assert_failure_and_get_stderr(&["decode", "08", "zz"]);
    assert!(stderr.contains("Parsing"), "{}", stderr);
}

/// JSON of a decoded block encodes back to the same bytes
#[test]
fn test_encode_block_round_trip() {
    let te = common::TestEnv::new();

    let hex = common::read_dump_to_string(common::SPEAKER_AC_HEX);
    let json = te.assert_success_and_get_output(
        &["decode", "--block", "--json", "--file", common::SPEAKER_AC_HEX],
        None,
    );
    let encoded = te.assert_success_and_get_output(&["encode", "--block"], Some(&json));

    assert_eq!(
        encoded.trim(),
        hex.split_whitespace().collect::<Vec<_>>().join(" ")
    );
}

#[test]
fn test_encode_single() {
    let te = common::TestEnv::new();

    let json = r#"{"FormatTypeI": {"format_type": "TypeI", "subslot_size": 3, "bit_resolution": 24}}"#;
    te.assert_output(&["encode", json], "06 24 02 01 03 18\n", false);

    let stderr = te.assert_failure_and_get_stderr(&[
        "encode",
        r#"{"FormatTypeI": {"format_type": "TypeI", "subslot_size": 2, "bit_resolution": 24}}"#,
    ]);
    assert!(stderr.contains("InvalidField"), "{}", stderr);
}

#[test]
fn test_catalog() {
    let te = common::TestEnv::new().strip_start(true);

    te.assert_output(&["catalog"], "Feature Unit (FEATURE_UNIT):\n", true);
    te.assert_output(&["catalog"], "bLength           6 + 4*n\n", true);
}

#[test]
fn test_catalog_json() {
    let te = common::TestEnv::new();

    te.assert_output_json(
        &["catalog", "--json"],
        json!([
            { "kind": "Header", "descriptor_type": 36, "subtype": 1, "controls_width": 1 },
            { "kind": "InputTerminal", "subtype": 2, "controls_width": 2 },
            { "kind": "OutputTerminal", "subtype": 3 },
            { "kind": "FeatureUnit", "subtype": 6, "controls_width": 4 }
        ]),
    );
}

/// Mixer unit has no layout but is still named
#[test]
fn test_decode_passthrough_named() {
    let te = common::TestEnv::new().strip_start(true);

    te.assert_output(
        &["decode", "05", "24", "04", "0b", "0a"],
        "bDescriptorSubtype      4 (MIXER_UNIT)\n",
        true,
    );
}

#[test]
fn test_encode_unassigned_overlap() {
    let te = common::TestEnv::new();

    let stderr = te.assert_failure_and_get_stderr(&[
        "encode",
        r#"{"FeatureUnit": {"unit_id": 10, "source_id": 2, "feature_index": 0, "controls": [{"controls": {}, "unassigned": 3}]}}"#,
    ]);
    assert!(stderr.contains("InvalidField"), "{}", stderr);
}
