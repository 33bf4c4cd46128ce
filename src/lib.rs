//! Schema and codec for USB Audio Class 2.0 class-specific descriptors: build typed descriptors and encode them byte exact, or decode raw descriptor bytes as found in a device configuration back into typed values.
//!
//! The [`catalog`] defines every supported kind with its wire layout and control table, [`codec`] moves between bytes and the typed values of [`descriptors`], [`function`] assembles a whole Audio Control interface and [`dump`] renders lsusb style.
#![warn(missing_docs)]
use simple_logger::SimpleLogger;

pub mod catalog;
pub mod codec;
pub mod colour;
pub mod config;
pub mod controls;
pub mod descriptors;
pub mod dump;
pub mod error;
pub mod function;

/// Set uacdesc module and binary log level
pub fn set_log_level(debug: u8) -> crate::error::Result<()> {
    match debug {
        // just use env if not passed
        0 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Error.to_level_filter())
            .env(),
        1 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Info.to_level_filter()),
        2 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Debug.to_level_filter()),
        _ => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Trace.to_level_filter()),
    }
    .init()
    .map_err(|e| {
        crate::error::Error::new(
            crate::error::ErrorKind::Other("simple_logger"),
            &format!("Failed to set log level: {}", e),
        )
    })?;

    Ok(())
}

// run any Rust code as doctest
#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
