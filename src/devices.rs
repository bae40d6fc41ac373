// ABOUTME: Parser for the dotted key/value tables printed by hashcat --backend-info
// ABOUTME: Groups backend devices under the platform header that precedes them
//
// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::models::{Device, DeviceList, Platform};
use crate::types::HashcatError;

static PLATFORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\s*OpenCL Platform ID #(\d+)").expect("platform header regex")
});

static DEVICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\s*Backend Device ID #(\d+)").expect("device header regex")
});

/// Matches `  Memory.Total...: 8192 MB` style rows; dots pad the key to a fixed width
static PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\s+([A-Za-z][A-Za-z.()]*?)\.*:\s+(.*?)\s*$").expect("property regex")
});

/// Leading unsigned integer of a value such as `8192 MB (limited to 2048 MB)`
fn leading_number<T: std::str::FromStr + Default>(value: &str) -> T {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or_default()
}

fn apply_platform_property(platform: &mut Platform, key: &str, value: &str) {
    match key {
        "Vendor" => platform.vendor = value.to_owned(),
        "Name" => platform.name = value.to_owned(),
        "Version" => platform.version = value.to_owned(),
        _ => trace!(key, "Ignoring platform property"),
    }
}

fn apply_device_property(device: &mut Device, key: &str, value: &str) {
    match key {
        "Type" => device.device_type = value.to_owned(),
        "Vendor.ID" => device.vendor_id = leading_number(value),
        "Vendor" => device.vendor = value.to_owned(),
        "Name" => device.name = value.to_owned(),
        "Version" => device.version = value.to_owned(),
        "Processor(s)" => device.processors = leading_number(value),
        "Clock" => device.clock_mhz = leading_number(value),
        "Memory.Total" => device.memory_total_mb = leading_number(value),
        "Memory.Free" => device.memory_free_mb = leading_number(value),
        "Local.Memory" => device.local_memory_kb = leading_number(value),
        "OpenCL.Version" => device.opencl_version = value.to_owned(),
        "Driver.Version" => device.driver_version = value.to_owned(),
        _ => trace!(key, "Ignoring device property"),
    }
}

/// Parse `--backend-info` output into platforms and devices
///
/// Device blocks that appear before any platform header (CUDA or HIP
/// sections) are skipped, as are unknown keys.
///
/// # Errors
///
/// Returns a parse error when the output contains no platform.
pub fn parse_device_output(output: &str) -> Result<DeviceList, HashcatError> {
    let mut platforms: Vec<Platform> = Vec::new();
    let mut in_device = false;

    for line in output.lines() {
        if let Some(caps) = PLATFORM_RE.captures(line) {
            platforms.push(Platform {
                id: leading_number(&caps[1]),
                ..Platform::default()
            });
            in_device = false;
            continue;
        }

        if let Some(caps) = DEVICE_RE.captures(line) {
            if let Some(platform) = platforms.last_mut() {
                platform.devices.push(Device {
                    id: leading_number(&caps[1]),
                    ..Device::default()
                });
                in_device = true;
            }
            continue;
        }

        let Some(caps) = PROPERTY_RE.captures(line) else {
            continue;
        };
        let (key, value) = (&caps[1], &caps[2]);

        let Some(platform) = platforms.last_mut() else {
            continue;
        };
        if in_device {
            if let Some(device) = platform.devices.last_mut() {
                apply_device_property(device, key, value);
            }
        } else {
            apply_platform_property(platform, key, value);
        }
    }

    if platforms.is_empty() {
        return Err(HashcatError::parse(
            "no OpenCL platforms found in output",
        ));
    }

    Ok(DeviceList { platforms })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    const BACKEND_INFO: &str = "\
hashcat (v6.2.6) starting in backend information mode

CUDA Info:
==========

CUDA.Version.: 12.2

Backend Device ID #1 (Alias: #3)
  Name.........: NVIDIA GeForce RTX 3080
  Processor(s).: 68

OpenCL Info:
============

OpenCL Platform ID #1
  Vendor..: The pocl project
  Name....: Portable Computing Language
  Version.: OpenCL 3.0 PoCL 3.1

  Backend Device ID #2
    Type...........: CPU
    Vendor.ID......: 128
    Vendor.........: GenuineIntel
    Name...........: cpu-haswell-Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz
    Version........: OpenCL 3.0 PoCL HSTR: cpu-x86_64-pc-linux-gnu-haswell
    Processor(s)...: 12
    Clock..........: 4700
    Memory.Total...: 29988 MB (limited to 4096 MB allocatable in one block)
    Memory.Free....: 14962 MB
    Local.Memory...: 256 KB
    OpenCL.Version.: OpenCL C 1.2 PoCL
    Driver.Version.: 3.1

OpenCL Platform ID #2
  Vendor..: NVIDIA Corporation
  Name....: NVIDIA CUDA
  Version.: OpenCL 3.0 CUDA 12.2.138

  Backend Device ID #3
    Type...........: GPU
    Vendor.ID......: 32
    Vendor.........: NVIDIA Corporation
    Name...........: NVIDIA GeForce RTX 3080
    Processor(s)...: 68
    Clock..........: 1710
";

    #[test]
    fn test_parses_platforms_and_devices() {
        let list = parse_device_output(BACKEND_INFO).unwrap();
        assert_eq!(list.platforms.len(), 2);

        let pocl = &list.platforms[0];
        assert_eq!(pocl.id, 1);
        assert_eq!(pocl.vendor, "The pocl project");
        assert_eq!(pocl.name, "Portable Computing Language");
        assert_eq!(pocl.version, "OpenCL 3.0 PoCL 3.1");
        assert_eq!(pocl.devices.len(), 1);

        let cpu = &pocl.devices[0];
        assert_eq!(cpu.id, 2);
        assert_eq!(cpu.device_type, "CPU");
        assert_eq!(cpu.vendor_id, 128);
        assert_eq!(cpu.processors, 12);
        assert_eq!(cpu.clock_mhz, 4700);
        assert_eq!(cpu.memory_total_mb, 29988);
        assert_eq!(cpu.memory_free_mb, 14962);
        assert_eq!(cpu.local_memory_kb, 256);
        assert_eq!(cpu.opencl_version, "OpenCL C 1.2 PoCL");
        assert_eq!(cpu.driver_version, "3.1");
    }

    #[test]
    fn test_devices_before_platform_are_skipped() {
        let list = parse_device_output(BACKEND_INFO).unwrap();
        let ids: Vec<u32> = list.devices().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_lookups_over_parsed_output() {
        let list = parse_device_output(BACKEND_INFO).unwrap();
        assert_eq!(
            list.device_by_name("rtx 3080").map(|d| d.id),
            Some(3)
        );
        assert_eq!(list.devices_by_type("gpu").len(), 1);
        assert_eq!(
            list.platform_by_id(2).map(|p| p.vendor.as_str()),
            Some("NVIDIA Corporation")
        );
    }

    #[test]
    fn test_no_platform_is_parse_error() {
        let err = parse_device_output("hashcat (v6.2.6) starting\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number::<u64>("8192 MB (limited)"), 8192);
        assert_eq!(leading_number::<u32>("n/a"), 0);
        assert_eq!(leading_number::<u32>("01"), 1);
    }
}
