// ABOUTME: Backend platform and device descriptions reported by hashcat --backend-info
// ABOUTME: Lookup helpers by id, name, and device type across all platforms
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use serde::{Deserialize, Serialize};

/// A compute backend device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Backend device id (the value accepted by device filters)
    pub id: u32,
    /// Device type, e.g. `CPU` or `GPU`
    #[serde(rename = "type")]
    pub device_type: String,
    /// PCI vendor id
    pub vendor_id: u32,
    /// Vendor name
    pub vendor: String,
    /// Device name
    pub name: String,
    /// Backend version string
    pub version: String,
    /// Compute units
    pub processors: u32,
    /// Clock in MHz
    pub clock_mhz: u32,
    /// Total memory in MB
    pub memory_total_mb: u64,
    /// Free memory in MB
    pub memory_free_mb: u64,
    /// Local memory in KB
    pub local_memory_kb: u64,
    /// `OpenCL` C version
    pub opencl_version: String,
    /// Driver version
    pub driver_version: String,
}

/// A backend platform grouping devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Platform id
    pub id: u32,
    /// Vendor name
    pub vendor: String,
    /// Platform name
    pub name: String,
    /// Platform version
    pub version: String,
    /// Devices on this platform
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<Device>,
}

/// Every platform reported by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceList {
    /// Platforms in report order
    pub platforms: Vec<Platform>,
}

impl DeviceList {
    /// Iterate over every device on every platform
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.platforms.iter().flat_map(|p| p.devices.iter())
    }

    /// Find a device by backend id
    #[must_use]
    pub fn device_by_id(&self, id: u32) -> Option<&Device> {
        self.devices().find(|d| d.id == id)
    }

    /// Find the first device whose name contains `name`, ignoring case
    #[must_use]
    pub fn device_by_name(&self, name: &str) -> Option<&Device> {
        let needle = name.to_lowercase();
        self.devices()
            .find(|d| d.name.to_lowercase().contains(&needle))
    }

    /// All devices of the given type, ignoring case
    #[must_use]
    pub fn devices_by_type(&self, device_type: &str) -> Vec<&Device> {
        self.devices()
            .filter(|d| d.device_type.eq_ignore_ascii_case(device_type))
            .collect()
    }

    /// Find a platform by id
    #[must_use]
    pub fn platform_by_id(&self, id: u32) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeviceList {
        DeviceList {
            platforms: vec![
                Platform {
                    id: 1,
                    name: "Portable Computing Language".to_owned(),
                    devices: vec![Device {
                        id: 1,
                        device_type: "CPU".to_owned(),
                        name: "pthread-Intel(R) Core(TM) i7".to_owned(),
                        ..Device::default()
                    }],
                    ..Platform::default()
                },
                Platform {
                    id: 2,
                    name: "NVIDIA CUDA".to_owned(),
                    devices: vec![
                        Device {
                            id: 2,
                            device_type: "GPU".to_owned(),
                            name: "NVIDIA GeForce RTX 4090".to_owned(),
                            ..Device::default()
                        },
                        Device {
                            id: 3,
                            device_type: "GPU".to_owned(),
                            name: "NVIDIA GeForce RTX 3080".to_owned(),
                            ..Device::default()
                        },
                    ],
                    ..Platform::default()
                },
            ],
        }
    }

    #[test]
    fn test_finds_devices_across_platforms() {
        let list = sample();
        assert_eq!(list.device_by_id(3).map(|d| d.name.as_str()), Some("NVIDIA GeForce RTX 3080"));
        assert!(list.device_by_id(9).is_none());
    }

    #[test]
    fn test_name_lookup_is_case_insensitive_substring() {
        let list = sample();
        assert_eq!(list.device_by_name("rtx 4090").map(|d| d.id), Some(2));
    }

    #[test]
    fn test_type_lookup_ignores_case() {
        let list = sample();
        assert_eq!(list.devices_by_type("gpu").len(), 2);
        assert_eq!(list.devices_by_type("CPU").len(), 1);
        assert_eq!(list.platform_by_id(2).map(|p| p.devices.len()), Some(2));
    }
}
