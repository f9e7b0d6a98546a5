//! Device and precision selection for the generative model

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Compute device the model runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cuda,
    Cpu,
}

/// Weight precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Float16,
    Float32,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda => write!(f, "cuda"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Float16 => write!(f, "float16"),
            Precision::Float32 => write!(f, "float32"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceSelection {
    pub device: Device,
    pub precision: Precision,
}

impl DeviceSelection {
    /// Half precision on the accelerator, full precision on CPU
    pub fn for_device(device: Device) -> Self {
        let precision = match device {
            Device::Cuda => Precision::Float16,
            Device::Cpu => Precision::Float32,
        };
        Self { device, precision }
    }

    /// Resolve a configured preference ("auto", "cuda" or "cpu")
    pub fn select(preference: &str) -> Self {
        match preference {
            "cuda" => Self::for_device(Device::Cuda),
            "cpu" => Self::for_device(Device::Cpu),
            _ => {
                let visible = std::env::var("CUDA_VISIBLE_DEVICES").ok();
                let present = Path::new("/dev/nvidiactl").exists();
                if accelerator_available(present, visible.as_deref()) {
                    Self::for_device(Device::Cuda)
                } else {
                    Self::for_device(Device::Cpu)
                }
            }
        }
    }
}

/// A CUDA device is usable when the driver node exists and
/// `CUDA_VISIBLE_DEVICES` does not hide every device.
pub fn accelerator_available(device_node_present: bool, visible_devices: Option<&str>) -> bool {
    if !device_node_present {
        return false;
    }
    match visible_devices.map(str::trim) {
        None => true,
        Some("") | Some("-1") => false,
        Some(_) => true,
    }
}
