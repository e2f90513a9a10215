//! Device enumeration and keyboard selection

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use evdev::Device;

/// Information about an input device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    pub keyboard: bool,
}

impl DeviceInfo {
    /// Get vendor:product string (e.g., "3434:0361")
    pub fn vendor_product(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor, self.product)
    }

    fn kind(&self) -> &'static str {
        if self.keyboard {
            "keyboard"
        } else {
            "other"
        }
    }
}

/// Enumerate all input devices
pub fn enumerate_devices() -> Result<Vec<DeviceInfo>> {
    let mut devices = Vec::new();

    for entry in std::fs::read_dir("/dev/input").context("Failed to read /dev/input")? {
        let path = entry?.path();

        // Only look at event* devices
        if !path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false)
        {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => devices.push(describe(path, &device)),
            Err(e) => {
                tracing::debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    devices.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(devices)
}

fn describe(path: PathBuf, device: &Device) -> DeviceInfo {
    let id = device.input_id();
    DeviceInfo {
        path,
        name: device.name().unwrap_or("Unknown").to_string(),
        vendor: id.vendor(),
        product: id.product(),
        keyboard: is_keyboard(device),
    }
}

/// Check if a device is a keyboard
pub fn is_keyboard(device: &Device) -> bool {
    device
        .supported_events()
        .contains(evdev::EventType::KEY)
        && device
            .supported_keys()
            .map(|keys| keys.contains(evdev::Key::KEY_A))
            .unwrap_or(false)
}

/// Pick a keyboard by selector.
///
/// The selector matches a device path, an exact name, or a `vendor:product`
/// id, in that order. Without a selector the first keyboard wins.
pub fn select<'a>(devices: &'a [DeviceInfo], selector: Option<&str>) -> Option<&'a DeviceInfo> {
    let keyboards = || devices.iter().filter(|d| d.keyboard);

    match selector {
        None => keyboards().next(),
        Some(selector) => {
            let path = Path::new(selector);
            keyboards()
                .find(|d| d.path == path)
                .or_else(|| keyboards().find(|d| d.name == selector))
                .or_else(|| {
                    keyboards().find(|d| d.vendor_product().eq_ignore_ascii_case(selector))
                })
        }
    }
}

/// Open the keyboard matching `selector`.
pub fn open_keyboard(selector: Option<&str>) -> Result<(DeviceInfo, Device)> {
    let devices = enumerate_devices()?;

    let Some(info) = select(&devices, selector) else {
        match selector {
            Some(selector) => bail!("No keyboard matches '{}'", selector),
            None => bail!("No keyboard found; are you in the 'input' group?"),
        }
    };

    let device = Device::open(&info.path)
        .with_context(|| format!("Failed to open {}", info.path.display()))?;
    Ok((info.clone(), device))
}

/// Print every input device, keyboards marked
pub fn print_devices(devices: &[DeviceInfo]) {
    println!("Available input devices:\n");

    for device in devices {
        println!("  {} [{}]", device.name, device.kind());
        println!("    Path: {}", device.path.display());
        println!("    ID: {}", device.vendor_product());
        println!();
    }
}
