use anyhow::{Context, Result};
use evdev::{Device, EventType, InputEvent};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A key event from a keyboard, tagged with the device index.
#[derive(Debug, Clone)]
pub struct DeviceEvent {
    pub device_idx: usize,
    pub code: u16,
    /// 0 = release, 1 = press, 2 = autorepeat
    pub value: i32,
}

impl DeviceEvent {
    fn from_input(device_idx: usize, event: &InputEvent) -> Option<Self> {
        if event.event_type() != EventType::KEY {
            return None;
        }
        Some(Self {
            device_idx,
            code: event.code(),
            value: event.value(),
        })
    }

    pub fn is_press(&self) -> bool {
        self.value == 1
    }
}

/// Find all keyboard devices under /dev/input/.
pub fn find_keyboards() -> Result<Vec<PathBuf>> {
    let mut keyboards = Vec::new();
    let input_dir = Path::new("/dev/input");

    for entry in std::fs::read_dir(input_dir).context("reading /dev/input")? {
        let entry = entry?;
        let path = entry.path();

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !name.starts_with("event") {
            continue;
        }

        match Device::open(&path) {
            Ok(dev) => {
                if is_keyboard(&dev) {
                    info!(path = %path.display(), name = ?dev.name(), "found keyboard");
                    keyboards.push(path);
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping device");
            }
        }
    }

    Ok(keyboards)
}

/// Heuristic: a device is a keyboard if it supports letter keys and Enter.
fn is_keyboard(dev: &Device) -> bool {
    let Some(keys) = dev.supported_keys() else {
        return false;
    };

    keys.contains(evdev::Key::KEY_A)
        && keys.contains(evdev::Key::KEY_Z)
        && keys.contains(evdev::Key::KEY_ENTER)
}

/// Stream key events from a keyboard into the channel, optionally grabbing it
/// exclusively. Runs until the receiver is dropped or the device errors.
pub async fn read_device(
    path: PathBuf,
    device_idx: usize,
    grab: bool,
    tx: mpsc::UnboundedSender<DeviceEvent>,
) -> Result<()> {
    let mut dev = Device::open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    let dev_name = dev.name().unwrap_or("unknown").to_string();
    if grab {
        info!(device = %dev_name, path = %path.display(), "grabbing device");
        dev.grab()
            .with_context(|| format!("grabbing {}", path.display()))?;
    } else {
        info!(device = %dev_name, path = %path.display(), "reading device");
    }

    let mut stream = dev.into_event_stream()
        .context("creating event stream")?;

    loop {
        match stream.next_event().await {
            Ok(event) => {
                let Some(key_event) = DeviceEvent::from_input(device_idx, &event) else {
                    continue;
                };
                if tx.send(key_event).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(device = %dev_name, error = %e, "device error, stopping");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_events_are_kept() {
        let ev = InputEvent::new(EventType::KEY, 30, 1);
        let de = DeviceEvent::from_input(2, &ev).expect("key event");
        assert_eq!(de.device_idx, 2);
        assert_eq!(de.code, 30);
        assert!(de.is_press());
    }

    #[test]
    fn repeats_and_releases_are_not_presses() {
        for value in [0, 2] {
            let ev = InputEvent::new(EventType::KEY, 30, value);
            assert!(!DeviceEvent::from_input(0, &ev).unwrap().is_press());
        }
    }

    #[test]
    fn non_key_events_are_dropped() {
        let syn = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        assert!(DeviceEvent::from_input(0, &syn).is_none());
    }
}
