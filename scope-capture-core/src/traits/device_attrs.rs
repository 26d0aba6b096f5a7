use crate::models::error::CaptureError;

/// Named scalar attribute access on a device.
///
/// The file-based representation of attributes belongs to the device-access
/// collaborator; the core only reads and writes values by name
/// (`buffer/length`, `buffer/enable`, `sampling_frequency`, ...).
pub trait DeviceAttributes {
    fn write_int(&mut self, name: &str, value: i64) -> Result<(), CaptureError>;

    fn read_double(&self, name: &str) -> Result<f64, CaptureError>;

    fn has_attr(&self, name: &str) -> bool;
}

/// Sampling frequency of a device, in Hz.
///
/// Tries the per-channel attribute first, then the device-wide one. Devices
/// clocked by a software trigger expose neither; those fall back to 1 Hz and
/// the caller rescales the axis once the trigger rate is known.
pub fn read_sampling_frequency(dev: &impl DeviceAttributes) -> f64 {
    for name in ["in_voltage_sampling_frequency", "sampling_frequency"] {
        if dev.has_attr(name) {
            if let Ok(freq) = dev.read_double(name) {
                return freq;
            }
        }
    }
    1.0
}
