use crate::models::error::CaptureError;

/// How a device delivers sample data.
///
/// Continuous devices keep one buffer handle open and deliver bytes across
/// many ticks. One-shot devices cannot stream: each captured block needs a
/// full open/enable/read/disable/close cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    Continuous,
    OneShot,
}

impl AcquisitionMode {
    /// Acquisition mode of the known hardware variants, keyed by device name.
    ///
    /// Enumeration collaborators that only know the kernel device name can
    /// use this to fill in `DeviceInfo::mode`; backends built from richer
    /// capability metadata should set the mode directly instead.
    pub fn for_device_name(name: &str) -> Self {
        if name == "cf-ad9643-core-lpc" || name.starts_with("cf-ad9250") {
            Self::OneShot
        } else {
            Self::Continuous
        }
    }
}

/// Identity of the device backing a sample source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub mode: AcquisitionMode,
}

impl DeviceInfo {
    /// Device info with the mode inferred from the name.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let mode = AcquisitionMode::for_device_name(&name);
        Self { name, mode }
    }
}

/// Byte-oriented acquisition channel into a hardware sample buffer.
///
/// Implemented by device backends. The capture session drives it one bounded
/// read per tick; reads must not block past the data actually available.
pub trait SampleSource {
    /// Acquisition mode of the backing device; fixed for the source's
    /// lifetime.
    fn mode(&self) -> AcquisitionMode;

    /// Open the hardware buffer and configure it for `block_size_bytes`.
    ///
    /// Called once at arm for continuous sources, once per captured block
    /// for one-shot sources. A failure at any step (open, length
    /// configuration, enable) aborts the capture.
    fn open(&mut self, block_size_bytes: usize) -> Result<(), CaptureError>;

    /// Read at most `buf.len()` bytes of packed sample data into `buf`.
    ///
    /// Returns the number of bytes read. Zero means the stream has ended.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError>;

    /// Disable and release the hardware buffer. Safe to call when not open.
    fn close(&mut self);

    /// Information about the device backing this source.
    fn device_info(&self) -> DeviceInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_one_shot_devices() {
        assert_eq!(
            AcquisitionMode::for_device_name("cf-ad9643-core-lpc"),
            AcquisitionMode::OneShot
        );
        assert_eq!(
            AcquisitionMode::for_device_name("cf-ad9250-core-lpc"),
            AcquisitionMode::OneShot
        );
    }

    #[test]
    fn other_devices_stream() {
        assert_eq!(
            AcquisitionMode::for_device_name("cf-ad9467-core-lpc"),
            AcquisitionMode::Continuous
        );
        // Exact match only; a suffix does not make it one-shot.
        assert_eq!(
            AcquisitionMode::for_device_name("cf-ad9643-core-lpc-b"),
            AcquisitionMode::Continuous
        );
    }

    #[test]
    fn device_info_from_name_carries_mode() {
        let info = DeviceInfo::from_name("cf-ad9250-4");
        assert_eq!(info.mode, AcquisitionMode::OneShot);
        assert_eq!(info.name, "cf-ad9250-4");
    }
}
