pub mod capture_delegate;
pub mod device_attrs;
pub mod sample_source;
