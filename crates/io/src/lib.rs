// File I/O: device JSON stream, reference spreadsheet, output workbooks

pub mod json;
pub mod sink;
pub mod xlsx;

pub use json::{load_device_records, DeviceRecordStream};
pub use sink::{part_path, write_output, PartWritten, SinkReport};
pub use xlsx::{load_reference_ids, write_unmatched};
