mod byteorder;
mod dates;
mod encoding;
mod header;
mod meta;
mod rows;
mod sections;
mod strls;
mod value_labels;

pub use dates::{offset_to_datetime, stata_epoch};
pub use header::{DtaHeader, parse_header};
pub use meta::{DtaLayout, parse_layout};
