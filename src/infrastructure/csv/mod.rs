// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Export encoding and upload preflight

mod csv_encoder;
mod upload_reader;

pub use csv_encoder::{CsvEncoder, EncodedCsv, CSV_MIME_TYPE};
pub use upload_reader::{UploadPayload, UploadReader};
