//! Schema type inference for semi-structured uploads.
//!
//! Derives entities and typed fields from delimited text or JSON payloads
//! when no explicit schema is supplied. Parse failures are hard errors:
//! the caller surfaces them as a rejected upload.

pub mod error;
pub mod infer;
pub mod records;

pub use error::{InferError, Result};
pub use infer::{InferRequest, InferredSchema, infer_schema};
pub use records::{RecordSet, extract_record_sets};
