//! Typed marshalling layer for statement-based data services.
//!
//! Translates between native application values and the tagged-union wire
//! format of a remote relational-query service that accepts SQL text plus
//! named, typed parameters and returns rows as parallel arrays of tagged
//! values alongside column metadata.
//!
//! The crate covers:
//! - Parameter encoding: [`Value`] → tagged wire [`Parameter`]s, including
//!   type hints for ambiguous string payloads (`DECIMAL`, `DATE`,
//!   `TIMESTAMP`, `JSON`)
//! - Result decoding: column metadata → [`ResultShape`] with collision-free
//!   field names, plus a pluggable [`ConverterRegistry`] normalizing
//!   domain-shaped values (JSON blobs, timestamps, numerics)
//! - [`QueryService`]: execution, `LIMIT`/`OFFSET` pagination, and
//!   transaction sequencing over an external [`DataService`] collaborator
//!
//! Transport, authentication, and connection management are out of scope:
//! the service behind [`DataService`] is consumed, never implemented here.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod convert;
pub mod decode;
pub mod encode;
pub mod error;
pub mod shape;
pub mod value;
pub mod wire;

pub use client::{
    DataService, QueryOutput, QueryResponse, QueryService, StatementOutcome, Transaction,
    DEFAULT_PAGE_SIZE,
};
pub use convert::{Converter, ConverterRegistry};
pub use decode::{Record, RecordDecoder};
pub use encode::{encode_list, encode_map, encode_specs, ParamBuilder, ParamSpec};
pub use error::{ConvertError, Error, Result};
pub use shape::{ColumnMetadata, ResultShape};
pub use value::Value;
pub use wire::{Parameter, StatementRequest, StatementResponse, WireColumn, WireValue};
