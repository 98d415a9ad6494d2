//! Synchronous client core for the Postmaster shipping API.
//!
//! # Overview
//! Models shipments, packages and customs declarations, flattens them into
//! bracket-namespaced form parameters (`package[customs][contents][value]`),
//! and builds / parses the HTTP exchanges for the shipment lifecycle: create,
//! get, void, track, list and search.
//!
//! # Design
//! - `params` is the encoder: each record declares a static descriptor table
//!   (`Shape`) and the encoder walks it, honoring inclusion flags, wire-name
//!   overrides and zero-value omission.
//! - `PostmasterClient` is stateless and never touches the network; it splits
//!   every operation into `build_*` and `parse_*` (host-does-IO pattern).
//! - `Postmaster` pairs a client with a caller-supplied `Transport` and runs
//!   the full lifecycle. It is passed explicitly to every operation.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod session;
pub mod types;

pub use client::PostmasterClient;
pub use config::ClientConfig;
pub use error::{ApiError, EncodeError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use params::{
    encode, encode_with_prefix, form_encode, FieldDescriptor, FieldValue, Params, Record, Shape,
};
pub use session::Postmaster;
pub use types::{
    Address, Custom, CustomContent, Package, Shipment, ShipmentList, TrackingEvent,
    TrackingResponse, TrackingResult, NO_ID, VOIDED_STATUS,
};
