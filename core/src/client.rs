//! Stateless HTTP request builder and response parser for the shipments API.
//!
//! # Design
//! `PostmasterClient` holds only the resolved base URL and API version and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. Preconditions (sentinel ids, empty queries) are
//! checked in `build_*`, before any parameter is encoded.

use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, FORM_CONTENT_TYPE};
use crate::params::{encode, form_encode, Params, QueryParams};
use crate::types::{Shipment, ShipmentList, TrackingResponse, VoidResponse, NO_ID};

/// Message the server answers with when a void succeeds.
pub const VOID_OK_MESSAGE: &str = "OK";

/// Synchronous, stateless client for the shipments API.
#[derive(Debug, Clone)]
pub struct PostmasterClient {
    base_url: String,
    api_version: String,
}

impl Default for PostmasterClient {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl PostmasterClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.resolved_base_url().to_string(),
            api_version: config.api_version.clone(),
        }
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self::new(&ClientConfig::new().base_url(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of `endpoint`: `{base_url}/{version}/{endpoint}`.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, endpoint)
    }

    fn request(&self, method: HttpMethod, endpoint: &str, query: &Params) -> HttpRequest {
        let mut url = self.url(endpoint);
        let query = form_encode(query);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        HttpRequest {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_shipment(&self, shipment: &Shipment) -> Result<HttpRequest, ApiError> {
        if shipment.has_id() {
            debug!(id = shipment.id, "refusing to create an existing shipment");
            return Err(ApiError::AlreadyCreated(shipment.id));
        }
        let params = encode(shipment)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url("shipments"),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(form_encode(&params)),
        })
    }

    pub fn build_get_shipment(&self, id: i64) -> Result<HttpRequest, ApiError> {
        let id = require_id(id)?;
        Ok(self.request(HttpMethod::Get, &format!("shipments/{id}"), &Params::new()))
    }

    pub fn build_void_shipment(&self, id: i64) -> Result<HttpRequest, ApiError> {
        let id = require_id(id)?;
        Ok(self.request(HttpMethod::Delete, &format!("shipments/{id}/void"), &Params::new()))
    }

    pub fn build_track_shipment(&self, id: i64) -> Result<HttpRequest, ApiError> {
        let id = require_id(id)?;
        Ok(self.request(HttpMethod::Get, &format!("shipments/{id}/track"), &Params::new()))
    }

    /// Track by carrier tracking number, without a shipment id.
    pub fn build_track_reference(&self, tracking_number: &str) -> Result<HttpRequest, ApiError> {
        if tracking_number.is_empty() {
            return Err(ApiError::MissingTrackingNumber);
        }
        let query = QueryParams::new().text("tracking", tracking_number).into_params();
        Ok(self.request(HttpMethod::Get, "track", &query))
    }

    /// Only non-default arguments are sent: a zero `limit` or an empty
    /// `cursor` / `status` is left out of the query.
    pub fn build_list_shipments(&self, limit: u32, cursor: &str, status: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "shipments", &list_query(limit, cursor, status))
    }

    pub fn build_find_shipments(
        &self,
        query: &str,
        limit: u32,
        cursor: &str,
    ) -> Result<HttpRequest, ApiError> {
        if query.is_empty() {
            debug!("refusing to search without a query");
            return Err(ApiError::EmptyQuery);
        }
        let params = QueryParams::new()
            .text("q", query)
            .count("limit", limit)
            .text("cursor", cursor)
            .into_params();
        Ok(self.request(HttpMethod::Get, "shipments/search", &params))
    }

    /// Parse a single shipment, as returned by create and get.
    pub fn parse_shipment(&self, response: HttpResponse) -> Result<Shipment, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    /// Decode a create/get response over `shipment`.
    ///
    /// Fields the response carries overwrite the local ones; fields it omits
    /// or sends as `null` keep their current value. On error `shipment` is
    /// left untouched.
    pub fn parse_shipment_into(
        &self,
        response: HttpResponse,
        shipment: &mut Shipment,
    ) -> Result<(), ApiError> {
        check_status(&response)?;
        let patch: Value = decode(&response)?;
        let mut merged = serde_json::to_value(&*shipment).map_err(deserialization_error)?;
        overlay(&mut merged, patch);
        *shipment = serde_json::from_value(merged).map_err(deserialization_error)?;
        Ok(())
    }

    pub fn parse_shipment_list(&self, response: HttpResponse) -> Result<ShipmentList, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_tracking(&self, response: HttpResponse) -> Result<TrackingResponse, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    /// `true` only when the server acknowledged with `"OK"`. Any other
    /// message is a refusal, not an error.
    pub fn parse_void(&self, response: HttpResponse) -> Result<bool, ApiError> {
        check_status(&response)?;
        let body: VoidResponse = decode(&response)?;
        Ok(body.message == VOID_OK_MESSAGE)
    }
}

/// Query parameters for a shipment listing.
pub fn list_query(limit: u32, cursor: &str, status: &str) -> Params {
    QueryParams::new()
        .count("limit", limit)
        .text("cursor", cursor)
        .text("status", status)
        .into_params()
}

fn require_id(id: i64) -> Result<i64, ApiError> {
    if id == NO_ID {
        debug!("refusing an id-bound operation without a shipment id");
        return Err(ApiError::MissingId);
    }
    Ok(id)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(deserialization_error)
}

fn deserialization_error(e: serde_json::Error) -> ApiError {
    ApiError::DeserializationError(e.to_string())
}

/// Write `patch` over `base`. Objects merge key by key, `null` is skipped and
/// anything else replaces the old value.
fn overlay(base: &mut Value, patch: Value) {
    match (base, patch) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None if !value.is_null() => {
                        base.insert(key, value);
                    }
                    None => {}
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
