//! Shipment lifecycle operations over a caller-supplied transport.
//!
//! # Design
//! `Postmaster` pairs a `PostmasterClient` with a `Transport` and is passed
//! explicitly to every lifecycle call; records never hold a reference back to
//! the session that produced them. Each operation is build, execute, parse.
//! A failed precondition returns before the transport is touched.

use tracing::{debug, warn};

use crate::client::PostmasterClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{Shipment, ShipmentList, TrackingResponse, VOIDED_STATUS};

/// Client and transport bundled together.
#[derive(Debug, Clone)]
pub struct Postmaster<T> {
    client: PostmasterClient,
    transport: T,
}

impl<T: Transport> Postmaster<T> {
    pub fn new(client: PostmasterClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &PostmasterClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// A fresh shipment with no id, ready to be filled in and created.
    pub fn new_shipment(&self) -> Shipment {
        Shipment::new()
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    /// Create `shipment` on the server and merge the server's copy into it.
    pub fn create_shipment(&self, shipment: &mut Shipment) -> Result<(), ApiError> {
        let request = self.client.build_create_shipment(shipment)?;
        let response = self.send(request)?;
        self.client.parse_shipment_into(response, shipment)?;
        Ok(())
    }

    /// Reload `shipment` from the server. Fields the server omits keep their
    /// local values.
    pub fn get_shipment(&self, shipment: &mut Shipment) -> Result<(), ApiError> {
        let request = self.client.build_get_shipment(shipment.id)?;
        let response = self.send(request)?;
        self.client.parse_shipment_into(response, shipment)?;
        Ok(())
    }

    /// Fetch a shipment by id.
    pub fn shipment(&self, id: i64) -> Result<Shipment, ApiError> {
        let request = self.client.build_get_shipment(id)?;
        self.client.parse_shipment(self.send(request)?)
    }

    /// Void `shipment`.
    ///
    /// `Ok(true)` means the server acknowledged and `shipment.status` is now
    /// `"Voided"`. `Ok(false)` means the server answered with some other
    /// message; the status is left alone. `Err` is a precondition, transport
    /// or decoding failure, also without touching the status.
    pub fn void_shipment(&self, shipment: &mut Shipment) -> Result<bool, ApiError> {
        let request = self.client.build_void_shipment(shipment.id)?;
        let voided = self.client.parse_void(self.send(request)?)?;
        if voided {
            shipment.status = VOIDED_STATUS.to_string();
        } else {
            warn!(id = shipment.id, "void was not acknowledged");
        }
        Ok(voided)
    }

    pub fn track_shipment(&self, shipment: &Shipment) -> Result<TrackingResponse, ApiError> {
        let request = self.client.build_track_shipment(shipment.id)?;
        self.client.parse_tracking(self.send(request)?)
    }

    /// Track by carrier tracking number alone.
    pub fn track_reference(&self, tracking_number: &str) -> Result<TrackingResponse, ApiError> {
        let request = self.client.build_track_reference(tracking_number)?;
        self.client.parse_tracking(self.send(request)?)
    }

    pub fn list_shipments(
        &self,
        limit: u32,
        cursor: &str,
        status: &str,
    ) -> Result<ShipmentList, ApiError> {
        let request = self.client.build_list_shipments(limit, cursor, status);
        self.client.parse_shipment_list(self.send(request)?)
    }

    pub fn find_shipments(
        &self,
        query: &str,
        limit: u32,
        cursor: &str,
    ) -> Result<ShipmentList, ApiError> {
        let request = self.client.build_find_shipments(query, limit, cursor)?;
        self.client.parse_shipment_list(self.send(request)?)
    }
}
