// Domain model: immutable flight and round-trip values built from parsed responses

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::error::ModelError;

/// Price of a flight that was found but has no seats left.
pub const UNBOOKABLE: f64 = f64::INFINITY;

/// One directional journey segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flight {
    departure_time: NaiveDateTime,
    flight_number: String,
    price: f64,
    currency: Option<String>,
    origin: String,
    origin_full: String,
    destination: String,
    destination_full: String,
}

/// Owned string fields of a [`Flight`], grouped so construction reads as a
/// struct literal rather than a long positional argument list.
#[derive(Debug, Clone, Default)]
pub struct FlightFields {
    pub departure_time: NaiveDateTime,
    pub flight_number: String,
    pub price: f64,
    pub currency: Option<String>,
    pub origin: String,
    pub origin_full: String,
    pub destination: String,
    pub destination_full: String,
}

impl Flight {
    /// Builds a flight, rejecting negative or NaN prices. `+inf` is accepted
    /// as the unbookable marker.
    pub fn new(fields: FlightFields) -> Result<Self, ModelError> {
        if fields.price.is_nan() || fields.price < 0.0 {
            return Err(ModelError::InvalidPrice(fields.price));
        }

        Ok(Self {
            departure_time: fields.departure_time,
            flight_number: fields.flight_number,
            price: fields.price,
            currency: fields.currency,
            origin: fields.origin,
            origin_full: fields.origin_full,
            destination: fields.destination,
            destination_full: fields.destination_full,
        })
    }

    pub fn departure_time(&self) -> NaiveDateTime {
        self.departure_time
    }

    pub fn flight_number(&self) -> &str {
        &self.flight_number
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn origin_full(&self) -> &str {
        &self.origin_full
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn destination_full(&self) -> &str {
        &self.destination_full
    }

    /// False when the availability search reported zero seats.
    pub fn is_bookable(&self) -> bool {
        self.price.is_finite()
    }
}

/// A round trip: exactly one outbound and one inbound flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    total_price: f64,
    outbound: Flight,
    inbound: Flight,
}

impl Trip {
    pub fn new(outbound: Flight, inbound: Flight) -> Self {
        Self {
            total_price: outbound.price + inbound.price,
            outbound,
            inbound,
        }
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn outbound(&self) -> &Flight {
        &self.outbound
    }

    pub fn inbound(&self) -> &Flight {
        &self.inbound
    }

    /// Time between outbound and inbound departure.
    pub fn duration(&self) -> Duration {
        self.inbound.departure_time - self.outbound.departure_time
    }
}
