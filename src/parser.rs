// Response parser: raw endpoint payloads into Flight / Trip values

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::{
    error::ParseError,
    model::{Flight, FlightFields, Trip, UNBOOKABLE},
};

// Data structures for the cheapest-fares payloads (oneWayFares / roundTripFares)
#[derive(Debug, Deserialize)]
pub struct FaresResponse {
    #[serde(default)]
    pub fares: Option<Vec<RawFare>>,
}

impl FaresResponse {
    fn into_fares(self) -> Result<Vec<RawFare>, ParseError> {
        self.fares
            .ok_or_else(|| ParseError::MissingField("fares".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct RawFare {
    pub outbound: RawFareLeg,
    #[serde(default)]
    pub inbound: Option<RawFareLeg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFareLeg {
    pub departure_airport: RawAirport,
    pub arrival_airport: RawAirport,
    pub departure_date: String,
    pub flight_number: String,
    pub price: RawPrice,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAirport {
    pub iata_code: String,
    pub name: String,
    pub country_name: String,
}

impl RawAirport {
    fn full_name(&self) -> String {
        format!("{}, {}", self.name, self.country_name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPrice {
    pub value: f64,
    #[serde(default)]
    pub currency_code: Option<String>,
}

// Data structures for the availability payload
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub trips: Vec<RawTrip>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrip {
    pub origin_name: String,
    pub destination_name: String,
    #[serde(default)]
    pub dates: Vec<RawDate>,
}

#[derive(Debug, Deserialize)]
pub struct RawDate {
    #[serde(default)]
    pub flights: Vec<RawAvailabilityFlight>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAvailabilityFlight {
    pub fares_left: i64,
    pub flight_number: String,
    pub time: Vec<String>,
    pub segments: Vec<RawSegment>,
    #[serde(default)]
    pub regular_fare: Option<RawRegularFare>,
}

#[derive(Debug, Deserialize)]
pub struct RawSegment {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct RawRegularFare {
    #[serde(default)]
    pub fares: Vec<RawAmount>,
}

#[derive(Debug, Deserialize)]
pub struct RawAmount {
    pub amount: f64,
}

/// Parses a oneWayFares payload. An empty `fares` list is an empty result; a
/// payload without the key (an error body, typically) is a parse error.
pub fn parse_one_way(payload: Value, requested_currency: Option<&str>) -> Result<Vec<Flight>, ParseError> {
    let response: FaresResponse = serde_json::from_value(payload)?;
    let mut currency_check = CurrencyCheck::new(requested_currency);

    response
        .into_fares()?
        .into_iter()
        .map(|fare| parse_fare_leg(fare.outbound, &mut currency_check))
        .collect()
}

/// Parses a roundTripFares payload into trips.
pub fn parse_round_trip(payload: Value, requested_currency: Option<&str>) -> Result<Vec<Trip>, ParseError> {
    let response: FaresResponse = serde_json::from_value(payload)?;
    let mut currency_check = CurrencyCheck::new(requested_currency);

    response
        .into_fares()?
        .into_iter()
        .map(|fare| {
            let inbound = fare
                .inbound
                .ok_or_else(|| ParseError::MissingField("fares[].inbound".to_string()))?;
            let outbound = parse_fare_leg(fare.outbound, &mut currency_check)?;
            let inbound = parse_fare_leg(inbound, &mut currency_check)?;
            Ok(Trip::new(outbound, inbound))
        })
        .collect()
}

/// Parses an availability payload. Sold-out flights are kept, priced at the
/// unbookable sentinel.
pub fn parse_availability(payload: Value) -> Result<Vec<Flight>, ParseError> {
    let response: AvailabilityResponse = serde_json::from_value(payload)?;

    let trip = response
        .trips
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::MissingField("trips[0]".to_string()))?;
    let date = trip
        .dates
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::MissingField("trips[0].dates[0]".to_string()))?;

    date.flights
        .into_iter()
        .map(|flight| parse_availability_flight(flight, &trip.origin_name, &trip.destination_name))
        .collect()
}

fn parse_fare_leg(leg: RawFareLeg, currency_check: &mut CurrencyCheck) -> Result<Flight, ParseError> {
    if let Some(reported) = leg.price.currency_code.as_deref() {
        currency_check.observe(reported);
    }

    let flight = Flight::new(FlightFields {
        departure_time: parse_datetime(&leg.departure_date)?,
        flight_number: format_flight_number(&leg.flight_number),
        price: leg.price.value,
        currency: leg.price.currency_code,
        origin_full: leg.departure_airport.full_name(),
        origin: leg.departure_airport.iata_code,
        destination_full: leg.arrival_airport.full_name(),
        destination: leg.arrival_airport.iata_code,
    })?;

    Ok(flight)
}

fn parse_availability_flight(
    flight: RawAvailabilityFlight,
    origin_full: &str,
    destination_full: &str,
) -> Result<Flight, ParseError> {
    let departure = flight
        .time
        .first()
        .ok_or_else(|| ParseError::MissingField("flights[].time[0]".to_string()))?;
    let segment = flight
        .segments
        .first()
        .ok_or_else(|| ParseError::MissingField("flights[].segments[0]".to_string()))?;

    let price = if flight.fares_left == 0 {
        UNBOOKABLE
    } else {
        match flight
            .regular_fare
            .as_ref()
            .and_then(|regular| regular.fares.first())
        {
            Some(fare) => fare.amount,
            None => {
                warn!(
                    flight_number = %flight.flight_number,
                    fares_left = flight.fares_left,
                    "seats reported but no regular fare listed, treating as unbookable"
                );
                UNBOOKABLE
            }
        }
    };

    let parsed = Flight::new(FlightFields {
        departure_time: parse_datetime(departure)?,
        flight_number: flight.flight_number.clone(),
        price,
        currency: None,
        origin: segment.origin.clone(),
        origin_full: origin_full.to_string(),
        destination: segment.destination.clone(),
        destination_full: destination_full.to_string(),
    })?;

    Ok(parsed)
}

/// Departure timestamps are local to the origin airport. Offsets, when the
/// API includes one, are dropped rather than converted.
fn parse_datetime(raw: &str) -> Result<NaiveDateTime, ParseError> {
    raw.parse::<NaiveDateTime>()
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.naive_local()))
        .map_err(|_| ParseError::InvalidValue(format!("departure time {raw:?}")))
}

/// `FR1234` -> `FR 1234`. Already spaced or too-short numbers pass through.
pub fn format_flight_number(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains(' ') {
        return raw.to_string();
    }
    match raw.char_indices().nth(2) {
        Some((idx, _)) => format!("{} {}", &raw[..idx], &raw[idx..]),
        None => raw.to_string(),
    }
}

// Warns once per response when the API priced fares in another currency.
struct CurrencyCheck<'a> {
    requested: Option<&'a str>,
    reported: bool,
}

impl<'a> CurrencyCheck<'a> {
    fn new(requested: Option<&'a str>) -> Self {
        Self {
            requested,
            reported: false,
        }
    }

    fn observe(&mut self, actual: &str) {
        if let Some(requested) = self.requested {
            if !self.reported && !requested.eq_ignore_ascii_case(actual) {
                warn!(
                    requested,
                    actual, "API returned fares in a different currency than requested, using {actual}"
                );
                self.reported = true;
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_parse_one_way_fares() {
        let payload = json!({"fares": [{"outbound": fare_leg("DUB", "BGY", "2025-04-02T09:05:00", "FR2417", 19.99, "EUR")}]});
        let flights = parse_one_way(payload, Some("EUR")).unwrap();

        assert_eq!(flights.len(), 1);
        let f = &flights[0];
        assert_eq!(f.origin(), "DUB");
        assert_eq!(f.origin_full(), "DUB Airport, Ireland");
        assert_eq!(f.destination(), "BGY");
        assert_eq!(f.destination_full(), "BGY Airport, Italy");
        assert_eq!(f.flight_number(), "FR 2417");
        assert_eq!(f.price(), 19.99);
        assert_eq!(f.currency(), Some("EUR"));
        assert_eq!(f.departure_time().to_string(), "2025-04-02 09:05:00");
    }

    #[test]
    fn test_empty_fares_is_empty_result() {
        assert!(parse_one_way(json!({"fares": []}), None).unwrap().is_empty());
        assert!(parse_round_trip(json!({"fares": [], "size": 0}), None).unwrap().is_empty());
    }

    #[test]
    fn test_missing_fares_key_is_a_parse_error() {
        let error_body = json!({"code": "InternalError", "message": "Something went wrong"});
        assert!(matches!(
            parse_one_way(error_body.clone(), None),
            Err(ParseError::MissingField(field)) if field == "fares"
        ));
        assert!(matches!(
            parse_one_way(json!({"fares": null}), None),
            Err(ParseError::MissingField(_))
        ));
        assert!(matches!(
            parse_round_trip(error_body, None),
            Err(ParseError::MissingField(_))
        ));
    }

    #[test]
    fn test_round_trip_total_and_currency() {
        let trips = parse_round_trip(dub_round_trip(), Some("EUR")).unwrap();

        assert_eq!(trips.len(), 1);
        let trip = &trips[0];
        assert_eq!(trip.total_price(), 75.50);
        assert_eq!(trip.outbound().currency(), Some("EUR"));
        assert_eq!(trip.inbound().currency(), Some("EUR"));
        assert_eq!(trip.inbound().origin(), "BGY");
    }

    #[test]
    fn test_currency_mismatch_uses_reported_currency() {
        let payload = json!({"fares": [{"outbound": fare_leg("STN", "DUB", "2025-04-02T09:05:00", "FR202", 25.0, "GBP")}]});
        let flights = parse_one_way(payload, Some("EUR")).unwrap();
        assert_eq!(flights[0].currency(), Some("GBP"));
    }

    fn warnings_while_parsing(payload: Value, requested: &str) -> usize {
        let warnings = LevelCounter::new(Level::WARN);
        let subscriber = tracing_subscriber::registry().with(warnings.clone());
        tracing::subscriber::with_default(subscriber, || {
            parse_one_way(payload, Some(requested)).unwrap();
        });
        warnings.count()
    }

    #[test]
    fn test_currency_mismatch_warns_once_per_response() {
        let two_gbp_fares = json!({"fares": [
            {"outbound": fare_leg("STN", "DUB", "2025-04-02T09:05:00", "FR202", 25.0, "GBP")},
            {"outbound": fare_leg("STN", "ORK", "2025-04-02T11:40:00", "FR208", 31.0, "GBP")}
        ]});
        assert_eq!(warnings_while_parsing(two_gbp_fares.clone(), "EUR"), 1);
        assert_eq!(warnings_while_parsing(two_gbp_fares.clone(), "gbp"), 0);

        // a second response warns again
        assert_eq!(warnings_while_parsing(two_gbp_fares, "EUR"), 1);
    }

    #[test]
    fn test_round_trip_without_inbound_is_a_parse_error() {
        let payload = json!({"fares": [{"outbound": fare_leg("DUB", "BGY", "2025-04-02T09:05:00", "FR2417", 19.99, "EUR")}]});
        assert!(matches!(
            parse_round_trip(payload, None),
            Err(ParseError::MissingField(_))
        ));
    }

    #[test]
    fn test_structural_errors() {
        let missing_price = json!({"fares": [{"outbound": {"flightNumber": "FR1"}}]});
        assert!(matches!(parse_one_way(missing_price, None), Err(ParseError::Json(_))));

        let bad_date = json!({"fares": [{"outbound": fare_leg("DUB", "BGY", "tomorrow", "FR1", 1.0, "EUR")}]});
        assert!(matches!(parse_one_way(bad_date, None), Err(ParseError::InvalidValue(_))));

        let negative = json!({"fares": [{"outbound": fare_leg("DUB", "BGY", "2025-04-02T09:05:00", "FR1", -3.0, "EUR")}]});
        assert!(matches!(parse_one_way(negative, None), Err(ParseError::Model(_))));
    }

    #[test]
    fn test_availability_prices_and_sold_out_sentinel() {
        let payload = availability(json!([
            availability_flight("FR 202", 5, json!({"fares": [{"type": "ADT", "amount": 39.99}]})),
            availability_flight("FR 204", 0, json!({"fares": [{"type": "ADT", "amount": 12.0}]})),
            availability_flight("FR 206", 0, Value::Null),
        ]));
        let flights = parse_availability(payload).unwrap();

        assert_eq!(flights.len(), 3);
        assert_eq!(flights[0].price(), 39.99);
        assert_eq!(flights[0].flight_number(), "FR 202");
        assert_eq!(flights[0].origin_full(), "Dublin");
        assert_eq!(flights[0].destination_full(), "London Stansted");
        assert_eq!(flights[0].currency(), None);
        assert_eq!(flights[0].departure_time().to_string(), "2025-04-02 06:30:00");

        assert_eq!(flights[1].price(), UNBOOKABLE);
        assert!(!flights[1].is_bookable());
        assert_eq!(flights[2].price(), UNBOOKABLE);
    }

    #[test]
    fn test_availability_seats_left_but_no_fare_is_unbookable() {
        let payload = availability(json!([availability_flight("FR 208", -1, json!({"fares": []}))]));
        let flights = parse_availability(payload).unwrap();
        assert_eq!(flights[0].price(), UNBOOKABLE);
    }

    #[test]
    fn test_availability_without_trips_is_an_error() {
        assert!(matches!(
            parse_availability(json!({"trips": []})),
            Err(ParseError::MissingField(_))
        ));
        assert!(parse_availability(availability(json!([]))).unwrap().is_empty());
    }

    #[test]
    fn test_format_flight_number() {
        assert_eq!(format_flight_number("FR1234"), "FR 1234");
        assert_eq!(format_flight_number("FR 1234"), "FR 1234");
        assert_eq!(format_flight_number("RK45"), "RK 45");
        assert_eq!(format_flight_number("FR"), "FR");
    }

    #[test]
    fn test_departure_time_with_offset_keeps_local_clock() {
        let dt = parse_datetime("2025-04-02T06:30:00+01:00").unwrap();
        assert_eq!(dt.to_string(), "2025-04-02 06:30:00");
    }
}
