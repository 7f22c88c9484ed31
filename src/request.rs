// Request builder: typed search criteria in, endpoint query parameters out.
// Everything here is pure; nothing touches the network.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::RequestError;

pub type QueryParams = BTreeMap<String, String>;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

pub const DEFAULT_TIME_FROM: &str = "00:00";
pub const DEFAULT_TIME_TO: &str = "23:59";

/// A date given either as an ISO string or as a calendar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Iso(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl DateInput {
    /// Normalizes to `YYYY-MM-DD`. Strings are validated, never passed through blindly.
    pub fn to_api_string(&self) -> Result<String, RequestError> {
        match self {
            DateInput::Iso(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map(|d| d.format(DATE_FORMAT).to_string())
                .map_err(|_| RequestError::InvalidDate(s.clone())),
            DateInput::Date(d) => Ok(d.format(DATE_FORMAT).to_string()),
            DateInput::DateTime(dt) => Ok(dt.date().format(DATE_FORMAT).to_string()),
        }
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Iso(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Iso(s)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(d: NaiveDate) -> Self {
        DateInput::Date(d)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(dt: NaiveDateTime) -> Self {
        DateInput::DateTime(dt)
    }
}

/// A time of day given either as an `HH:MM` string or a time value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeInput {
    Hm(String),
    Time(NaiveTime),
}

impl TimeInput {
    pub fn to_api_string(&self) -> Result<String, RequestError> {
        match self {
            TimeInput::Hm(s) => NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
                .map(|t| t.format(TIME_FORMAT).to_string())
                .map_err(|_| RequestError::InvalidTime(s.clone())),
            TimeInput::Time(t) => Ok(t.format(TIME_FORMAT).to_string()),
        }
    }
}

impl From<&str> for TimeInput {
    fn from(s: &str) -> Self {
        TimeInput::Hm(s.to_string())
    }
}

impl From<String> for TimeInput {
    fn from(s: String) -> Self {
        TimeInput::Hm(s)
    }
}

impl From<NaiveTime> for TimeInput {
    fn from(t: NaiveTime) -> Self {
        TimeInput::Time(t)
    }
}

/// Departure-time window; unrestricted by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: TimeInput,
    pub to: TimeInput,
}

impl TimeWindow {
    pub fn new(from: impl Into<TimeInput>, to: impl Into<TimeInput>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_FROM, DEFAULT_TIME_TO)
    }
}

/// Optional filters shared by both cheapest-fare searches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FareFilters {
    pub destination_country: Option<String>,
    pub destination_airport: Option<String>,
    pub max_price: Option<u32>,
    pub custom_params: QueryParams,
}

/// Criteria for the one-way cheapest-fares endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OneWaySearch {
    pub airport: String,
    pub date_from: DateInput,
    pub date_to: DateInput,
    pub departure_window: TimeWindow,
    pub filters: FareFilters,
}

impl OneWaySearch {
    pub fn new(
        airport: impl Into<String>,
        date_from: impl Into<DateInput>,
        date_to: impl Into<DateInput>,
    ) -> Self {
        Self {
            airport: airport.into(),
            date_from: date_from.into(),
            date_to: date_to.into(),
            departure_window: TimeWindow::default(),
            filters: FareFilters::default(),
        }
    }

    pub fn with_departure_window(mut self, window: TimeWindow) -> Self {
        self.departure_window = window;
        self
    }

    pub fn with_destination_country(mut self, country: impl Into<String>) -> Self {
        self.filters.destination_country = Some(country.into());
        self
    }

    pub fn with_destination_airport(mut self, airport: impl Into<String>) -> Self {
        self.filters.destination_airport = Some(airport.into());
        self
    }

    pub fn with_max_price(mut self, max_price: u32) -> Self {
        self.filters.max_price = Some(max_price);
        self
    }

    pub fn with_custom_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.custom_params.insert(key.into(), value.into());
        self
    }
}

/// Criteria for the round-trip cheapest-fares endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSearch {
    pub airport: String,
    pub date_from: DateInput,
    pub date_to: DateInput,
    pub return_date_from: DateInput,
    pub return_date_to: DateInput,
    pub outbound_window: TimeWindow,
    pub inbound_window: TimeWindow,
    pub filters: FareFilters,
}

impl ReturnSearch {
    pub fn new(
        airport: impl Into<String>,
        date_from: impl Into<DateInput>,
        date_to: impl Into<DateInput>,
        return_date_from: impl Into<DateInput>,
        return_date_to: impl Into<DateInput>,
    ) -> Self {
        Self {
            airport: airport.into(),
            date_from: date_from.into(),
            date_to: date_to.into(),
            return_date_from: return_date_from.into(),
            return_date_to: return_date_to.into(),
            outbound_window: TimeWindow::default(),
            inbound_window: TimeWindow::default(),
            filters: FareFilters::default(),
        }
    }

    pub fn with_outbound_window(mut self, window: TimeWindow) -> Self {
        self.outbound_window = window;
        self
    }

    pub fn with_inbound_window(mut self, window: TimeWindow) -> Self {
        self.inbound_window = window;
        self
    }

    pub fn with_destination_country(mut self, country: impl Into<String>) -> Self {
        self.filters.destination_country = Some(country.into());
        self
    }

    pub fn with_destination_airport(mut self, airport: impl Into<String>) -> Self {
        self.filters.destination_airport = Some(airport.into());
        self
    }

    pub fn with_max_price(mut self, max_price: u32) -> Self {
        self.filters.max_price = Some(max_price);
        self
    }

    pub fn with_custom_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.custom_params.insert(key.into(), value.into());
        self
    }
}

/// Criteria for the per-route, per-day availability endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilitySearch {
    pub origin: String,
    pub destination: String,
    pub date_out: DateInput,
    pub origin_is_mac: bool,
    pub destination_is_mac: bool,
    pub locale: Option<String>,
    pub custom_params: QueryParams,
}

impl AvailabilitySearch {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        date_out: impl Into<DateInput>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            date_out: date_out.into(),
            origin_is_mac: false,
            destination_is_mac: false,
            locale: None,
            custom_params: QueryParams::new(),
        }
    }

    pub fn with_origin_mac(mut self, is_mac: bool) -> Self {
        self.origin_is_mac = is_mac;
        self
    }

    pub fn with_destination_mac(mut self, is_mac: bool) -> Self {
        self.destination_is_mac = is_mac;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_custom_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_params.insert(key.into(), value.into());
        self
    }
}

/// Normalizes an IATA airport (or MAC) code for use as a URL path segment.
pub fn airport_code(raw: &str) -> Result<String, RequestError> {
    let code = raw.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(RequestError::InvalidAirport(raw.to_string()))
    }
}

fn insert(params: &mut QueryParams, key: &str, value: impl Into<String>) {
    params.insert(key.to_string(), value.into());
}

fn apply_filters(params: &mut QueryParams, currency: Option<&str>, filters: &FareFilters) {
    if let Some(currency) = currency {
        insert(params, "currency", currency);
    }
    if let Some(country) = &filters.destination_country {
        insert(params, "arrivalCountryCode", country.as_str());
    }
    if let Some(airport) = &filters.destination_airport {
        insert(params, "arrivalAirportIataCode", airport.as_str());
    }
    if let Some(max_price) = filters.max_price {
        insert(params, "priceValueTo", max_price.to_string());
    }
    // overrides go last so they win over everything computed above
    params.extend(filters.custom_params.clone());
}

pub fn one_way_params(search: &OneWaySearch, currency: Option<&str>) -> Result<QueryParams, RequestError> {
    let mut params = QueryParams::new();
    insert(&mut params, "departureAirportIataCode", search.airport.as_str());
    insert(&mut params, "outboundDepartureDateFrom", search.date_from.to_api_string()?);
    insert(&mut params, "outboundDepartureDateTo", search.date_to.to_api_string()?);
    insert(
        &mut params,
        "outboundDepartureTimeFrom",
        search.departure_window.from.to_api_string()?,
    );
    insert(
        &mut params,
        "outboundDepartureTimeTo",
        search.departure_window.to.to_api_string()?,
    );

    apply_filters(&mut params, currency, &search.filters);
    Ok(params)
}

pub fn return_params(search: &ReturnSearch, currency: Option<&str>) -> Result<QueryParams, RequestError> {
    let mut params = QueryParams::new();
    insert(&mut params, "departureAirportIataCode", search.airport.as_str());
    insert(&mut params, "outboundDepartureDateFrom", search.date_from.to_api_string()?);
    insert(&mut params, "outboundDepartureDateTo", search.date_to.to_api_string()?);
    insert(&mut params, "inboundDepartureDateFrom", search.return_date_from.to_api_string()?);
    insert(&mut params, "inboundDepartureDateTo", search.return_date_to.to_api_string()?);
    insert(
        &mut params,
        "outboundDepartureTimeFrom",
        search.outbound_window.from.to_api_string()?,
    );
    insert(
        &mut params,
        "outboundDepartureTimeTo",
        search.outbound_window.to.to_api_string()?,
    );
    insert(
        &mut params,
        "inboundDepartureTimeFrom",
        search.inbound_window.from.to_api_string()?,
    );
    insert(
        &mut params,
        "inboundDepartureTimeTo",
        search.inbound_window.to.to_api_string()?,
    );

    apply_filters(&mut params, currency, &search.filters);
    Ok(params)
}

// Single adult, no connections: the only combination the parser understands.
pub fn availability_params(search: &AvailabilitySearch) -> Result<QueryParams, RequestError> {
    let mut params = QueryParams::new();
    insert(&mut params, "ADT", "1");
    insert(&mut params, "TEEN", "0");
    insert(&mut params, "CHD", "0");
    insert(&mut params, "INF", "0");
    insert(&mut params, "DateOut", search.date_out.to_api_string()?);
    insert(&mut params, "DateIn", "");
    insert(&mut params, "Origin", search.origin.as_str());
    insert(&mut params, "Destination", search.destination.as_str());
    insert(&mut params, "OriginIsMac", search.origin_is_mac.to_string());
    insert(&mut params, "DestinationIsMac", search.destination_is_mac.to_string());
    insert(&mut params, "IncludeConnectingFlights", "false");
    insert(&mut params, "ToUs", "AGREED");

    params.extend(search.custom_params.clone());
    Ok(params)
}
