// Public facade: request builder -> resilient transport -> response parser

use serde_json::Value;
use tracing::{error, info};

use crate::{
    airports,
    config::ClientConfig,
    error::{ApiError, ClientError},
    model::{Flight, Trip},
    parser,
    request::{self, AvailabilitySearch, OneWaySearch, QueryParams, ReturnSearch},
    retry::{CircuitBreaker, RetryPolicy},
    transport::{HttpTransport, ReqwestTransport, ResilientTransport},
};

/// Client for the airline's public fare-finder and availability APIs.
///
/// Fare searches never fail: transport exhaustion, malformed payloads and bad
/// input are logged and come back as an empty list. Metadata lookups return
/// the raw JSON and propagate errors.
pub struct Ryanair {
    config: ClientConfig,
    transport: ResilientTransport,
}

impl Ryanair {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, transport)
    }

    /// Builds a client on top of a caller-supplied transport, with the retry
    /// policy derived from `config.retry`.
    pub fn with_transport(config: ClientConfig, transport: impl HttpTransport) -> Result<Self, ClientError> {
        let retry_policy = RetryPolicy::from_config(&config.retry);
        Self::with_transport_and_policy(config, transport, retry_policy)
    }

    pub fn with_transport_and_policy(
        config: ClientConfig,
        transport: impl HttpTransport,
        retry_policy: RetryPolicy,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        if retry_policy.max_attempts == 0 {
            return Err(ClientError::ConfigError(
                "retry policy needs at least one attempt".to_string(),
            ));
        }

        let circuit_breaker = config.circuit_breaker.as_ref().map(CircuitBreaker::new);
        let transport = ResilientTransport::new(transport, retry_policy, circuit_breaker);

        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of physical HTTP attempts made by this client, retries included.
    pub fn num_queries(&self) -> usize {
        self.transport.num_queries()
    }

    /// Cheapest one-way fare per destination and day in the date range.
    pub async fn get_cheapest_flights(&self, search: &OneWaySearch) -> Vec<Flight> {
        let url = self.services_url("oneWayFares");
        let currency = self.config.currency.as_deref();

        let result = async {
            let params = request::one_way_params(search, currency)?;
            let payload = self.transport.query(&url, &params).await?;
            Ok::<_, ApiError>(parser::parse_one_way(payload, currency)?)
        }
        .await;

        degrade_to_empty(&url, result)
    }

    /// Cheapest outbound/inbound combinations per destination.
    pub async fn get_cheapest_return_flights(&self, search: &ReturnSearch) -> Vec<Trip> {
        let url = self.services_url("roundTripFares");
        let currency = self.config.currency.as_deref();

        let result = async {
            let params = request::return_params(search, currency)?;
            let payload = self.transport.query(&url, &params).await?;
            Ok::<_, ApiError>(parser::parse_round_trip(payload, currency)?)
        }
        .await;

        degrade_to_empty(&url, result)
    }

    /// Every flight on one route and day, sold-out ones included (priced at
    /// [`crate::model::UNBOOKABLE`]).
    pub async fn get_all_flights(&self, search: &AvailabilitySearch) -> Vec<Flight> {
        let locale = search.locale.as_deref().unwrap_or(&self.config.locale);
        let url = format!("{}{}/availability", self.config.availability_api_url, locale);

        let result = async {
            let params = request::availability_params(search)?;
            let payload = self.transport.query(&url, &params).await?;
            Ok::<_, ApiError>(parser::parse_availability(payload)?)
        }
        .await;

        degrade_to_empty(&url, result)
    }

    /// Airport autocomplete by free-text phrase.
    pub async fn get_airport_info(&self, phrase: &str) -> Result<Value, ApiError> {
        let url = format!("{}locate/v1/autocomplete/airports", self.config.locate_api_url);
        let mut params = QueryParams::new();
        params.insert("phrase".to_string(), phrase.to_string());
        params.insert("market".to_string(), self.config.market.clone());

        self.transport.query(&url, &params).await
    }

    pub async fn get_active_airports(&self) -> Result<Value, ApiError> {
        let url = format!(
            "{}views/locate/5/airports/{}/active",
            self.config.locate_api_url,
            self.language()
        );
        self.transport.query(&url, &QueryParams::new()).await
    }

    pub async fn get_countries(&self) -> Result<Value, ApiError> {
        let url = format!(
            "{}views/locate/5/countries/{}",
            self.config.locate_api_url,
            self.language()
        );
        self.transport.query(&url, &QueryParams::new()).await
    }

    /// Dates with at least one scheduled flight from `origin` to `destination`.
    pub async fn get_available_flight_dates(&self, origin: &str, destination: &str) -> Result<Value, ApiError> {
        let origin = request::airport_code(origin)?;
        let destination = request::airport_code(destination)?;
        let url = self.services_url(&format!("oneWayFares/{origin}/{destination}/availabilities"));
        self.transport.query(&url, &QueryParams::new()).await
    }

    /// Airports in a country from the built-in table; no network call.
    pub fn get_airports_by_country<S: AsRef<str>>(country_code: &str, exclude_airports: &[S]) -> Vec<String> {
        airports::airports_by_country(country_code, exclude_airports)
    }

    fn services_url(&self, path: &str) -> String {
        format!("{}{}", self.config.services_api_url, path)
    }

    // "en-ie" -> "en"
    fn language(&self) -> &str {
        self.config
            .locale
            .split('-')
            .next()
            .filter(|lang| !lang.is_empty())
            .unwrap_or("en")
    }
}

fn degrade_to_empty<T>(url: &str, result: Result<Vec<T>, ApiError>) -> Vec<T> {
    match result {
        Ok(items) => {
            info!(url, results = items.len(), "search completed");
            items
        }
        Err(err) => {
            error!(url, "failed to get results, returning none: {err}");
            Vec::new()
        }
    }
}
