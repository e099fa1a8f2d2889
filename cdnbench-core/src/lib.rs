mod http;

pub mod catalog;
pub mod runner;

pub use catalog::{
    BASE_SIZE, TrafficPhase, TrafficScenario, builtin_scenario, builtin_scenarios,
    load_scenarios, scenario_slug, target_url,
};
pub use http::{
    Error as HttpError, HttpClient, HttpClientConfig, HttpRequest, HttpResponse,
    HttpTransportErrorKind, Result as HttpResult,
};
