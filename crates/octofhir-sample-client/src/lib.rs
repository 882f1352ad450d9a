//! Sample FHIR search client.
//!
//! Searches a FHIR server for `Patient` resources by last name in repeated
//! passes and reports the average response time of each pass, with the last
//! pass forcing caches off through request headers.
//!
//! ```text
//! names file ──► BatchRunner ──► SearchClient ──► FHIR server
//!                    │              │
//!                    │         interceptors (logging, response time, cache control)
//!                    ▼
//!               Presenter / pass reports
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod model;
pub mod names;
pub mod observability;
pub mod output;
pub mod runner;

pub use client::{CachingMode, ResourceSearch, SearchClient, SearchClientBuilder};
pub use config::SampleConfig;
pub use error::{Result, SampleError};
pub use interceptor::{
    CacheControlInterceptor, ClientInterceptor, Exchange, InterceptorChain, LoggingInterceptor,
    ResponseTimeInterceptor,
};
pub use model::{Bundle, BundleEntry, EntryResource, HumanName, Patient, PatientRow};
pub use output::{OutputFormat, Presenter};
pub use runner::{BatchPlan, BatchRunner, PassReport, StatScope};
