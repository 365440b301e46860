//! Downstream search backend clients

pub mod upstream;

pub use upstream::UpstreamSearchService;
