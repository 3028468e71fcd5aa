pub mod service;
pub mod source;

pub use service::PriceService;
pub use source::{build_source, PriceSource, RawPriceList, SourceError};
