pub mod chain;
pub mod include;
pub mod merged;
pub mod params;
pub mod query;
pub mod types;

pub use chain::ChainResolver;
pub use include::{IncludeDirective, IncludeResolver, IncludeSource, RevIncludeDirective};
pub use merged::{MergedResultProvider, ResultProvider, fetch_page};
pub use params::SearchParameterMap;
pub use query::{SearchQuery, SearchQueryBuilder};
pub use types::Prefix;
pub use types::date::{DateParam, DateValue};
pub use types::quantity::{QuantityParam, QuantityValue};
pub use types::reference::{ReferenceParam, ReferenceValue};
pub use types::string::StringParam;
pub use types::token::{TokenParam, TokenValue};
