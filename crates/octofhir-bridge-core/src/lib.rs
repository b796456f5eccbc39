pub mod entity;
pub mod error;
pub mod id;
pub mod page;
pub mod reference;
pub mod resource;
pub mod time;
pub mod translate;

pub use entity::DomainEntity;
pub use error::{BridgeError, ErrorCategory, Result};
pub use id::generate_id;
pub use page::{PageConfig, PageRequest, PagedResult};
pub use reference::{
    EntityReference, UnresolvableReference, extract_references, parse_reference, values_at,
};
pub use resource::{FhirResource, resource_key};
pub use translate::{ContextAwareTranslator, Translator};
