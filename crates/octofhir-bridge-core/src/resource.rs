//! Contract implemented by the resource-side representation of an entity.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// A FHIR-style resource produced and consumed by translators.
///
/// Resources must round-trip through JSON: patching works on the document
/// form and re-parses the result.
pub trait FhirResource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The resource type name, e.g. `"Encounter"`.
    fn type_name() -> &'static str;

    /// The resource identifier, absent for not-yet-created resources.
    fn id(&self) -> Option<&str>;

    /// Assigns the resource identifier.
    fn set_id(&mut self, id: String);
}

/// Returns the `(resourceType, id)` pair of a resource document when both
/// are present. Used to de-duplicate heterogeneous resource collections.
#[must_use]
pub fn resource_key(doc: &Value) -> Option<(String, String)> {
    let resource_type = doc.get("resourceType").and_then(Value::as_str)?;
    let id = doc.get("id").and_then(Value::as_str)?;
    Some((resource_type.to_string(), id.to_string()))
}
