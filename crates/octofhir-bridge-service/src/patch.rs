//! Patch application in the three supported wire formats.
//!
//! All formats share the same contract: the input document is never
//! modified, identity fields (`id`, `resourceType`) are protected, and a
//! failing operation aborts the whole patch.

use json_patch::{Patch, PatchOperation, patch};
use octofhir_bridge_core::{BridgeError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::Value;

const PROTECTED_POINTERS: &[&str] = &["/id", "/resourceType"];

/// The wire formats a patch body may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchFormat {
    /// RFC 6902 operation list, `application/json-patch+json`.
    JsonPatch,
    /// RFC 7386 merge document, `application/merge-patch+json`.
    MergePatch,
    /// XML diff document, `application/xml-patch+xml`.
    XmlPatch,
}

impl PatchFormat {
    /// Picks the format from a content type header value. Parameters
    /// after `;` are ignored. Unknown content types are `NotSupported`.
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json-patch+json" => Ok(Self::JsonPatch),
            "application/merge-patch+json" => Ok(Self::MergePatch),
            "application/xml-patch+xml" => Ok(Self::XmlPatch),
            other => Err(BridgeError::not_supported(format!(
                "unsupported patch content type '{other}'"
            ))),
        }
    }
}

/// Applies `body` to `resource` in the given format and returns the
/// patched document.
pub fn apply(format: PatchFormat, resource: &Value, body: &str) -> Result<Value> {
    match format {
        PatchFormat::JsonPatch => apply_json_patch(resource, body),
        PatchFormat::MergePatch => apply_merge_patch(resource, body),
        PatchFormat::XmlPatch => apply_xml_patch(resource, body),
    }
}

fn apply_json_patch(resource: &Value, body: &str) -> Result<Value> {
    let operations: Patch = serde_json::from_str(body).map_err(|err| {
        BridgeError::invalid_request(format!("invalid JSON Patch document: {err}"))
    })?;
    validate_json_patch_operations(&operations.0)?;

    let mut patched = resource.clone();
    patch(&mut patched, &operations)
        .map_err(|err| BridgeError::invalid_request(format!("patch operation failed: {err}")))?;
    Ok(patched)
}

fn validate_json_patch_operations(operations: &[PatchOperation]) -> Result<()> {
    for operation in operations {
        ensure_unprotected(json_patch_operation_path(operation))?;
        // A move out of a protected field would remove it.
        if let PatchOperation::Move(move_op) = operation {
            ensure_unprotected(move_op.from.as_str())?;
        }
    }
    Ok(())
}

fn json_patch_operation_path(operation: &PatchOperation) -> &str {
    match operation {
        PatchOperation::Add(add_op) => add_op.path.as_str(),
        PatchOperation::Remove(remove_op) => remove_op.path.as_str(),
        PatchOperation::Replace(replace_op) => replace_op.path.as_str(),
        PatchOperation::Move(move_op) => move_op.path.as_str(),
        PatchOperation::Copy(copy_op) => copy_op.path.as_str(),
        PatchOperation::Test(test_op) => test_op.path.as_str(),
    }
}

fn ensure_unprotected(path: &str) -> Result<()> {
    for protected in PROTECTED_POINTERS {
        if path == *protected || path.starts_with(&format!("{protected}/")) {
            return Err(BridgeError::invalid_request(format!(
                "cannot modify {} with a patch",
                &protected[1..]
            )));
        }
    }
    Ok(())
}

fn apply_merge_patch(resource: &Value, body: &str) -> Result<Value> {
    let merge: Value = serde_json::from_str(body).map_err(|err| {
        BridgeError::invalid_request(format!("invalid merge patch document: {err}"))
    })?;
    if !merge.is_object() {
        return Err(BridgeError::invalid_request(
            "merge patch document must be a JSON object",
        ));
    }

    let mut patched = resource.clone();
    json_patch::merge(&mut patched, &merge);
    for field in ["id", "resourceType"] {
        if patched.get(field) != resource.get(field) {
            return Err(BridgeError::invalid_request(format!(
                "cannot modify {field} with a patch"
            )));
        }
    }
    Ok(patched)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XmlOpKind {
    Add,
    Replace,
    Remove,
}

#[derive(Debug)]
struct XmlOperation {
    kind: XmlOpKind,
    sel: String,
    value: Value,
}

/// Applies an XML diff document of the form
/// `<diff><replace sel="/status">arrived</replace>...</diff>`.
///
/// Selectors are slash paths into the document; a leading segment naming
/// the resource type itself is skipped. Values are the element text,
/// read as JSON when it parses and as a plain string otherwise.
fn apply_xml_patch(resource: &Value, body: &str) -> Result<Value> {
    let operations = parse_xml_operations(body)?;
    let mut patched = resource.clone();
    for operation in &operations {
        apply_xml_operation(&mut patched, operation)?;
    }
    Ok(patched)
}

fn parse_xml_operations(body: &str) -> Result<Vec<XmlOperation>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut operations = Vec::new();
    let mut saw_diff = false;
    let mut open: Option<(XmlOpKind, String)> = None;
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(|err| {
            BridgeError::invalid_request(format!("invalid XML patch document: {err}"))
        })?;
        match event {
            Event::Start(element) => {
                let name = element.name();
                match name.as_ref() {
                    b"diff" if !saw_diff && open.is_none() => saw_diff = true,
                    op_name @ (b"add" | b"replace" | b"remove") if saw_diff && open.is_none() => {
                        open = Some((xml_op_kind(op_name), selector(&element)?));
                        text.clear();
                    }
                    other => {
                        return Err(BridgeError::invalid_request(format!(
                            "unexpected element <{}> in XML patch",
                            String::from_utf8_lossy(other)
                        )));
                    }
                }
            }
            Event::Empty(element) => {
                let name = element.name();
                match name.as_ref() {
                    op_name @ (b"add" | b"replace" | b"remove") if saw_diff && open.is_none() => {
                        let kind = xml_op_kind(op_name);
                        let sel = selector(&element)?;
                        operations.push(build_xml_operation(kind, sel, ""));
                    }
                    other => {
                        return Err(BridgeError::invalid_request(format!(
                            "unexpected element <{}> in XML patch",
                            String::from_utf8_lossy(other)
                        )));
                    }
                }
            }
            Event::Text(content) => {
                if open.is_some() {
                    let chunk = content.unescape().map_err(|err| {
                        BridgeError::invalid_request(format!("invalid XML patch text: {err}"))
                    })?;
                    text.push_str(&chunk);
                }
            }
            Event::End(element) => match element.name().as_ref() {
                b"add" | b"replace" | b"remove" => {
                    let Some((kind, sel)) = open.take() else {
                        return Err(BridgeError::invalid_request(
                            "mismatched end tag in XML patch",
                        ));
                    };
                    operations.push(build_xml_operation(kind, sel, &text));
                }
                b"diff" => {}
                other => {
                    return Err(BridgeError::invalid_request(format!(
                        "unexpected end tag </{}> in XML patch",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_diff {
        return Err(BridgeError::invalid_request(
            "XML patch document must have a <diff> root",
        ));
    }
    Ok(operations)
}

fn xml_op_kind(name: &[u8]) -> XmlOpKind {
    match name {
        b"add" => XmlOpKind::Add,
        b"remove" => XmlOpKind::Remove,
        _ => XmlOpKind::Replace,
    }
}

fn build_xml_operation(kind: XmlOpKind, sel: String, text: &str) -> XmlOperation {
    let value = match kind {
        XmlOpKind::Remove => Value::Null,
        XmlOpKind::Add | XmlOpKind::Replace => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
    };
    XmlOperation { kind, sel, value }
}

fn selector(element: &BytesStart<'_>) -> Result<String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| {
            BridgeError::invalid_request(format!("invalid XML patch attribute: {err}"))
        })?;
        if attr.key.as_ref() == b"sel" {
            let value = attr.unescape_value().map_err(|err| {
                BridgeError::invalid_request(format!("invalid XML patch attribute: {err}"))
            })?;
            return Ok(value.into_owned());
        }
    }
    Err(BridgeError::invalid_request(
        "XML patch operation is missing its 'sel' attribute",
    ))
}

fn apply_xml_operation(doc: &mut Value, operation: &XmlOperation) -> Result<()> {
    let segments = selector_segments(doc, &operation.sel)?;
    let Some((last, parents)) = segments.split_last() else {
        return Err(selector_error(&operation.sel));
    };

    match operation.kind {
        XmlOpKind::Add => {
            let Some(parent) = navigate(doc, parents) else {
                return Err(selector_error(&operation.sel));
            };
            match parent {
                Value::Object(map) => {
                    map.insert((*last).to_string(), operation.value.clone());
                }
                Value::Array(items) if *last == "-" => items.push(operation.value.clone()),
                Value::Array(items) => {
                    let index: usize =
                        last.parse().map_err(|_| selector_error(&operation.sel))?;
                    if index > items.len() {
                        return Err(selector_error(&operation.sel));
                    }
                    items.insert(index, operation.value.clone());
                }
                _ => return Err(selector_error(&operation.sel)),
            }
        }
        XmlOpKind::Replace => {
            let Some(target) = navigate(doc, &segments) else {
                return Err(selector_error(&operation.sel));
            };
            *target = operation.value.clone();
        }
        XmlOpKind::Remove => {
            let Some(parent) = navigate(doc, parents) else {
                return Err(selector_error(&operation.sel));
            };
            match parent {
                Value::Object(map) => {
                    if map.remove(*last).is_none() {
                        return Err(selector_error(&operation.sel));
                    }
                }
                Value::Array(items) => {
                    let index: usize =
                        last.parse().map_err(|_| selector_error(&operation.sel))?;
                    if index >= items.len() {
                        return Err(selector_error(&operation.sel));
                    }
                    items.remove(index);
                }
                _ => return Err(selector_error(&operation.sel)),
            }
        }
    }
    Ok(())
}

/// Splits a selector into path segments, dropping a leading segment that
/// names the resource type itself.
fn selector_segments<'a>(doc: &Value, sel: &'a str) -> Result<Vec<&'a str>> {
    let segments: Vec<&str> = sel.split('/').filter(|s| !s.is_empty()).collect();
    let segments = match segments.split_first() {
        Some((first, rest)) if doc.get("resourceType").and_then(Value::as_str) == Some(*first) => {
            rest.to_vec()
        }
        _ => segments,
    };
    if segments.is_empty() {
        return Err(BridgeError::invalid_request(format!(
            "selector '{sel}' does not address an element"
        )));
    }
    if matches!(segments[0], "id" | "resourceType") {
        return Err(BridgeError::invalid_request(format!(
            "cannot modify {} with a patch",
            segments[0]
        )));
    }
    Ok(segments)
}

fn navigate<'a>(value: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get_mut(*segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get_mut(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

fn selector_error(sel: &str) -> BridgeError {
    BridgeError::invalid_request(format!("selector '{sel}' does not match the resource"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_bridge_core::ErrorCategory;
    use serde_json::json;

    fn appointment() -> Value {
        json!({
            "resourceType": "Appointment",
            "id": "a1",
            "status": "booked",
            "priority": 5,
            "tags": ["routine"]
        })
    }

    #[test]
    fn test_format_from_content_type() {
        assert_eq!(
            PatchFormat::from_content_type("application/json-patch+json").unwrap(),
            PatchFormat::JsonPatch
        );
        assert_eq!(
            PatchFormat::from_content_type("Application/Merge-Patch+JSON; charset=utf-8").unwrap(),
            PatchFormat::MergePatch
        );
        assert_eq!(
            PatchFormat::from_content_type("application/xml-patch+xml").unwrap(),
            PatchFormat::XmlPatch
        );

        let err = PatchFormat::from_content_type("text/plain").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Unsupported);
        assert_eq!(err.status_code(), 501);
    }

    #[test]
    fn test_json_patch_add_and_replace() {
        let body = r#"[
            {"op": "replace", "path": "/status", "value": "arrived"},
            {"op": "add", "path": "/note", "value": "walk-in"}
        ]"#;
        let patched = apply(PatchFormat::JsonPatch, &appointment(), body).unwrap();
        assert_eq!(patched["status"], "arrived");
        assert_eq!(patched["note"], "walk-in");
        assert_eq!(patched["id"], "a1");
    }

    #[test]
    fn test_json_patch_protects_identity_fields() {
        for body in [
            r#"[{"op": "replace", "path": "/id", "value": "other"}]"#,
            r#"[{"op": "remove", "path": "/resourceType"}]"#,
            r#"[{"op": "move", "from": "/id", "path": "/note"}]"#,
        ] {
            let err = apply(PatchFormat::JsonPatch, &appointment(), body).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Validation, "{body}");
        }
    }

    #[test]
    fn test_json_patch_failing_test_op_aborts() {
        let original = appointment();
        let body = r#"[
            {"op": "test", "path": "/status", "value": "cancelled"},
            {"op": "replace", "path": "/status", "value": "arrived"}
        ]"#;
        assert!(apply(PatchFormat::JsonPatch, &original, body).is_err());
        assert_eq!(original["status"], "booked");
    }

    #[test]
    fn test_merge_patch_updates_and_removes() {
        let body = r#"{"status": "arrived", "priority": null}"#;
        let patched = apply(PatchFormat::MergePatch, &appointment(), body).unwrap();
        assert_eq!(patched["status"], "arrived");
        assert!(patched.get("priority").is_none());
        assert_eq!(patched["tags"], json!(["routine"]));
    }

    #[test]
    fn test_merge_patch_protects_identity_fields() {
        let err =
            apply(PatchFormat::MergePatch, &appointment(), r#"{"id": "other"}"#).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = apply(PatchFormat::MergePatch, &appointment(), r#"{"id": null}"#).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_merge_patch_must_be_an_object() {
        let err = apply(PatchFormat::MergePatch, &appointment(), r#""scalar""#).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_xml_patch_full_diff() {
        let body = r#"<diff>
            <replace sel="/status">arrived</replace>
            <add sel="/note">walk-in</add>
            <remove sel="/priority"/>
            <add sel="/tags/-">urgent</add>
        </diff>"#;
        let patched = apply(PatchFormat::XmlPatch, &appointment(), body).unwrap();
        assert_eq!(patched["status"], "arrived");
        assert_eq!(patched["note"], "walk-in");
        assert!(patched.get("priority").is_none());
        assert_eq!(patched["tags"], json!(["routine", "urgent"]));
    }

    #[test]
    fn test_xml_patch_values_parse_as_json_when_possible() {
        let body = r#"<diff><replace sel="/priority">7</replace></diff>"#;
        let patched = apply(PatchFormat::XmlPatch, &appointment(), body).unwrap();
        assert_eq!(patched["priority"], 7);
    }

    #[test]
    fn test_xml_patch_skips_resource_type_prefix() {
        let body = r#"<diff><replace sel="/Appointment/status">arrived</replace></diff>"#;
        let patched = apply(PatchFormat::XmlPatch, &appointment(), body).unwrap();
        assert_eq!(patched["status"], "arrived");
    }

    #[test]
    fn test_xml_patch_protects_identity_fields() {
        for body in [
            r#"<diff><replace sel="/id">other</replace></diff>"#,
            r#"<diff><remove sel="/Appointment/resourceType"/></diff>"#,
        ] {
            let err = apply(PatchFormat::XmlPatch, &appointment(), body).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Validation, "{body}");
        }
    }

    #[test]
    fn test_xml_patch_rejects_unmatched_selector() {
        let body = r#"<diff><replace sel="/missing/deep">x</replace></diff>"#;
        let err = apply(PatchFormat::XmlPatch, &appointment(), body).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_xml_patch_rejects_malformed_documents() {
        for body in [
            "not xml at all",
            r#"<diff><replace>missing sel</replace></diff>"#,
            r#"<notdiff><replace sel="/status">x</replace></notdiff>"#,
        ] {
            let err = apply(PatchFormat::XmlPatch, &appointment(), body).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Validation, "{body}");
        }
    }
}
