//! Template schema validation.
//!
//! Validation runs on the raw JSON value so that every violation can be
//! reported with a JSON-pointer-like path, not just the first one serde
//! would trip over.

use crate::color::is_valid_color;
use crate::error::ValidationError;
use crate::template::Template;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Known template categories.
pub const CATEGORIES: &[&str] = &[
    "social-media",
    "presentation",
    "marketing",
    "print",
    "business",
    "personal",
    "education",
    "events",
    "web",
];

/// Known visual styles.
pub const STYLES: &[&str] = &[
    "modern",
    "minimal",
    "classic",
    "bold",
    "playful",
    "elegant",
    "corporate",
    "vintage",
    "creative",
];

/// Known difficulty levels.
pub const DIFFICULTIES: &[&str] = &["beginner", "intermediate", "advanced"];

const OBJECT_TYPES: &[&str] = &["text", "image", "shape", "group"];
const PLACEHOLDER_TYPES: &[&str] = &["text", "image", "logo", "icon"];
const EDITABLE_FLAGS: &[&str] = &["content", "style", "position", "size"];

/// One schema violation or warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location, e.g. `/objects/2/editable/size`.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "/: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Errors block use of the template; warnings do not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Err` with every error if there is at least one.
    pub fn into_result(self) -> Result<Vec<ValidationIssue>, ValidationError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(ValidationError::new(self.errors))
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(path, message));
    }

    fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(path, message));
    }
}

/// Validate a typed template.
pub fn validate_template(template: &Template) -> ValidationReport {
    match serde_json::to_value(template) {
        Ok(value) => validate_value(&value),
        Err(e) => {
            let mut report = ValidationReport::default();
            report.error("", format!("template is not serializable: {e}"));
            report
        }
    }
}

/// Validate a raw template document.
pub fn validate_value(value: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(root) = value.as_object() else {
        report.error("", "template must be a JSON object");
        return report;
    };

    required_string(&mut report, root, "", "id", true);
    required_string(&mut report, root, "", "name", false);

    match root.get("canvas") {
        Some(Value::Object(canvas)) => validate_canvas(&mut report, canvas),
        Some(_) => report.error("/canvas", "must be an object"),
        None => report.error("/canvas", "is required"),
    }

    match root.get("objects") {
        Some(Value::Array(objects)) => validate_objects(&mut report, objects),
        Some(_) => report.error("/objects", "must be an array"),
        None => report.error("/objects", "is required"),
    }

    match root.get("category") {
        Some(Value::String(c)) => enum_member(&mut report, "/category", c, CATEGORIES),
        Some(Value::Null) | None => report.warning("/category", "is missing"),
        Some(_) => report.error("/category", "must be a string"),
    }

    match root.get("customizable") {
        Some(Value::Bool(_)) | None => {}
        Some(_) => report.error("/customizable", "must be a boolean"),
    }

    match root.get("preview") {
        Some(Value::String(_)) => {}
        Some(Value::Null) | None => report.warning("/preview", "is missing"),
        Some(_) => report.error("/preview", "must be a string"),
    }

    match root.get("metadata") {
        Some(Value::Object(metadata)) => validate_metadata(&mut report, metadata),
        Some(Value::Null) | None => report.warning("/metadata", "is missing"),
        Some(_) => report.error("/metadata", "must be an object"),
    }

    report
}

fn required_string(report: &mut ValidationReport, obj: &Map<String, Value>, base: &str, key: &str, non_empty: bool) {
    let path = format!("{base}/{key}");
    match obj.get(key) {
        Some(Value::String(s)) if non_empty && s.trim().is_empty() => {
            report.error(path, "must not be empty")
        }
        Some(Value::String(_)) => {}
        Some(_) => report.error(path, "must be a string"),
        None => report.error(path, "is required"),
    }
}

fn enum_member(report: &mut ValidationReport, path: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        report.error(path, format!("'{}' is not one of: {}", value, allowed.join(", ")));
    }
}

fn positive_integer(report: &mut ValidationReport, obj: &Map<String, Value>, base: &str, key: &str) {
    let path = format!("{base}/{key}");
    match obj.get(key) {
        Some(Value::Number(n)) if n.as_u64().is_some_and(|v| v > 0 && v <= u32::MAX as u64) => {}
        Some(_) => report.error(path, "must be a positive integer"),
        None => report.error(path, "is required"),
    }
}

fn color_field(report: &mut ValidationReport, path: String, value: Option<&Value>, required: bool) {
    match value {
        Some(Value::String(s)) if is_valid_color(s) => {}
        Some(Value::String(s)) => report.error(path, format!("'{s}' is not a valid colour")),
        Some(_) => report.error(path, "must be a colour string"),
        None if required => report.error(path, "is required"),
        None => {}
    }
}

fn validate_canvas(report: &mut ValidationReport, canvas: &Map<String, Value>) {
    positive_integer(report, canvas, "/canvas", "width");
    positive_integer(report, canvas, "/canvas", "height");
    color_field(
        report,
        "/canvas/backgroundColor".to_string(),
        canvas.get("backgroundColor"),
        true,
    );
    match canvas.get("backgroundImage") {
        Some(Value::String(_)) | Some(Value::Null) | None => {}
        Some(_) => report.error("/canvas/backgroundImage", "must be a string"),
    }
}

fn validate_objects(report: &mut ValidationReport, objects: &[Value]) {
    let mut seen = HashSet::new();
    for (index, object) in objects.iter().enumerate() {
        let base = format!("/objects/{index}");
        let Some(object) = object.as_object() else {
            report.error(base, "must be an object");
            continue;
        };

        match object.get("id") {
            Some(Value::String(id)) if id.trim().is_empty() => {
                report.error(format!("{base}/id"), "must not be empty")
            }
            Some(Value::String(id)) => {
                if !seen.insert(id.as_str()) {
                    report.error(format!("{base}/id"), format!("duplicate object id '{id}'"));
                }
            }
            Some(_) => report.error(format!("{base}/id"), "must be a string"),
            None => report.error(format!("{base}/id"), "is required"),
        }

        match object.get("type") {
            Some(Value::String(t)) => enum_member(report, &format!("{base}/type"), t, OBJECT_TYPES),
            Some(_) => report.error(format!("{base}/type"), "must be a string"),
            None => report.error(format!("{base}/type"), "is required"),
        }

        match object.get("nodeData") {
            Some(Value::Object(data)) => validate_node_data(report, &format!("{base}/nodeData"), data),
            Some(_) => report.error(format!("{base}/nodeData"), "must be an object"),
            None => report.error(format!("{base}/nodeData"), "is required"),
        }

        match object.get("editable") {
            Some(Value::Object(editable)) => {
                for flag in EDITABLE_FLAGS {
                    let path = format!("{base}/editable/{flag}");
                    match editable.get(*flag) {
                        Some(Value::Bool(_)) => {}
                        Some(_) => report.error(path, "must be a boolean"),
                        None => report.error(path, "is required"),
                    }
                }
            }
            Some(_) => report.error(format!("{base}/editable"), "must be an object"),
            None => report.error(format!("{base}/editable"), "is required"),
        }

        match object.get("placeholder") {
            Some(Value::Object(placeholder)) => {
                validate_placeholder(report, &format!("{base}/placeholder"), placeholder)
            }
            Some(Value::Null) | None => {}
            Some(_) => report.error(format!("{base}/placeholder"), "must be an object"),
        }
    }
}

fn validate_node_data(report: &mut ValidationReport, base: &str, data: &Map<String, Value>) {
    for key in ["fill", "stroke"] {
        if let Some(Value::String(s)) = data.get(key) {
            let s = s.trim();
            if !s.is_empty() && !s.eq_ignore_ascii_case("none") && !is_valid_color(s) {
                report.error(format!("{base}/{key}"), format!("'{s}' is not a valid colour"));
            }
        }
    }
    if let Some(Value::Array(children)) = data.get("objects") {
        for (index, child) in children.iter().enumerate() {
            let path = format!("{base}/objects/{index}");
            match child {
                Value::Object(child) => validate_node_data(report, &path, child),
                _ => report.error(path, "must be an object"),
            }
        }
    }
}

fn validate_placeholder(report: &mut ValidationReport, base: &str, placeholder: &Map<String, Value>) {
    match placeholder.get("type") {
        Some(Value::String(t)) => enum_member(report, &format!("{base}/type"), t, PLACEHOLDER_TYPES),
        Some(_) => report.error(format!("{base}/type"), "must be a string"),
        None => report.error(format!("{base}/type"), "is required"),
    }
    required_string(report, placeholder, base, "defaultContent", false);
    match placeholder.get("suggestions") {
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                if !item.is_string() {
                    report.error(format!("{base}/suggestions/{index}"), "must be a string");
                }
            }
        }
        Some(_) => report.error(format!("{base}/suggestions"), "must be an array"),
        None => {}
    }
}

fn validate_metadata(report: &mut ValidationReport, metadata: &Map<String, Value>) {
    for key in ["tags", "industry", "colors", "fonts"] {
        let path = format!("/metadata/{key}");
        match metadata.get(key) {
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::String(s) if key == "colors" && !is_valid_color(s) => report.error(
                            format!("{path}/{index}"),
                            format!("'{s}' is not a valid colour"),
                        ),
                        Value::String(_) => {}
                        _ => report.error(format!("{path}/{index}"), "must be a string"),
                    }
                }
            }
            Some(_) => report.error(path, "must be an array"),
            None if key == "tags" => report.warning(path, "is missing"),
            None => {}
        }
    }

    for (key, allowed) in [("style", STYLES), ("difficulty", DIFFICULTIES)] {
        let path = format!("/metadata/{key}");
        match metadata.get(key) {
            Some(Value::String(s)) => enum_member(report, &path, s, allowed),
            Some(Value::Null) | None => report.warning(path, "is missing"),
            Some(_) => report.error(path, "must be a string"),
        }
    }

    for key in ["createdAt", "updatedAt"] {
        let path = format!("/metadata/{key}");
        match metadata.get(key) {
            Some(Value::String(s)) if is_iso8601(s) => {}
            Some(Value::String(s)) => report.error(path, format!("'{s}' is not an ISO-8601 date")),
            Some(Value::Null) | None => {}
            Some(_) => report.error(path, "must be a string"),
        }
    }

    match metadata.get("author") {
        Some(Value::String(_)) => {}
        Some(Value::Null) | None => report.warning("/metadata/author", "is missing"),
        Some(_) => report.error("/metadata/author", "must be a string"),
    }
}

fn digits(s: &str, len: usize) -> Option<u32> {
    (s.len() == len && s.bytes().all(|b| b.is_ascii_digit()))
        .then(|| s.parse().ok())
        .flatten()
}

/// Accepts `YYYY-MM-DD` optionally followed by `THH:MM[:SS[.fff]]` and a
/// `Z` or `±HH:MM` offset.
pub fn is_iso8601(value: &str) -> bool {
    let (date, time) = match value.split_once(['T', 't']) {
        Some((d, t)) => (d, Some(t)),
        None => (value, None),
    };

    let mut parts = date.split('-');
    let (Some(year), Some(month), Some(day), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let (Some(_), Some(month), Some(day)) = (digits(year, 4), digits(month, 2), digits(day, 2)) else {
        return false;
    };
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return false;
    }

    let Some(time) = time else {
        return true;
    };
    let (clock, offset) = if let Some(clock) = time.strip_suffix(['Z', 'z']) {
        (clock, None)
    } else if let Some(pos) = time.rfind(['+', '-']) {
        (&time[..pos], Some(&time[pos + 1..]))
    } else {
        (time, None)
    };

    if let Some(offset) = offset {
        let Some((h, m)) = offset.split_once(':') else {
            return false;
        };
        if !matches!((digits(h, 2), digits(m, 2)), (Some(h), Some(m)) if h <= 23 && m <= 59) {
            return false;
        }
    }

    let clock = clock.split_once('.').map_or(clock, |(whole, fraction)| {
        if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            ""
        } else {
            whole
        }
    });
    let fields: Vec<&str> = clock.split(':').collect();
    let limits = [23, 59, 60];
    (2..=3).contains(&fields.len())
        && fields
            .iter()
            .zip(limits)
            .all(|(f, max)| digits(f, 2).is_some_and(|v| v <= max))
}
