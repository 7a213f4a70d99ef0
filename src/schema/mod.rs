//! Declarative document-type descriptors for the CMS admin tool, served as
//! JSON and reused to validate public submissions.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    String,
    Text,
    Slug { source: &'static str },
    Datetime,
    Boolean,
    Number,
    Url,
    Image { hotspot: bool },
    Reference { to: Vec<&'static str> },
    Array { of: Box<FieldKind> },
    Block,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: &'static str,
    pub title: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>,
}

impl Field {
    fn new(name: &'static str, title: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            title,
            kind,
            required: false,
            initial_value: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn initial(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSchema {
    pub name: &'static str,
    pub title: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub fields: Vec<Field>,
}

impl DocumentSchema {
    fn document(name: &'static str, title: &'static str, fields: Vec<Field>) -> Self {
        Self {
            name,
            title,
            kind: "document",
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Required fields that are absent, null, or blank strings in `doc`.
    pub fn missing_required(&self, doc: &Value) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| match doc.get(f.name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(Value::Array(items)) => items.is_empty(),
                Some(_) => false,
            })
            .map(|f| f.name)
            .collect()
    }
}

fn slug() -> FieldKind {
    FieldKind::Slug { source: "title" }
}

fn image() -> FieldKind {
    FieldKind::Image { hotspot: true }
}

fn reference(to: &'static str) -> FieldKind {
    FieldKind::Reference { to: vec![to] }
}

fn array_of(kind: FieldKind) -> FieldKind {
    FieldKind::Array { of: Box::new(kind) }
}

pub fn post() -> DocumentSchema {
    DocumentSchema::document(
        "post",
        "Post",
        vec![
            Field::new("title", "Title", FieldKind::String).required(),
            Field::new("slug", "Slug", slug()).required(),
            Field::new("author", "Author", reference("author")),
            Field::new("mainImage", "Main image", image()),
            Field::new("categories", "Categories", array_of(reference("category"))),
            Field::new("publishedAt", "Published at", FieldKind::Datetime),
            Field::new("excerpt", "Excerpt", FieldKind::Text),
            Field::new("body", "Body", array_of(FieldKind::Block)),
        ],
    )
}

pub fn author() -> DocumentSchema {
    DocumentSchema::document(
        "author",
        "Author",
        vec![
            Field::new("name", "Name", FieldKind::String).required(),
            Field::new("slug", "Slug", FieldKind::Slug { source: "name" }).required(),
            Field::new("image", "Image", image()),
            Field::new("bio", "Bio", array_of(FieldKind::Block)),
        ],
    )
}

pub fn category() -> DocumentSchema {
    DocumentSchema::document(
        "category",
        "Category",
        vec![
            Field::new("title", "Title", FieldKind::String).required(),
            Field::new("slug", "Slug", slug()).required(),
            Field::new("description", "Description", FieldKind::Text),
        ],
    )
}

pub fn team_member() -> DocumentSchema {
    DocumentSchema::document(
        "teamMember",
        "Team member",
        vec![
            Field::new("name", "Name", FieldKind::String).required(),
            Field::new("role", "Role", FieldKind::String),
            Field::new("image", "Photo", image()),
            Field::new("bio", "Bio", FieldKind::Text),
            Field::new("order", "Display order", FieldKind::Number),
        ],
    )
}

pub fn event() -> DocumentSchema {
    DocumentSchema::document(
        "event",
        "Event",
        vec![
            Field::new("title", "Title", FieldKind::String).required(),
            Field::new("slug", "Slug", slug()).required(),
            Field::new("startsAt", "Starts at", FieldKind::Datetime).required(),
            Field::new("endsAt", "Ends at", FieldKind::Datetime),
            Field::new("location", "Location", FieldKind::String),
            Field::new("description", "Description", FieldKind::Text),
            Field::new("registrationUrl", "Registration link", FieldKind::Url),
        ],
    )
}

/// Comments arrive from the public site and wait for an editor to set
/// `approved`.
pub fn comment() -> DocumentSchema {
    DocumentSchema::document(
        "comment",
        "Comment",
        vec![
            Field::new("name", "Name", FieldKind::String).required(),
            Field::new("email", "Email", FieldKind::String).required(),
            Field::new("comment", "Comment", FieldKind::Text).required(),
            Field::new("post", "Post", reference("post")).required(),
            Field::new("approved", "Approved", FieldKind::Boolean)
                .initial(Value::Bool(false)),
        ],
    )
}

pub fn all() -> Vec<DocumentSchema> {
    vec![post(), author(), category(), team_member(), event(), comment()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_document_type_is_described_once() {
        let names: Vec<&str> = all().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["post", "author", "category", "teamMember", "event", "comment"]
        );
    }

    #[test]
    fn missing_required_reports_blank_and_absent_fields() {
        let missing = comment().missing_required(&json!({
            "name": "  ",
            "email": "sam@example.org",
            "comment": null
        }));
        assert_eq!(missing, vec!["name", "comment", "post"]);
    }

    #[test]
    fn complete_comment_has_nothing_missing() {
        let missing = comment().missing_required(&json!({
            "name": "Sam",
            "email": "sam@example.org",
            "comment": "Hi",
            "post": { "_ref": "p1" }
        }));
        assert!(missing.is_empty());
    }

    #[test]
    fn serializes_in_studio_shape() {
        let json = serde_json::to_value(post()).unwrap();
        assert_eq!(json["type"], "document");
        let categories = &json["fields"][4];
        assert_eq!(categories["name"], "categories");
        assert_eq!(categories["type"], "array");
        assert_eq!(categories["of"]["type"], "reference");
        assert_eq!(categories["of"]["to"][0], "category");
        assert_eq!(json["fields"][0]["required"], true);
        assert!(json["fields"][2].get("required").is_none());
    }

    #[test]
    fn approved_defaults_to_false() {
        let schema = comment();
        let approved = schema.field("approved").unwrap();
        assert_eq!(approved.initial_value, Some(Value::Bool(false)));
        assert_eq!(approved.kind, FieldKind::Boolean);
    }
}
