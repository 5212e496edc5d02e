//! Column views of domain entities for in-memory list evaluation.
//!
//! Column names follow the snake_case field names, which is also what
//! callers use in `field=value` filters and sort terms.

use pagination::{FieldValue, Record};

use crate::domain::{Client, ClientProject, SystemUser, TimingView};

impl Record for Client {
    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => self.id.map(FieldValue::from),
            "short_title" => Some(self.short_title.as_str().into()),
            "title" => Some(self.title.as_str().into()),
            "notes" => Some(self.notes.as_str().into()),
            "is_active" => Some(self.is_active.into()),
            _ => None,
        }
    }
}

impl Record for ClientProject {
    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => self.id.map(FieldValue::from),
            "client_id" => Some(self.client_id.into()),
            "name" => Some(self.name.as_str().into()),
            "is_active" => Some(self.is_active.into()),
            _ => None,
        }
    }
}

impl Record for TimingView {
    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => Some(self.id.into()),
            "client_project" => Some(self.client_project.as_str().into()),
            "client" => Some(self.client.as_str().into()),
            "title" => Some(self.title.as_str().into()),
            "description" => Some(self.description.as_str().into()),
            "start" => Some(self.start.timestamp_millis().into()),
            "end" => Some(self.end.timestamp_millis().into()),
            "status" => Some(self.status.as_str().into()),
            _ => None,
        }
    }
}

// Password digest and salt are not exposed as columns.
impl Record for SystemUser {
    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => self.id.as_ref().map(|id| FieldValue::Text(id.to_string())),
            "name" => Some(self.name.as_str().into()),
            "surname" => Some(self.surname.as_str().into()),
            "email" => Some(self.email.as_str().into()),
            "is_active" => Some(self.is_active.into()),
            _ => None,
        }
    }
}
