//! Time entry data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::permission::{PermissionSet, Resource};
use super::system_user::SystemUserId;
use super::validation::{Guarded, Validate, check_text};

/// Maximum length of [`Timing::title`].
pub const TITLE_MAX: usize = 100;

/// Lifecycle state of a time entry.
///
/// Serialised as its numeric code; unknown codes are rejected at the
/// boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TimingStatus {
    #[default]
    Paused,
    Started,
    Stopped,
    Completed,
}

impl TimingStatus {
    /// Name used in listings.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paused => "Paused",
            Self::Started => "Started",
            Self::Stopped => "Stopped",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for TimingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TimingStatus> for i32 {
    fn from(value: TimingStatus) -> Self {
        match value {
            TimingStatus::Paused => 0,
            TimingStatus::Started => 1,
            TimingStatus::Stopped => 2,
            TimingStatus::Completed => 3,
        }
    }
}

impl TryFrom<i32> for TimingStatus {
    type Error = TimingValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Paused),
            1 => Ok(Self::Started),
            2 => Ok(Self::Stopped),
            3 => Ok(Self::Completed),
            _ => Err(TimingValidationError::InvalidStatus { value }),
        }
    }
}

/// Validation errors for [`Timing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimingValidationError {
    #[error("client project id is required")]
    MissingClientProject,
    #[error("system user id is required")]
    MissingSystemUser,
    #[error("title is required")]
    MissingTitle,
    #[error("title must be at most 100 characters")]
    TitleTooLong,
    #[error("start time is required")]
    MissingStart,
    #[error("end time is required")]
    MissingEnd,
    #[error("end time must not be before start time")]
    EndBeforeStart,
    #[error("invalid status value {value}")]
    InvalidStatus { value: i32 },
}

/// Time spent by a user on a client project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    #[serde(default)]
    pub id: Option<i64>,
    pub client_project_id: i64,
    #[serde(default)]
    pub system_user_id: Option<SystemUserId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TimingStatus,
}

impl Timing {
    /// Lookup probe carrying only an identifier.
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

impl Validate for Timing {
    type Error = TimingValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.client_project_id <= 0 {
            return Err(TimingValidationError::MissingClientProject);
        }
        if self.system_user_id.is_none() {
            return Err(TimingValidationError::MissingSystemUser);
        }
        self.validate_changes()
    }

    fn validate_changes(&self) -> Result<(), Self::Error> {
        check_text(
            &self.title,
            TITLE_MAX,
            TimingValidationError::MissingTitle,
            TimingValidationError::TitleTooLong,
        )?;
        let start = self.start.ok_or(TimingValidationError::MissingStart)?;
        let end = self.end.ok_or(TimingValidationError::MissingEnd)?;
        if end < start {
            return Err(TimingValidationError::EndBeforeStart);
        }
        Ok(())
    }
}

impl Guarded for Timing {
    const PERMISSIONS: PermissionSet = Resource::Timings.permissions();

    fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Listing row joining a time entry with its project and client names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingView {
    pub id: i64,
    pub client_project: String,
    pub client: String,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: TimingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn timing() -> Timing {
        Timing {
            client_project_id: 4,
            system_user_id: Some(SystemUserId::random()),
            title: "Design review".into(),
            start: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single(),
            end: Utc.with_ymd_and_hms(2024, 3, 1, 11, 30, 0).single(),
            ..Timing::default()
        }
    }

    #[rstest]
    fn accepts_well_formed_entries(timing: Timing) {
        assert!(timing.validate().is_ok());
    }

    #[rstest]
    fn rejects_end_before_start(mut timing: Timing) {
        std::mem::swap(&mut timing.start, &mut timing.end);
        assert_eq!(timing.validate(), Err(TimingValidationError::EndBeforeStart));
    }

    #[rstest]
    fn update_skips_create_only_fields(mut timing: Timing) {
        timing.client_project_id = 0;
        timing.system_user_id = None;
        assert!(timing.validate_changes().is_ok());
        assert_eq!(
            timing.validate(),
            Err(TimingValidationError::MissingClientProject)
        );
    }

    #[rstest]
    fn requires_both_bounds(mut timing: Timing) {
        timing.end = None;
        assert_eq!(timing.validate(), Err(TimingValidationError::MissingEnd));
    }

    #[rstest]
    #[case(3, Ok(TimingStatus::Completed))]
    #[case(4, Err(TimingValidationError::InvalidStatus { value: 4 }))]
    #[case(-1, Err(TimingValidationError::InvalidStatus { value: -1 }))]
    fn status_codes_are_closed(
        #[case] code: i32,
        #[case] expected: Result<TimingStatus, TimingValidationError>,
    ) {
        assert_eq!(TimingStatus::try_from(code), expected);
    }

    #[rstest]
    fn unknown_status_is_rejected_when_decoding() {
        let payload = r#"{"clientProjectId":1,"title":"x","start":null,"end":null,"status":9}"#;
        assert!(serde_json::from_str::<Timing>(payload).is_err());
    }
}
