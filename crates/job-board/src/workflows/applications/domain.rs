use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::{Caller, UserId};
use crate::workflows::profiles::StudentProfileView;
use crate::workflows::vacancies::{Vacancy, VacancyId};
use crate::workflows::validation::query_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub i64);

/// Flat status field; the owning employer may write any value at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Human-readable form used in notification text.
    pub const fn display_name(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Reviewed => "Reviewed",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub rating: i64,
    pub comment: String,
    pub from_role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: InterviewStatus,
}

/// Read representation with the applicant, the vacancy, and any review/interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student: StudentProfileView,
    pub vacancy: Vacancy,
    pub resume_url: String,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub review: Option<Review>,
    pub interview: Option<Interview>,
}

impl Application {
    pub fn applicant(&self) -> UserId {
        self.student.id
    }

    pub fn vacancy_owner(&self) -> UserId {
        self.vacancy.owner()
    }
}

/// Applications a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationScope {
    SubmittedBy(UserId),
    /// Applications against vacancies the employer owns.
    ReceivedBy(UserId),
    Everything,
    Nothing,
}

impl ApplicationScope {
    pub fn for_caller(caller: &Caller) -> Self {
        match caller {
            Caller::Student(account) => ApplicationScope::SubmittedBy(account.id),
            Caller::Employer(account) => ApplicationScope::ReceivedBy(account.id),
            Caller::Admin(_) => ApplicationScope::Everything,
            Caller::Anonymous | Caller::Unassigned(_) => ApplicationScope::Nothing,
        }
    }
}

/// Query parameters accepted by `GET /applications`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationFilter {
    pub vacancy: Option<String>,
}

impl ApplicationFilter {
    pub fn vacancy_id(&self) -> Option<VacancyId> {
        query_id(self.vacancy.as_deref()).map(VacancyId)
    }
}

/// Body of `POST /vacancies/{id}/apply`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyRequest {
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
}

/// Body of `POST /applications`: the apply body plus the target vacancy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApplicationRequest {
    pub vacancy: Option<Value>,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRequest {
    pub rating: Option<Value>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewRequest {
    pub scheduled_at: Option<String>,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub student: UserId,
    pub vacancy: VacancyId,
    pub resume_url: String,
    pub cover_letter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub application: ApplicationId,
    pub rating: i64,
    pub comment: String,
    pub from_role: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInterview {
    pub application: ApplicationId,
    pub scheduled_at: DateTime<Utc>,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_accepts_only_known_values() {
        for status in ApplicationStatus::ALL {
            assert_eq!(ApplicationStatus::parse(status.label()), Some(status));
        }
        assert_eq!(ApplicationStatus::parse("hired"), None);
        assert_eq!(ApplicationStatus::parse("Accepted"), None);
    }

    #[test]
    fn filter_ignores_non_numeric_vacancy() {
        let filter = ApplicationFilter {
            vacancy: Some("abc".to_string()),
        };
        assert_eq!(filter.vacancy_id(), None);

        let filter = ApplicationFilter {
            vacancy: Some("5".to_string()),
        };
        assert_eq!(filter.vacancy_id(), Some(VacancyId(5)));
    }
}
