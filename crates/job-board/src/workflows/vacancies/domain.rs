use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{Caller, UserId};
use crate::workflows::catalog::{Category, CategoryId, Skill, SkillId};
use crate::workflows::profiles::EmployerProfileView;
use crate::workflows::validation::{deserialize_some, query_flag, query_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyType {
    Work,
    Internship,
}

impl VacancyType {
    pub const fn label(self) -> &'static str {
        match self {
            VacancyType::Work => "work",
            VacancyType::Internship => "internship",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "work" => Some(Self::Work),
            "internship" => Some(Self::Internship),
            _ => None,
        }
    }
}

/// Read representation with nested employer, category, and skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub employer: EmployerProfileView,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub vacancy_type: VacancyType,
    pub salary: Option<f64>,
    pub location: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: Option<Category>,
    pub skills: Vec<Skill>,
    pub applications_count: u64,
}

impl Vacancy {
    pub fn owner(&self) -> UserId {
        self.employer.id
    }

    /// Active vacancies are public; inactive ones only reach their owner and admins.
    pub fn visible_to(&self, caller: &Caller) -> bool {
        self.is_active || caller.is_privileged() || caller.employer_id() == Some(self.owner())
    }
}

/// Write payload for create/replace/patch. Every field is optional here; the
/// service decides which ones are required. Unknown fields such as `employer`
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VacancyPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub vacancy_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub salary: Option<Option<f64>>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<i64>>,
    pub skill_ids: Option<Vec<i64>>,
}

/// Validated vacancy columns. `skill_ids == None` keeps the stored set.
#[derive(Debug, Clone, PartialEq)]
pub struct VacancyDraft {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub vacancy_type: VacancyType,
    pub salary: Option<f64>,
    pub location: String,
    pub is_active: bool,
    pub category_id: Option<CategoryId>,
    pub skill_ids: Option<Vec<SkillId>>,
}

impl VacancyDraft {
    /// Payload shaped like the stored vacancy, used as the base for partial updates.
    pub fn from_vacancy(vacancy: &Vacancy) -> Self {
        Self {
            title: vacancy.title.clone(),
            description: vacancy.description.clone(),
            requirements: vacancy.requirements.clone(),
            vacancy_type: vacancy.vacancy_type,
            salary: vacancy.salary,
            location: vacancy.location.clone(),
            is_active: vacancy.is_active,
            category_id: vacancy.category.as_ref().map(|category| category.id),
            skill_ids: None,
        }
    }
}

/// Raw query parameters accepted by `GET /vacancies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VacancyFilter {
    #[serde(rename = "type")]
    pub vacancy_type: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub my: Option<String>,
    pub show_all: Option<String>,
}

/// Rows a caller may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacancyScope {
    ActiveOnly,
    /// Active vacancies plus every vacancy owned by the employer.
    ActiveOrOwnedBy(UserId),
    OwnedBy(UserId),
    Everything,
}

impl VacancyScope {
    pub fn for_caller(caller: &Caller, filter: &VacancyFilter) -> Self {
        match caller {
            Caller::Employer(account) => {
                if query_flag(filter.my.as_deref()) || query_flag(filter.show_all.as_deref()) {
                    VacancyScope::OwnedBy(account.id)
                } else {
                    VacancyScope::ActiveOrOwnedBy(account.id)
                }
            }
            Caller::Admin(_) => VacancyScope::Everything,
            Caller::Anonymous | Caller::Student(_) | Caller::Unassigned(_) => {
                VacancyScope::ActiveOnly
            }
        }
    }
}

/// Normalised listing query handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacancyQuery {
    pub scope: VacancyScope,
    pub vacancy_type: Option<String>,
    pub category: Option<CategoryId>,
    pub search: Option<String>,
}

impl VacancyQuery {
    pub fn new(caller: &Caller, filter: &VacancyFilter) -> Self {
        Self {
            scope: VacancyScope::for_caller(caller, filter),
            vacancy_type: filter
                .vacancy_type
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            category: query_id(filter.category.as_deref()).map(CategoryId),
            search: filter
                .search
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }
    }
}
