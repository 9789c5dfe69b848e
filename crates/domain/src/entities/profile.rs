use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Years accepted on an experience entry.
pub const EXPERIENCE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_month: Option<u32>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_month: Option<u32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub currently_working: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl Experience {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::ValidationError("Title is required".to_string()));
        }
        if self.company.trim().is_empty() {
            return Err(DomainError::ValidationError("Company is required".to_string()));
        }
        for month in [self.start_month, self.end_month].into_iter().flatten() {
            if !(1..=12).contains(&month) {
                return Err(DomainError::ValidationError(format!(
                    "Invalid month: {}",
                    month
                )));
            }
        }
        for year in [self.start_year, self.end_year].into_iter().flatten() {
            if !EXPERIENCE_YEARS.contains(&year) {
                return Err(DomainError::ValidationError(format!(
                    "Invalid year: {}",
                    year
                )));
            }
        }
        if !self.currently_working && (self.end_month.is_none() || self.end_year.is_none()) {
            return Err(DomainError::ValidationError(
                "End date is required unless currently working".to_string(),
            ));
        }
        if !self.currently_working {
            if let (Some(start_year), Some(end_year)) = (self.start_year, self.end_year) {
                let start = (start_year, self.start_month.unwrap_or(1));
                let end = (end_year, self.end_month.unwrap_or(1));
                if end < start {
                    return Err(DomainError::ValidationError(
                        "End date cannot be before the start date".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// (year, month) the role ended, or `today` for a current role.
    fn end_key(&self, today: NaiveDate) -> (i32, u32) {
        if self.currently_working {
            (today.year(), today.month())
        } else {
            (self.end_year.unwrap_or(0), self.end_month.unwrap_or(1))
        }
    }

    /// Whole months between the start and end of the role, never negative.
    pub fn months(&self, today: NaiveDate) -> u32 {
        let (start_year, start_month) = (self.start_year.unwrap_or(0), self.start_month.unwrap_or(1));
        let (end_year, end_month) = self.end_key(today);
        // Stored rows may predate the year bounds, so widen before subtracting.
        let diff = (i64::from(end_year) - i64::from(start_year))
            .saturating_mul(12)
            .saturating_add(i64::from(end_month) - i64::from(start_month));
        u32::try_from(diff.max(0)).unwrap_or(u32::MAX)
    }

    pub fn duration(&self, today: NaiveDate) -> String {
        format_duration(self.months(today))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub proficiency: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Skill {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().chars().count() < 2 {
            return Err(DomainError::ValidationError(
                "Skill name must be at least 2 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accomplishment {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub date_earned: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Accomplishment {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().chars().count() < 3 {
            return Err(DomainError::ValidationError(
                "Title must be at least 3 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileItemKind {
    Experience,
    Skill,
    Accomplishment,
}

impl ProfileItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileItemKind::Experience => "experience",
            ProfileItemKind::Skill => "skill",
            ProfileItemKind::Accomplishment => "accomplishment",
        }
    }
}

impl fmt::Display for ProfileItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileItemKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "experience" => Ok(ProfileItemKind::Experience),
            "skill" => Ok(ProfileItemKind::Skill),
            "accomplishment" => Ok(ProfileItemKind::Accomplishment),
            other => Err(DomainError::ParseError(format!(
                "unknown profile item kind: {}",
                other
            ))),
        }
    }
}

/// One entry of a member's nested profile lists. Each is stored as its own
/// row so appends and removals never rewrite the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileItem {
    Experience(Experience),
    Skill(Skill),
    Accomplishment(Accomplishment),
}

impl ProfileItem {
    pub fn id(&self) -> &str {
        match self {
            ProfileItem::Experience(e) => &e.id,
            ProfileItem::Skill(s) => &s.id,
            ProfileItem::Accomplishment(a) => &a.id,
        }
    }

    pub fn kind(&self) -> ProfileItemKind {
        match self {
            ProfileItem::Experience(_) => ProfileItemKind::Experience,
            ProfileItem::Skill(_) => ProfileItemKind::Skill,
            ProfileItem::Accomplishment(_) => ProfileItemKind::Accomplishment,
        }
    }

    pub fn set_id(&mut self, id: String) {
        match self {
            ProfileItem::Experience(e) => e.id = id,
            ProfileItem::Skill(s) => s.id = id,
            ProfileItem::Accomplishment(a) => a.id = id,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            ProfileItem::Experience(e) => e.validate(),
            ProfileItem::Skill(s) => s.validate(),
            ProfileItem::Accomplishment(a) => a.validate(),
        }
    }
}

/// All roles a member held at one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyGroup {
    pub name: String,
    pub total_duration: String,
    pub roles: Vec<Experience>,
}

/// "1 mo", "5 mos", "1 yr", "3 yrs", "2 yrs 1 mo".
pub fn format_duration(total_months: u32) -> String {
    let years = total_months / 12;
    let months = total_months % 12;
    let year_text = if years == 1 { "1 yr".to_string() } else { format!("{} yrs", years) };
    let month_text = if months == 1 { "1 mo".to_string() } else { format!("{} mos", months) };

    if years == 0 {
        month_text
    } else if months == 0 {
        year_text
    } else {
        format!("{} {}", year_text, month_text)
    }
}

/// Groups experiences by company. Roles inside a company and the companies
/// themselves are ordered newest first; current roles end at `today`.
pub fn group_experiences(experiences: &[Experience], today: NaiveDate) -> Vec<CompanyGroup> {
    let mut companies: Vec<(String, Vec<Experience>)> = Vec::new();
    for exp in experiences {
        let name = match exp.company.trim() {
            "" => UNKNOWN_COMPANY.to_string(),
            company => company.to_string(),
        };
        match companies.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, roles)) => roles.push(exp.clone()),
            None => companies.push((name, vec![exp.clone()])),
        }
    }

    let mut grouped: Vec<CompanyGroup> = companies
        .into_iter()
        .map(|(name, mut roles)| {
            roles.sort_by(|a, b| b.end_key(today).cmp(&a.end_key(today)));
            let total = roles
                .iter()
                .fold(0u32, |acc, r| acc.saturating_add(r.months(today)));
            CompanyGroup {
                name,
                total_duration: format_duration(total),
                roles,
            }
        })
        .collect();

    grouped.sort_by(|a, b| {
        let a_key = a.roles.first().map(|r| r.end_key(today));
        let b_key = b.roles.first().map(|r| r.end_key(today));
        b_key.cmp(&a_key)
    });
    grouped
}
