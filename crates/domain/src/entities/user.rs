use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::entities::{Accomplishment, Experience, Skill};
use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Alumni,
    DeptHead,
    AlumniAssociationAdmin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Alumni => "alumni",
            Role::DeptHead => "dept_head",
            Role::AlumniAssociationAdmin => "alumni_association_admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Admin accounts bypass the registration approval gate.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::AlumniAssociationAdmin | Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alumni" => Ok(Role::Alumni),
            "dept_head" => Ok(Role::DeptHead),
            "alumni_association_admin" => Ok(Role::AlumniAssociationAdmin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(DomainError::ParseError(format!("unknown role: {}", other))),
        }
    }
}

/// The only roles an administrator may hand out from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignableRole {
    Alumni,
    DeptHead,
}

impl From<AssignableRole> for Role {
    fn from(role: AssignableRole) -> Self {
        match role {
            AssignableRole::Alumni => Role::Alumni,
            AssignableRole::DeptHead => Role::DeptHead,
        }
    }
}

/// Review state shared by registrations and digital ID requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(DomainError::ParseError(format!("unknown status: {}", other))),
        }
    }
}

/// Profile details collected by the registration form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationDetails {
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub province: Option<String>,
    pub school_department: Option<String>,
    pub course: Option<String>,
    pub student_id: Option<String>,
    pub year_graduated: Option<String>,
    pub phone: Option<String>,
}

/// Self-service profile edit. Fields left as `None` are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub province: Option<String>,
    pub school_department: Option<String>,
    pub course: Option<String>,
    pub student_id: Option<String>,
    pub year_graduated: Option<String>,
    pub phone: Option<String>,
    pub photo_data_url: Option<String>,
    pub summary: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }

    pub fn apply_to(self, user: &mut User) {
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if self.address.is_some() {
            user.address = self.address;
        }
        if self.province.is_some() {
            user.province = self.province;
        }
        if self.school_department.is_some() {
            user.school_department = self.school_department;
        }
        if self.course.is_some() {
            user.course = self.course;
        }
        if self.student_id.is_some() {
            user.student_id = self.student_id;
        }
        if self.year_graduated.is_some() {
            user.year_graduated = self.year_graduated;
        }
        if self.phone.is_some() {
            user.phone = self.phone;
        }
        if self.photo_data_url.is_some() {
            user.photo_data_url = self.photo_data_url;
        }
        if self.summary.is_some() {
            user.summary = self.summary;
        }
    }
}

/// Core User entity - the member record every workflow reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub province: Option<String>,
    pub school_department: Option<String>,
    pub course: Option<String>,
    pub student_id: Option<String>,
    pub year_graduated: Option<String>,
    pub phone: Option<String>,
    pub photo_data_url: Option<String>,
    pub summary: Option<String>,
    pub role: Role,
    pub status: ApprovalStatus,
    pub is_locked: bool,
    pub digital_id_status: Option<ApprovalStatus>,
    pub connections: BTreeSet<String>,
    pub experiences: Vec<Experience>,
    pub skills: Vec<Skill>,
    pub accomplishments: Vec<Accomplishment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A freshly registered member: pending review, plain alumni role.
    pub fn new_registration(uid: String, email: String, details: RegistrationDetails) -> Self {
        let now = Utc::now();
        Self {
            uid,
            email,
            first_name: details.first_name,
            last_name: details.last_name,
            address: details.address,
            province: details.province,
            school_department: details.school_department,
            course: details.course,
            student_id: details.student_id,
            year_graduated: details.year_graduated,
            phone: details.phone,
            photo_data_url: None,
            summary: None,
            role: Role::Alumni,
            status: ApprovalStatus::Pending,
            is_locked: false,
            digital_id_status: None,
            connections: BTreeSet::new(),
            experiences: Vec::new(),
            skills: Vec::new(),
            accomplishments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bootstrap record for an administrator created outside the
    /// registration flow. Admins start approved.
    pub fn new_admin(uid: String, email: String, display_name: &str, role: Role) -> Self {
        let (first_name, last_name) = match display_name.trim().split_once(' ') {
            Some((first, last)) => (first.to_string(), last.trim().to_string()),
            None => (display_name.trim().to_string(), String::new()),
        };
        let mut user = Self::new_registration(
            uid,
            email,
            RegistrationDetails {
                first_name,
                last_name,
                ..RegistrationDetails::default()
            },
        );
        user.role = role;
        user.status = ApprovalStatus::Approved;
        user
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Whether the account may use anything beyond the auth screens.
    pub fn can_access_app(&self) -> bool {
        !self.is_locked && (self.role.is_admin() || self.status == ApprovalStatus::Approved)
    }

    pub fn is_connected_to(&self, uid: &str) -> bool {
        self.connections.contains(uid)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.uid.trim().is_empty() {
            return Err(DomainError::ValidationError("User id cannot be empty".to_string()));
        }

        if self.email.trim().is_empty() {
            return Err(DomainError::ValidationError("Email cannot be empty".to_string()));
        }

        if !self.email.contains('@') {
            return Err(DomainError::ValidationError("Invalid email format".to_string()));
        }

        if !self.role.is_admin() && self.first_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "First name cannot be empty".to_string(),
            ));
        }

        if self.role == Role::DeptHead && self.department().is_none() {
            return Err(DomainError::ValidationError(
                "A department head must have a department".to_string(),
            ));
        }

        Ok(())
    }

    /// The school department, ignoring blank values.
    pub fn department(&self) -> Option<&str> {
        self.school_department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}
