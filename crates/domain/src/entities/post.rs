use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::entities::User;
use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Friends,
    OnlyMe,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Friends => "friends",
            Visibility::OnlyMe => "onlyme",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "friends" => Ok(Visibility::Friends),
            "onlyme" => Ok(Visibility::OnlyMe),
            other => Err(DomainError::ParseError(format!("unknown visibility: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub timestamp: i64,
}

impl Comment {
    pub fn new(author: &User, text: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: author.uid.clone(),
            user_name: author.full_name(),
            text,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: String,
    pub text: String,
    pub image: String,
    pub visibility: Visibility,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub liked_by: BTreeSet<String>,
    pub comments: Vec<Comment>,
}

impl Post {
    /// Author name and avatar are copied from the profile at posting time.
    pub fn new(author: &User, text: String, image: Option<String>, visibility: Visibility) -> Self {
        let user_name = match author.full_name() {
            name if name.is_empty() => "User".to_string(),
            name => name,
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: author.uid.clone(),
            user_name,
            user_avatar: author.photo_data_url.clone().unwrap_or_default(),
            text,
            image: image.unwrap_or_default(),
            visibility,
            timestamp: Utc::now().timestamp_millis(),
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
        }
    }

    pub fn likes(&self) -> usize {
        self.liked_by.len()
    }

    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.user_id == uid
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.text.trim().is_empty() && self.image.is_empty() {
            return Err(DomainError::ValidationError(
                "A post needs text or an image".to_string(),
            ));
        }
        Ok(())
    }
}
