use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Role & Gender
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Student,
  Teacher,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Student => "student",
      Role::Teacher => "teacher",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Role {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "student" => Ok(Self::Student),
      "teacher" => Ok(Self::Teacher),
      _ => Err(format!("Unknown role: {}", s)),
    }
  }
}

/// Only the synthetic generator looks at gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
  Male,
  Female,
}

impl Gender {
  pub fn as_str(&self) -> &'static str {
    match self {
      Gender::Male => "male",
      Gender::Female => "female",
    }
  }
}

impl std::str::FromStr for Gender {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "male" => Ok(Self::Male),
      "female" => Ok(Self::Female),
      _ => Err(format!("Unknown gender: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// User
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i64,
  pub email: String,
  pub name: String,
  pub role: Role,
  /// 9-12 for students
  pub grade: Option<i64>,
  pub gender: Option<Gender>,
  pub created_at: DateTime<Utc>,
}

/// For inserting new users (without id, created_at)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  pub email: String,
  pub name: String,
  pub role: Role,
  pub grade: Option<i64>,
  pub gender: Option<Gender>,
}

/// Raw `users` row; role and gender are stored as text
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
  pub id: i64,
  pub email: String,
  pub name: String,
  pub role: String,
  pub grade: Option<i64>,
  pub gender: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
  type Error = String;

  fn try_from(row: UserRow) -> Result<Self, Self::Error> {
    let gender = match row.gender.as_deref() {
      Some(g) => Some(g.parse()?),
      None => None,
    };

    Ok(User {
      id: row.id,
      email: row.email,
      name: row.name,
      role: row.role.parse()?,
      grade: row.grade,
      gender,
      created_at: row.created_at,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Current User (identity provider contract)
/// ---------------------------------------------------------------------------

/// The signed-in identity as seen by the live flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
  pub id: i64,
  pub role: Role,
  pub grade: Option<i64>,
  pub gender: Option<Gender>,
}

impl From<&User> for CurrentUser {
  fn from(user: &User) -> Self {
    Self {
      id: user.id,
      role: user.role,
      grade: user.grade,
      gender: user.gender,
    }
  }
}
