use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

impl Gender {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "man" => Self::Male,
            "female" | "f" | "woman" => Self::Female,
            "other" | "o" | "nonbinary" | "non-binary" => Self::Other,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for Gender {
    fn from(value: String) -> Self {
        Self::from_token(&value)
    }
}

impl From<Gender> for String {
    fn from(value: Gender) -> Self {
        value.as_str().to_string()
    }
}

/// A person in the family graph. Supplied fully formed by the input provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_death: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl Member {
    pub fn new(id: impl Into<String>, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            gender,
            date_of_birth: None,
            date_of_death: None,
            image_ref: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    #[serde(alias = "spouse", alias = "PARTNER", alias = "partner", alias = "MARRIAGE")]
    Spouse,
    #[serde(alias = "parent")]
    Parent,
}

/// `Spouse` edges are symmetric; `Parent` edges point from parent to child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    pub from_id: String,
    pub to_id: String,
    #[serde(alias = "type")]
    pub kind: EdgeKind,
}

impl RelationshipEdge {
    pub fn spouse(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            from_id: a.into(),
            to_id: b.into(),
            kind: EdgeKind::Spouse,
        }
    }

    pub fn parent(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            from_id: parent.into(),
            to_id: child.into(),
            kind: EdgeKind::Parent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyGraph {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default, alias = "connections")]
    pub edges: Vec<RelationshipEdge>,
}

impl FamilyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member unless one with the same id already exists. Returns whether it was added.
    pub fn add_member(&mut self, member: Member) -> bool {
        if self.member(&member.id).is_some() {
            return false;
        }
        self.members.push(member);
        true
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }
}
