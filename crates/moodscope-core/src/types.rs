//! Core types for moodscope

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Three-way sentiment label
///
/// Serialized as its class index so that trained models, JSON reports and
/// corpus markers all agree on the same numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Label {
    /// Class 0
    Negative,
    /// Class 1, also the fallback class for unknown corpus markers
    Neutral,
    /// Class 2
    Positive,
}

impl Label {
    /// All labels in class-index order
    pub const ALL: [Label; 3] = [Label::Negative, Label::Neutral, Label::Positive];

    /// Class index (0, 1 or 2)
    pub fn index(self) -> usize {
        match self {
            Self::Negative => 0,
            Self::Neutral => 1,
            Self::Positive => 2,
        }
    }

    /// Label for a class index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.index() as u8
    }
}

impl TryFrom<u8> for Label {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Label::from_index(value as usize).ok_or_else(|| format!("invalid label index {value}"))
    }
}

/// Author of a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub screen_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub profile_url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub verified: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub verified_type: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub profile_image_url: String,
}

impl User {
    /// Stand-in author used when a post arrives without user information
    pub fn placeholder() -> Self {
        Self {
            id: "123456".to_string(),
            screen_name: "weibo".to_string(),
            profile_url: String::new(),
            verified: false,
            verified_type: 0,
            profile_image_url: String::new(),
        }
    }
}

/// A post as delivered by the platform timeline API
///
/// Every field may be absent or `null` on real payloads; missing values
/// deserialize to defaults or have a default-value accessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,

    /// Platform timestamp, e.g. `Sun Jun 30 12:27:28 +0800 2013`
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reposts_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_pic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_pic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Box<Post>>,
}

impl Post {
    /// Create a post with only text set
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            text: text.into(),
            created_at: String::new(),
            user: None,
            reposts_count: None,
            comments_count: None,
            original_pic: None,
            thumbnail_pic: None,
            retweeted_status: None,
        }
    }

    /// Attach a retweeted post
    pub fn with_retweet(mut self, retweet: Post) -> Self {
        self.retweeted_status = Some(Box::new(retweet));
        self
    }

    /// Set the creation timestamp
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    /// The retweeted post, if any
    pub fn retweet(&self) -> Option<&Post> {
        self.retweeted_status.as_deref()
    }

    /// Text used for classification: own text followed directly by the
    /// retweeted text (one level only)
    pub fn combined_text(&self) -> String {
        match self.retweet() {
            Some(retweet) => format!("{}{}", self.text, retweet.text),
            None => self.text.clone(),
        }
    }

    pub fn reposts_count_or_default(&self) -> u64 {
        self.reposts_count.unwrap_or(0)
    }

    pub fn comments_count_or_default(&self) -> u64 {
        self.comments_count.unwrap_or(0)
    }

    /// Author, or [`User::placeholder`] when absent
    pub fn user_or_placeholder(&self) -> User {
        self.user.clone().unwrap_or_else(User::placeholder)
    }
}

/// Accept ids encoded as JSON strings or numbers; `null` becomes empty
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Str(String),
        Num(i64),
        Unsigned(u64),
        Float(f64),
    }

    Ok(match Option::<Repr>::deserialize(deserializer)? {
        Some(Repr::Str(s)) => s,
        Some(Repr::Num(n)) => n.to_string(),
        Some(Repr::Unsigned(n)) => n.to_string(),
        Some(Repr::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
