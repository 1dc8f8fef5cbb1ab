use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type DocId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

/// A ranked search hit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub relevance: f64,
    pub rating: i32,
}

impl Document {
    pub fn new(id: DocId, relevance: f64, rating: i32) -> Self {
        Self { id, relevance, rating }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ document_id = {}, relevance = {}, rating = {} }}",
            self.id, self.relevance, self.rating
        )
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentStatus::Actual => "actual",
            DocumentStatus::Irrelevant => "irrelevant",
            DocumentStatus::Banned => "banned",
            DocumentStatus::Removed => "removed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown document status {0:?}, expected actual, irrelevant, banned or removed")]
pub struct ParseStatusError(String);

impl FromStr for DocumentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "actual" => Ok(DocumentStatus::Actual),
            "irrelevant" => Ok(DocumentStatus::Irrelevant),
            "banned" => Ok(DocumentStatus::Banned),
            "removed" => Ok(DocumentStatus::Removed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_display() {
        let doc = Document::new(2, 0.5, -1);
        assert_eq!(doc.to_string(), "{ document_id = 2, relevance = 0.5, rating = -1 }");
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&DocumentStatus::Banned).unwrap();
        assert_eq!(json, "\"banned\"");
        let back: DocumentStatus = serde_json::from_str("\"irrelevant\"").unwrap();
        assert_eq!(back, DocumentStatus::Irrelevant);
    }

    #[test]
    fn status_from_str() {
        assert_eq!("Banned".parse::<DocumentStatus>(), Ok(DocumentStatus::Banned));
        assert!("deleted".parse::<DocumentStatus>().is_err());
        for status in [DocumentStatus::Actual, DocumentStatus::Removed] {
            assert_eq!(status.to_string().parse::<DocumentStatus>(), Ok(status));
        }
    }
}
