//! Topic seed file.
//!
//! Operators bootstrap a user's topic catalogue from a YAML file keyed by
//! user id; `postpilot-db` upserts the parsed entries in one transaction.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub tone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTopics {
    pub user_id: Uuid,
    pub topics: Vec<TopicConfig>,
}

#[derive(Debug, Deserialize)]
pub struct TopicsFile {
    pub users: Vec<UserTopics>,
}

/// Load and validate a topics seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_topics(path: &Path) -> Result<TopicsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TopicsFileIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    let topics_file: TopicsFile = serde_yaml::from_str(&content)?;
    validate_topics(&topics_file)?;
    Ok(topics_file)
}

fn validate_topics(file: &TopicsFile) -> Result<(), ConfigError> {
    for user in &file.users {
        if user.topics.is_empty() {
            return Err(ConfigError::Validation(format!(
                "user {} has no topics",
                user.user_id
            )));
        }
        let mut seen = HashSet::new();
        for topic in &user.topics {
            if topic.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "user {} has a topic with an empty name",
                    user.user_id
                )));
            }
            if topic.tone.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "topic '{}' for user {} has an empty tone",
                    topic.name, user.user_id
                )));
            }
            // Selection matches topics by name; duplicate names would be
            // indistinguishable to the anti-repetition filter.
            if !seen.insert(topic.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate topic name '{}' for user {}",
                    topic.name, user.user_id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r"
users:
  - user_id: 8c0f6f4e-2f7c-4f4e-9b1a-3d2a1e5c8d91
    topics:
      - name: Product updates
        description: release notes and roadmap teasers
        keywords: [release, roadmap]
        tone: professional
      - name: Behind the scenes
        tone: casual
";

    #[test]
    fn parses_valid_file() {
        let file: TopicsFile = serde_yaml::from_str(VALID).unwrap();
        validate_topics(&file).unwrap();
        assert_eq!(file.users.len(), 1);
        assert_eq!(file.users[0].topics.len(), 2);
        assert_eq!(file.users[0].topics[0].keywords, vec!["release", "roadmap"]);
        assert!(file.users[0].topics[1].description.is_none());
    }

    #[test]
    fn rejects_user_without_topics() {
        let raw = r"
users:
  - user_id: 8c0f6f4e-2f7c-4f4e-9b1a-3d2a1e5c8d91
    topics: []
";
        let file: TopicsFile = serde_yaml::from_str(raw).unwrap();
        assert!(matches!(
            validate_topics(&file),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_duplicate_topic_names() {
        let raw = r"
users:
  - user_id: 8c0f6f4e-2f7c-4f4e-9b1a-3d2a1e5c8d91
    topics:
      - name: Product updates
        tone: professional
      - name: Product updates
        tone: casual
";
        let file: TopicsFile = serde_yaml::from_str(raw).unwrap();
        assert!(matches!(
            validate_topics(&file),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_tone() {
        let raw = r"
users:
  - user_id: 8c0f6f4e-2f7c-4f4e-9b1a-3d2a1e5c8d91
    topics:
      - name: Product updates
        tone: '  '
";
        let file: TopicsFile = serde_yaml::from_str(raw).unwrap();
        assert!(matches!(
            validate_topics(&file),
            Err(ConfigError::Validation(_))
        ));
    }
}
