//! Skill catalog.
//!
//! Skills are guidance documents discovered once at startup from
//! `<skills_dir>/**/SKILL.md`. The catalog is immutable afterwards and
//! exposes two tiers: a one-line summary per skill for the system prompt,
//! and the full body on demand by exact name.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One loaded skill.
#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub body: String,
    pub path: PathBuf,
}

impl Skill {
    /// One-line summary used in system prompt injection.
    pub fn summary_line(&self) -> String {
        format!("- `{}`: {}", self.name, self.description)
    }

    /// Full skill text for on-demand loading via `get_skill`.
    pub fn full_text(&self) -> String {
        format!(
            "# Skill: {}\n\n{}\n\nSkill file: `{}`\n\n{}",
            self.name,
            self.description,
            self.path.display(),
            self.body
        )
    }
}

/// Immutable name-to-skill lookup, populated once at startup.
#[derive(Debug, Default)]
pub struct SkillCatalog {
    skills: HashMap<String, Skill>,
}

impl SkillCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Walk `skills_dir` for `SKILL.md` files and load every parseable one.
    /// Files without valid frontmatter are skipped with a warning, not an
    /// error; a missing directory yields an empty catalog.
    pub async fn discover(skills_dir: &Path) -> Self {
        let mut skills = HashMap::new();

        if !skills_dir.exists() {
            debug!("no skills directory at {:?}", skills_dir);
            return Self { skills };
        }

        let mut pending = vec![skills_dir.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("skipping unreadable directory {:?}: {}", dir, e);
                    continue;
                }
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.file_name().map(|n| n == "SKILL.md").unwrap_or(false) {
                    match load_skill(&path).await {
                        Some(skill) => {
                            debug!("loaded skill `{}` from {:?}", skill.name, path);
                            skills.insert(skill.name.clone(), skill);
                        }
                        None => warn!("skipping malformed skill file {:?}", path),
                    }
                }
            }
        }

        Self { skills }
    }

    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.get(name)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Metadata-only prompt section listing every skill, or `None` when the
    /// catalog is empty. Lines are sorted for stable prompts.
    pub fn metadata_prompt(&self) -> Option<String> {
        if self.skills.is_empty() {
            return None;
        }
        let mut lines = vec![
            "## Available Skills".to_string(),
            "You can load full skill guidance with `get_skill` when needed.".to_string(),
        ];
        let mut summaries: Vec<String> = self.skills.values().map(Skill::summary_line).collect();
        summaries.sort();
        lines.extend(summaries);
        Some(lines.join("\n"))
    }
}

/// Load one SKILL.md file: `---` frontmatter with `name:` and
/// `description:`, then the body.
async fn load_skill(path: &Path) -> Option<Skill> {
    let raw = tokio::fs::read_to_string(path).await.ok()?;

    let re = Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---\r?\n(.*)\z").expect("valid regex");
    let captures = re.captures(&raw)?;
    let frontmatter = parse_frontmatter(captures.get(1)?.as_str());
    let body = captures.get(2)?.as_str().trim().to_string();

    let name = frontmatter.get("name")?.clone();
    let description = frontmatter.get("description")?.clone();
    if name.is_empty() || description.is_empty() {
        return None;
    }

    Some(Skill {
        name,
        description,
        body,
        path: path.to_path_buf(),
    })
}

/// Parse simple `key: value` frontmatter lines.
fn parse_frontmatter(text: &str) -> HashMap<String, String> {
    let mut parsed = HashMap::new();
    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = stripped.split_once(':') {
            parsed.insert(
                key.trim().to_string(),
                value.trim().trim_matches(|c| c == '"' || c == '\'').to_string(),
            );
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frontmatter() {
        let parsed = parse_frontmatter("name: demo\ndescription: \"A demo skill\"\n# comment\n");
        assert_eq!(parsed.get("name").unwrap(), "demo");
        assert_eq!(parsed.get("description").unwrap(), "A demo skill");
        assert!(!parsed.contains_key("# comment"));
    }

    #[test]
    fn test_summary_line() {
        let skill = Skill {
            name: "N".to_string(),
            description: "D".to_string(),
            body: "body".to_string(),
            path: PathBuf::from("skills/n/SKILL.md"),
        };
        assert_eq!(skill.summary_line(), "- `N`: D");
    }

    #[test]
    fn test_full_text_includes_body_and_source() {
        let skill = Skill {
            name: "N".to_string(),
            description: "D".to_string(),
            body: "full guidance".to_string(),
            path: PathBuf::from("skills/n/SKILL.md"),
        };
        let text = skill.full_text();
        assert!(text.starts_with("# Skill: N"));
        assert!(text.contains("full guidance"));
        assert!(text.contains("skills/n/SKILL.md"));
    }

    #[test]
    fn test_metadata_prompt_empty_catalog() {
        assert!(SkillCatalog::empty().metadata_prompt().is_none());
    }
}
