//! Skill discovery against fixture directories.

use skiff_skills::SkillCatalog;
use std::path::Path;
use tempfile::TempDir;

fn write_skill(dir: &Path, name: &str, description: &str, body: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join("SKILL.md"),
        format!("---\nname: {}\ndescription: {}\n---\n{}\n", name, description, body),
    )
    .unwrap();
}

#[tokio::test]
async fn test_discover_nested_skills() {
    let temp = TempDir::new().unwrap();
    let skills_dir = temp.path().join("skills");
    write_skill(&skills_dir.join("alpha"), "alpha", "First skill", "Alpha body");
    write_skill(
        &skills_dir.join("group").join("beta"),
        "beta",
        "Second skill",
        "Beta body",
    );

    let catalog = SkillCatalog::discover(&skills_dir).await;

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get("alpha").unwrap().body, "Alpha body");
    assert_eq!(catalog.get("beta").unwrap().description, "Second skill");
    assert!(catalog.get("gamma").is_none());
}

#[tokio::test]
async fn test_discover_missing_dir_is_empty() {
    let temp = TempDir::new().unwrap();
    let catalog = SkillCatalog::discover(&temp.path().join("nope")).await;
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn test_malformed_skill_is_skipped() {
    let temp = TempDir::new().unwrap();
    let skills_dir = temp.path().join("skills");
    write_skill(&skills_dir.join("good"), "good", "Valid", "Body");

    let bad_dir = skills_dir.join("bad");
    std::fs::create_dir_all(&bad_dir).unwrap();
    std::fs::write(bad_dir.join("SKILL.md"), "no frontmatter here").unwrap();

    let missing_name = skills_dir.join("unnamed");
    std::fs::create_dir_all(&missing_name).unwrap();
    std::fs::write(
        missing_name.join("SKILL.md"),
        "---\ndescription: only description\n---\nbody\n",
    )
    .unwrap();

    let catalog = SkillCatalog::discover(&skills_dir).await;
    assert_eq!(catalog.len(), 1);
    assert!(catalog.get("good").is_some());
}

#[tokio::test]
async fn test_metadata_prompt_lists_summaries_only() {
    let temp = TempDir::new().unwrap();
    let skills_dir = temp.path().join("skills");
    write_skill(&skills_dir.join("n"), "N", "D", "the full body text");

    let catalog = SkillCatalog::discover(&skills_dir).await;
    let prompt = catalog.metadata_prompt().unwrap();

    assert!(prompt.contains("- `N`: D"));
    assert!(!prompt.contains("the full body text"));
}

#[tokio::test]
async fn test_ignores_other_markdown_files() {
    let temp = TempDir::new().unwrap();
    let skills_dir = temp.path().join("skills");
    write_skill(&skills_dir.join("real"), "real", "Counts", "Body");
    std::fs::write(
        skills_dir.join("README.md"),
        "---\nname: fake\ndescription: not a skill file\n---\nbody\n",
    )
    .unwrap();

    let catalog = SkillCatalog::discover(&skills_dir).await;
    assert_eq!(catalog.len(), 1);
    assert!(catalog.get("fake").is_none());
}
