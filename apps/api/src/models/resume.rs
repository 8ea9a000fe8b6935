use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::generate_id;

// ────────────────────────────────────────────────────────────────────────────
// Document entities
// ────────────────────────────────────────────────────────────────────────────
//
// Field names serialize in camelCase: the local cache and the remote row both
// carry this exact JSON shape.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    /// `YYYY-MM`, or empty.
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    /// Empty strings are valid placeholders and are never pruned implicitly.
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// The full résumé: personal info plus four ordered lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub personal_info: PersonalInfo,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
}

impl Education {
    pub fn blank(id: String) -> Self {
        Self {
            id,
            institution: String::new(),
            degree: String::new(),
            field_of_study: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            description: String::new(),
        }
    }
}

impl Experience {
    /// A blank experience always starts with one empty bullet.
    pub fn blank(id: String) -> Self {
        Self {
            id,
            company: String::new(),
            position: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            description: String::new(),
            bullets: vec![String::new()],
        }
    }
}

impl Skill {
    pub fn blank(id: String) -> Self {
        Self {
            id,
            name: String::new(),
            level: SkillLevel::Intermediate,
        }
    }
}

impl Project {
    /// A blank project always starts with one empty technology.
    pub fn blank(id: String) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            technologies: vec![String::new()],
            link: None,
        }
    }
}

impl ResumeDocument {
    /// The default skeleton: one blank item per list, each with a freshly generated id.
    pub fn skeleton() -> Self {
        Self {
            personal_info: PersonalInfo::default(),
            education: vec![Education::blank(generate_id())],
            experience: vec![Experience::blank(generate_id())],
            skills: vec![Skill::blank(generate_id())],
            projects: vec![Project::blank(generate_id())],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Template selector
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeTemplate {
    #[default]
    Modern,
    Classic,
    Minimal,
}

impl ResumeTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeTemplate::Modern => "modern",
            ResumeTemplate::Classic => "classic",
            ResumeTemplate::Minimal => "minimal",
        }
    }
}

impl fmt::Display for ResumeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown template '{0}'")]
pub struct UnknownTemplate(pub String);

impl FromStr for ResumeTemplate {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modern" => Ok(ResumeTemplate::Modern),
            "classic" => Ok(ResumeTemplate::Classic),
            "minimal" => Ok(ResumeTemplate::Minimal),
            other => Err(UnknownTemplate(other.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Typed patches
// ────────────────────────────────────────────────────────────────────────────
//
// One patch struct per entity. `None` leaves a field untouched. Ids are not
// patchable.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersonalInfoPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub summary: Option<String>,
}

impl PersonalInfoPatch {
    pub fn apply(self, info: &mut PersonalInfo) {
        if let Some(v) = self.full_name {
            info.full_name = v;
        }
        if let Some(v) = self.email {
            info.email = v;
        }
        if let Some(v) = self.phone {
            info.phone = v;
        }
        if let Some(v) = self.location {
            info.location = v;
        }
        if let Some(v) = self.website {
            info.website = Some(v);
        }
        if let Some(v) = self.linkedin {
            info.linkedin = Some(v);
        }
        if let Some(v) = self.github {
            info.github = Some(v);
        }
        if let Some(v) = self.summary {
            info.summary = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EducationPatch {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

impl EducationPatch {
    pub fn apply(self, edu: &mut Education) {
        if let Some(v) = self.institution {
            edu.institution = v;
        }
        if let Some(v) = self.degree {
            edu.degree = v;
        }
        if let Some(v) = self.field_of_study {
            edu.field_of_study = v;
        }
        if let Some(v) = self.start_date {
            edu.start_date = v;
        }
        if let Some(v) = self.end_date {
            edu.end_date = v;
        }
        if let Some(v) = self.description {
            edu.description = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExperiencePatch {
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
    pub bullets: Option<Vec<String>>,
}

impl ExperiencePatch {
    pub fn apply(self, exp: &mut Experience) {
        if let Some(v) = self.company {
            exp.company = v;
        }
        if let Some(v) = self.position {
            exp.position = v;
        }
        if let Some(v) = self.start_date {
            exp.start_date = v;
        }
        if let Some(v) = self.end_date {
            exp.end_date = v;
        }
        if let Some(v) = self.description {
            exp.description = v;
        }
        if let Some(v) = self.bullets {
            exp.bullets = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub level: Option<SkillLevel>,
}

impl SkillPatch {
    pub fn apply(self, skill: &mut Skill) {
        if let Some(v) = self.name {
            skill.name = v;
        }
        if let Some(v) = self.level {
            skill.level = v;
        }
    }
}

/// Technologies arrive either as a list or as the raw comma-delimited form input.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TechnologiesInput {
    List(Vec<String>),
    Raw(String),
}

impl TechnologiesInput {
    pub fn into_list(self) -> Vec<String> {
        match self {
            TechnologiesInput::List(list) => list,
            TechnologiesInput::Raw(raw) => split_technologies(&raw),
        }
    }
}

/// Splits comma-delimited input and trims each piece. Empty pieces are kept.
pub fn split_technologies(raw: &str) -> Vec<String> {
    raw.split(',').map(|t| t.trim().to_string()).collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<TechnologiesInput>,
    pub link: Option<String>,
}

impl ProjectPatch {
    pub fn apply(self, project: &mut Project) {
        if let Some(v) = self.name {
            project.name = v;
        }
        if let Some(v) = self.description {
            project.description = v;
        }
        if let Some(v) = self.technologies {
            project.technologies = v.into_list();
        }
        if let Some(v) = self.link {
            project.link = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_shape() {
        let doc = ResumeDocument::skeleton();
        assert_eq!(doc.education.len(), 1);
        assert_eq!(doc.experience[0].bullets, vec![String::new()]);
        assert_eq!(doc.skills[0].level, SkillLevel::Intermediate);
        assert_eq!(doc.projects[0].technologies, vec![String::new()]);
        assert_eq!(doc.personal_info, PersonalInfo::default());
    }

    #[test]
    fn test_skeleton_ids_are_fresh() {
        let a = ResumeDocument::skeleton();
        let b = ResumeDocument::skeleton();
        assert_ne!(a.education[0].id, b.education[0].id);
    }

    #[test]
    fn test_document_serializes_camel_case() {
        let mut doc = ResumeDocument::skeleton();
        doc.personal_info.full_name = "Alex".to_string();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["personalInfo"]["fullName"], "Alex");
        assert_eq!(json["skills"][0]["level"], "Intermediate");
        assert!(json["education"][0].get("fieldOfStudy").is_some());
    }

    #[test]
    fn test_cache_round_trip() {
        let mut doc = ResumeDocument::skeleton();
        doc.personal_info.github = Some("alex-dev".to_string());
        doc.experience[0].bullets.push("Shipped X".to_string());
        let json = serde_json::to_string(&doc).unwrap();
        let back: ResumeDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_loads_document_with_blank_link_fields() {
        let json = r#"{
            "personalInfo": {"fullName": "Alex", "email": "", "phone": "", "location": "",
                             "website": "", "linkedin": "", "github": "", "summary": ""},
            "education": [], "experience": [],
            "skills": [{"id": "abc", "name": "Go"}],
            "projects": []
        }"#;
        let doc: ResumeDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.personal_info.website.as_deref(), Some(""));
        assert_eq!(doc.skills[0].level, SkillLevel::Intermediate);
    }

    #[test]
    fn test_template_parse() {
        assert_eq!("classic".parse::<ResumeTemplate>().unwrap(), ResumeTemplate::Classic);
        assert!("fancy".parse::<ResumeTemplate>().is_err());
        assert_eq!(ResumeTemplate::default(), ResumeTemplate::Modern);
    }

    #[test]
    fn test_personal_info_patch_is_shallow_merge() {
        let mut info = PersonalInfo {
            email: "a@b.c".to_string(),
            ..Default::default()
        };
        PersonalInfoPatch {
            full_name: Some("Jane Doe".to_string()),
            ..Default::default()
        }
        .apply(&mut info);
        assert_eq!(info.full_name, "Jane Doe");
        assert_eq!(info.email, "a@b.c");
    }

    #[test]
    fn test_split_technologies_trims() {
        assert_eq!(
            split_technologies("Rust,  Tokio , axum"),
            vec!["Rust", "Tokio", "axum"]
        );
        assert_eq!(split_technologies(""), vec![""]);
    }

    #[test]
    fn test_project_patch_accepts_raw_technologies() {
        let patch: ProjectPatch =
            serde_json::from_str(r#"{"technologies": "Rust, SQL"}"#).unwrap();
        let mut project = Project::blank("p1".to_string());
        patch.apply(&mut project);
        assert_eq!(project.technologies, vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_patch_rejects_id_field() {
        assert!(serde_json::from_str::<SkillPatch>(r#"{"id": "x"}"#).is_err());
    }
}
