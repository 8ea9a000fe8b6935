//! Résumé document store, the single owner of the live document.
//!
//! Every mutation builds a complete new snapshot and publishes it through a
//! `watch` channel, so observers (renderer, local mirror, remote save) only ever
//! see whole documents. Mutators never fail: an unknown id or an out-of-range
//! bullet index leaves the document content unchanged.

pub mod handlers;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::ids::fresh_id;
use crate::models::resume::{
    Education, EducationPatch, Experience, ExperiencePatch, PersonalInfoPatch, Project,
    ProjectPatch, ResumeDocument, ResumeTemplate, Skill, SkillPatch,
};

const RESET_PROMPT: &str =
    "Are you sure you want to reset all resume data? This cannot be undone.";

/// An immutable view of the store at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeSnapshot {
    pub document: ResumeDocument,
    pub template: ResumeTemplate,
    /// Bumped on every mutation. Observability only; saves do not consult it.
    pub revision: u64,
}

/// Blocking yes/no prompt that gates destructive operations.
pub trait Confirmation {
    fn confirm(&self, prompt: &str) -> bool;
}

/// A confirmation answered ahead of time, e.g. by a request body.
pub struct Answered(pub bool);

impl Confirmation for Answered {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

pub struct DocumentStore {
    tx: watch::Sender<Arc<ResumeSnapshot>>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Creates a store holding the default skeleton and the default template.
    pub fn new() -> Self {
        Self::with_document(ResumeDocument::skeleton(), ResumeTemplate::default())
    }

    pub fn with_document(document: ResumeDocument, template: ResumeTemplate) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(ResumeSnapshot {
            document,
            template,
            revision: 0,
        }));
        Self { tx }
    }

    pub fn snapshot(&self) -> Arc<ResumeSnapshot> {
        self.tx.borrow().clone()
    }

    /// Receives every published snapshot. The current one is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ResumeSnapshot>> {
        self.tx.subscribe()
    }

    /// Applies `mutate` to a copy of the current snapshot and publishes the result.
    fn commit(&self, op: &str, mutate: impl FnOnce(&mut ResumeSnapshot)) -> Arc<ResumeSnapshot> {
        let mut published = None;
        self.tx.send_modify(|current| {
            let mut next = ResumeSnapshot::clone(current);
            mutate(&mut next);
            next.revision += 1;
            let next = Arc::new(next);
            published = Some(next.clone());
            *current = next;
        });
        let snapshot = published.unwrap_or_else(|| self.snapshot());
        debug!("{op} → revision {}", snapshot.revision);
        snapshot
    }

    // ── Personal info ───────────────────────────────────────────────────────

    pub fn update_personal_info(&self, patch: PersonalInfoPatch) -> Arc<ResumeSnapshot> {
        self.commit("update_personal_info", |s| patch.apply(&mut s.document.personal_info))
    }

    // ── Education ───────────────────────────────────────────────────────────

    /// Appends a blank education entry and returns its id.
    pub fn add_education(&self) -> String {
        let mut new_id = String::new();
        self.commit("add_education", |s| {
            let list = &mut s.document.education;
            new_id = fresh_id(|id| list.iter().any(|e| e.id == id));
            list.push(Education::blank(new_id.clone()));
        });
        new_id
    }

    pub fn update_education(&self, id: &str, patch: EducationPatch) -> Arc<ResumeSnapshot> {
        self.commit("update_education", |s| {
            if let Some(edu) = s.document.education.iter_mut().find(|e| e.id == id) {
                patch.apply(edu);
            }
        })
    }

    pub fn remove_education(&self, id: &str) -> Arc<ResumeSnapshot> {
        self.commit("remove_education", |s| s.document.education.retain(|e| e.id != id))
    }

    // ── Experience ──────────────────────────────────────────────────────────

    /// Appends a blank experience (with one empty bullet) and returns its id.
    pub fn add_experience(&self) -> String {
        let mut new_id = String::new();
        self.commit("add_experience", |s| {
            let list = &mut s.document.experience;
            new_id = fresh_id(|id| list.iter().any(|e| e.id == id));
            list.push(Experience::blank(new_id.clone()));
        });
        new_id
    }

    pub fn update_experience(&self, id: &str, patch: ExperiencePatch) -> Arc<ResumeSnapshot> {
        self.commit("update_experience", |s| {
            if let Some(exp) = s.document.experience.iter_mut().find(|e| e.id == id) {
                patch.apply(exp);
            }
        })
    }

    pub fn remove_experience(&self, id: &str) -> Arc<ResumeSnapshot> {
        self.commit("remove_experience", |s| s.document.experience.retain(|e| e.id != id))
    }

    pub fn add_bullet_to_experience(&self, experience_id: &str) -> Arc<ResumeSnapshot> {
        self.commit("add_bullet_to_experience", |s| {
            if let Some(exp) = find_experience(&mut s.document, experience_id) {
                exp.bullets.push(String::new());
            }
        })
    }

    pub fn update_bullet_in_experience(
        &self,
        experience_id: &str,
        index: usize,
        value: String,
    ) -> Arc<ResumeSnapshot> {
        self.commit("update_bullet_in_experience", |s| {
            if let Some(bullet) = find_experience(&mut s.document, experience_id)
                .and_then(|exp| exp.bullets.get_mut(index))
            {
                *bullet = value;
            }
        })
    }

    pub fn remove_bullet_from_experience(
        &self,
        experience_id: &str,
        index: usize,
    ) -> Arc<ResumeSnapshot> {
        self.commit("remove_bullet_from_experience", |s| {
            if let Some(exp) = find_experience(&mut s.document, experience_id) {
                if index < exp.bullets.len() {
                    exp.bullets.remove(index);
                }
            }
        })
    }

    // ── Skills ──────────────────────────────────────────────────────────────

    /// Appends a blank skill at `Intermediate` and returns its id.
    pub fn add_skill(&self) -> String {
        let mut new_id = String::new();
        self.commit("add_skill", |s| {
            let list = &mut s.document.skills;
            new_id = fresh_id(|id| list.iter().any(|e| e.id == id));
            list.push(Skill::blank(new_id.clone()));
        });
        new_id
    }

    pub fn update_skill(&self, id: &str, patch: SkillPatch) -> Arc<ResumeSnapshot> {
        self.commit("update_skill", |s| {
            if let Some(skill) = s.document.skills.iter_mut().find(|e| e.id == id) {
                patch.apply(skill);
            }
        })
    }

    pub fn remove_skill(&self, id: &str) -> Arc<ResumeSnapshot> {
        self.commit("remove_skill", |s| s.document.skills.retain(|e| e.id != id))
    }

    // ── Projects ────────────────────────────────────────────────────────────

    /// Appends a blank project (with one empty technology) and returns its id.
    pub fn add_project(&self) -> String {
        let mut new_id = String::new();
        self.commit("add_project", |s| {
            let list = &mut s.document.projects;
            new_id = fresh_id(|id| list.iter().any(|e| e.id == id));
            list.push(Project::blank(new_id.clone()));
        });
        new_id
    }

    pub fn update_project(&self, id: &str, patch: ProjectPatch) -> Arc<ResumeSnapshot> {
        self.commit("update_project", |s| {
            if let Some(project) = s.document.projects.iter_mut().find(|e| e.id == id) {
                patch.apply(project);
            }
        })
    }

    pub fn remove_project(&self, id: &str) -> Arc<ResumeSnapshot> {
        self.commit("remove_project", |s| s.document.projects.retain(|e| e.id != id))
    }

    // ── Whole-document operations ───────────────────────────────────────────

    pub fn set_selected_template(&self, template: ResumeTemplate) -> Arc<ResumeSnapshot> {
        self.commit("set_selected_template", |s| s.template = template)
    }

    /// Replaces the document with a fresh skeleton if `confirmation` agrees.
    /// Returns whether the reset happened.
    pub fn reset_resume_data(&self, confirmation: &dyn Confirmation) -> bool {
        if !confirmation.confirm(RESET_PROMPT) {
            debug!("Reset declined");
            return false;
        }
        self.commit("reset_resume_data", |s| s.document = ResumeDocument::skeleton());
        info!("Resume data reset to defaults");
        true
    }

    /// Swaps in a document loaded from a persistence sink. Keeps the template.
    pub fn replace_document(&self, document: ResumeDocument) -> Arc<ResumeSnapshot> {
        self.commit("replace_document", |s| s.document = document)
    }

    /// Swaps in a document and template loaded from the remote store.
    pub fn replace(
        &self,
        document: ResumeDocument,
        template: ResumeTemplate,
    ) -> Arc<ResumeSnapshot> {
        self.commit("replace", |s| {
            s.document = document;
            s.template = template;
        })
    }
}

fn find_experience<'a>(doc: &'a mut ResumeDocument, id: &str) -> Option<&'a mut Experience> {
    doc.experience.iter_mut().find(|e| e.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::models::resume::SkillLevel;

    fn experience_with_one_bullet(store: &DocumentStore) -> String {
        store.snapshot().document.experience[0].id.clone()
    }

    #[test]
    fn test_update_unknown_id_leaves_lists_unchanged() {
        let store = DocumentStore::new();
        let before = store.snapshot();
        let after = store.update_education(
            "missing",
            EducationPatch {
                institution: Some("MIT".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(after.document, before.document);
        store.update_experience("missing", ExperiencePatch::default());
        store.update_skill("missing", SkillPatch::default());
        store.update_project("missing", ProjectPatch::default());
        assert_eq!(store.snapshot().document, before.document);
    }

    #[test]
    fn test_add_grows_by_one_with_distinct_id() {
        let store = DocumentStore::new();
        for _ in 0..20 {
            let before = store.snapshot().document.skills.len();
            let id = store.add_skill();
            let skills = store.snapshot().document.skills.clone();
            assert_eq!(skills.len(), before + 1);
            assert_eq!(skills.iter().filter(|s| s.id == id).count(), 1);
        }
        let ids: HashSet<_> = store
            .snapshot()
            .document
            .skills
            .iter()
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(ids.len(), 21);
    }

    #[test]
    fn test_add_defaults() {
        let store = DocumentStore::new();
        let exp_id = store.add_experience();
        let proj_id = store.add_project();
        let edu_id = store.add_education();
        let doc = store.snapshot().document.clone();
        let exp = doc.experience.iter().find(|e| e.id == exp_id).unwrap();
        assert_eq!(exp.bullets, vec![String::new()]);
        let proj = doc.projects.iter().find(|p| p.id == proj_id).unwrap();
        assert_eq!(proj.technologies, vec![String::new()]);
        assert!(doc.education.iter().any(|e| e.id == edu_id));
    }

    #[test]
    fn test_remove_is_exact_and_idempotent() {
        let store = DocumentStore::new();
        let id = store.add_project();
        assert_eq!(store.snapshot().document.projects.len(), 2);
        let after = store.remove_project(&id);
        assert_eq!(after.document.projects.len(), 1);
        assert!(after.document.projects.iter().all(|p| p.id != id));
        let again = store.remove_project(&id);
        assert_eq!(again.document, after.document);
    }

    #[test]
    fn test_lists_may_become_empty() {
        let store = DocumentStore::new();
        let id = store.snapshot().document.education[0].id.clone();
        let snap = store.remove_education(&id);
        assert!(snap.document.education.is_empty());
        let id = store.add_education();
        assert_eq!(store.snapshot().document.education[0].id, id);
    }

    #[test]
    fn test_profile_scenario() {
        let store = DocumentStore::new();
        store.update_personal_info(PersonalInfoPatch {
            full_name: Some("Jane Doe".to_string()),
            ..Default::default()
        });
        let go = store.add_skill();
        let snap = store.update_skill(
            &go,
            SkillPatch {
                name: Some("Go".to_string()),
                level: Some(SkillLevel::Advanced),
            },
        );
        assert_eq!(snap.document.skills.len(), 2);
        assert_eq!(snap.document.skills[1].name, "Go");
        assert_eq!(snap.document.skills[1].level, SkillLevel::Advanced);
        assert_eq!(snap.document.personal_info.full_name, "Jane Doe");
    }

    #[test]
    fn test_bullet_scenario() {
        let store = DocumentStore::new();
        let e1 = experience_with_one_bullet(&store);
        let snap = store.add_bullet_to_experience(&e1);
        assert_eq!(snap.document.experience[0].bullets, vec!["", ""]);
        let snap = store.update_bullet_in_experience(&e1, 1, "Shipped X".to_string());
        assert_eq!(snap.document.experience[0].bullets, vec!["", "Shipped X"]);
        let snap = store.remove_bullet_from_experience(&e1, 0);
        assert_eq!(snap.document.experience[0].bullets, vec!["Shipped X"]);
    }

    #[test]
    fn test_bullet_index_out_of_range_is_noop() {
        let store = DocumentStore::new();
        let e1 = experience_with_one_bullet(&store);
        let before = store.snapshot().document.clone();
        store.update_bullet_in_experience(&e1, 5, "nope".to_string());
        store.remove_bullet_from_experience(&e1, 5);
        store.add_bullet_to_experience("missing");
        assert_eq!(store.snapshot().document, before);
    }

    #[test]
    fn test_set_template_is_idempotent_and_content_free() {
        let store = DocumentStore::new();
        let before = store.snapshot().document.clone();
        store.set_selected_template(ResumeTemplate::Modern);
        let snap = store.set_selected_template(ResumeTemplate::Modern);
        assert_eq!(snap.template, ResumeTemplate::Modern);
        assert_eq!(snap.document, before);
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let store = DocumentStore::new();
        store.update_personal_info(PersonalInfoPatch {
            full_name: Some("Alex".to_string()),
            ..Default::default()
        });
        assert!(!store.reset_resume_data(&Answered(false)));
        assert_eq!(store.snapshot().document.personal_info.full_name, "Alex");

        let old_ids: Vec<String> = store
            .snapshot()
            .document
            .skills
            .iter()
            .map(|s| s.id.clone())
            .collect();
        assert!(store.reset_resume_data(&Answered(true)));
        let doc = store.snapshot().document.clone();
        assert_eq!(doc.personal_info.full_name, "");
        assert_eq!(doc.skills.len(), 1);
        assert!(!old_ids.contains(&doc.skills[0].id));
    }

    #[test]
    fn test_reset_keeps_template() {
        let store = DocumentStore::new();
        store.set_selected_template(ResumeTemplate::Classic);
        store.reset_resume_data(&Answered(true));
        assert_eq!(store.snapshot().template, ResumeTemplate::Classic);
    }

    #[test]
    fn test_every_mutation_publishes_a_snapshot() {
        let store = DocumentStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());
        store.add_skill();
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.revision, 1);
        store.remove_skill("missing");
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let store = DocumentStore::new();
        let before = store.snapshot();
        store.add_education();
        assert_eq!(before.document.education.len(), 1);
        assert_eq!(store.snapshot().document.education.len(), 2);
    }
}
