//! Résumé preview rendering: a pure projection from document to an HTML subtree.
//!
//! Never mutates the document. The template only changes typography and rules;
//! section order and content rules are shared.

mod dates;
pub mod handlers;

pub use dates::format_date;

use serde::Serialize;

use crate::models::resume::{Education, Experience, Project, ResumeDocument, ResumeTemplate, Skill};

/// The rendered preview handed to observers and to the export adapter.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedResume {
    pub template: ResumeTemplate,
    pub html: String,
}

struct TemplateStyle {
    font_class: &'static str,
    section_rule: bool,
}

fn style_for(template: ResumeTemplate) -> TemplateStyle {
    match template {
        ResumeTemplate::Modern => TemplateStyle {
            font_class: "font-sans",
            section_rule: true,
        },
        ResumeTemplate::Classic => TemplateStyle {
            font_class: "font-serif",
            section_rule: true,
        },
        ResumeTemplate::Minimal => TemplateStyle {
            font_class: "font-sans",
            section_rule: false,
        },
    }
}

pub fn render(document: &ResumeDocument, template: ResumeTemplate) -> RenderedResume {
    let style = style_for(template);
    let mut html = format!(
        "<div class=\"resume template-{} {}\">\n",
        template.as_str(),
        style.font_class
    );

    render_header(&mut html, document);

    let info = &document.personal_info;
    if !info.summary.is_empty() {
        open_section(&mut html, &style, "Professional Summary");
        html.push_str(&format!("<p class=\"summary\">{}</p>\n", escape(&info.summary)));
        close_section(&mut html);
    }

    let skills: Vec<&Skill> = document.skills.iter().filter(|s| !s.name.is_empty()).collect();
    if !skills.is_empty() {
        open_section(&mut html, &style, "Technical Skills");
        let items: Vec<String> = skills
            .iter()
            .map(|s| format!("<strong>{}</strong> ({})", escape(&s.name), s.level.as_str()))
            .collect();
        html.push_str(&format!("<p class=\"skills\">{}</p>\n", items.join(", ")));
        close_section(&mut html);
    }

    let experience: Vec<&Experience> = document
        .experience
        .iter()
        .filter(|e| !e.company.is_empty() || !e.position.is_empty())
        .collect();
    if !experience.is_empty() {
        open_section(&mut html, &style, "Professional Experience");
        for exp in experience {
            render_experience(&mut html, exp);
        }
        close_section(&mut html);
    }

    let projects: Vec<&Project> = document.projects.iter().filter(|p| !p.name.is_empty()).collect();
    if !projects.is_empty() {
        open_section(&mut html, &style, "Projects");
        for project in projects {
            render_project(&mut html, project);
        }
        close_section(&mut html);
    }

    let education: Vec<&Education> = document
        .education
        .iter()
        .filter(|e| !e.institution.is_empty() || !e.degree.is_empty())
        .collect();
    if !education.is_empty() {
        open_section(&mut html, &style, "Education");
        for edu in education {
            render_education(&mut html, edu);
        }
        close_section(&mut html);
    }

    html.push_str("</div>\n");
    RenderedResume { template, html }
}

fn render_header(html: &mut String, document: &ResumeDocument) {
    let info = &document.personal_info;
    let name = or_placeholder(&info.full_name, "Your Name");
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape(name)));

    let contact: Vec<String> = [&info.phone, &info.email]
        .into_iter()
        .filter(|v| !v.is_empty())
        .map(|v| escape(v))
        .collect();
    if !contact.is_empty() {
        html.push_str(&format!("<p class=\"contact\">{}</p>\n", contact.join(" • ")));
    }
    if !info.location.is_empty() {
        html.push_str(&format!("<p class=\"location\">{}</p>\n", escape(&info.location)));
    }

    let links: Vec<String> = [
        ("LinkedIn", &info.linkedin),
        ("GitHub", &info.github),
        ("Portfolio", &info.website),
    ]
    .into_iter()
    .filter_map(|(label, value)| match value.as_deref() {
        Some(v) if !v.is_empty() => Some(format!("{label}: {}", escape(v))),
        _ => None,
    })
    .collect();
    if !links.is_empty() {
        html.push_str(&format!("<p class=\"links\">{}</p>\n", links.join(" • ")));
    }
    html.push_str("</header>\n");
}

fn render_experience(html: &mut String, exp: &Experience) {
    let position = or_placeholder(&exp.position, "Position Title");
    let company = or_placeholder(&exp.company, "Company Name");
    html.push_str("<div class=\"entry\">\n");
    html.push_str(&format!("<h3>{}</h3>\n", escape(position)));
    html.push_str(&format!("<p class=\"org\">{}</p>\n", escape(company)));
    html.push_str(&format!(
        "<p class=\"dates\">{}</p>\n",
        date_range(&exp.start_date, &exp.end_date, "Start Date", "Present")
    ));
    if !exp.description.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", escape(&exp.description)));
    }
    let bullets: Vec<&String> = exp.bullets.iter().filter(|b| !b.trim().is_empty()).collect();
    if !bullets.is_empty() {
        html.push_str("<ul>\n");
        for bullet in bullets {
            html.push_str(&format!("<li>{}</li>\n", escape(bullet)));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</div>\n");
}

fn render_project(html: &mut String, project: &Project) {
    html.push_str("<div class=\"entry\">\n");
    html.push_str(&format!("<h3>{}</h3>\n", escape(&project.name)));
    if let Some(link) = project.link.as_deref().filter(|l| !l.is_empty()) {
        html.push_str(&format!("<a href=\"{}\">View Project</a>\n", escape(link)));
    }
    if !project.description.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", escape(&project.description)));
    }
    let technologies: Vec<String> = project
        .technologies
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| escape(t))
        .collect();
    if !technologies.is_empty() {
        html.push_str(&format!(
            "<p class=\"technologies\"><strong>Technologies:</strong> {}</p>\n",
            technologies.join(", ")
        ));
    }
    html.push_str("</div>\n");
}

fn render_education(html: &mut String, edu: &Education) {
    let mut title = escape(or_placeholder(&edu.degree, "Degree"));
    if !edu.field_of_study.is_empty() {
        title.push_str(&format!(" in {}", escape(&edu.field_of_study)));
    }
    html.push_str("<div class=\"entry\">\n");
    html.push_str(&format!("<h3>{title}</h3>\n"));
    html.push_str(&format!(
        "<p class=\"org\">{}</p>\n",
        escape(or_placeholder(&edu.institution, "Institution Name"))
    ));
    html.push_str(&format!(
        "<p class=\"dates\">{}</p>\n",
        date_range(&edu.start_date, &edu.end_date, "Start", "End")
    ));
    if !edu.description.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", escape(&edu.description)));
    }
    html.push_str("</div>\n");
}

fn open_section(html: &mut String, style: &TemplateStyle, title: &str) {
    let rule = if style.section_rule { " ruled" } else { "" };
    html.push_str(&format!("<section>\n<h2 class=\"section-title{rule}\">{title}</h2>\n"));
}

fn close_section(html: &mut String) {
    html.push_str("</section>\n");
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

fn date_range(start: &str, end: &str, start_placeholder: &str, end_placeholder: &str) -> String {
    let start = if start.is_empty() {
        start_placeholder.to_string()
    } else {
        format_date(start)
    };
    let end = if end.is_empty() {
        end_placeholder.to_string()
    } else {
        format_date(end)
    };
    format!("{} - {}", escape(&start), escape(&end))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::SkillLevel;

    fn sample() -> ResumeDocument {
        let mut doc = ResumeDocument::skeleton();
        doc.personal_info.full_name = "Jane Doe".to_string();
        doc.personal_info.email = "jane@example.com".to_string();
        doc.personal_info.phone = "555-0100".to_string();
        doc.personal_info.github = Some("janedoe".to_string());
        doc.skills[0].name = "Go".to_string();
        doc.skills[0].level = SkillLevel::Advanced;
        doc.experience[0].company = "Acme".to_string();
        doc.experience[0].start_date = "2021-03".to_string();
        doc.experience[0].bullets = vec!["".to_string(), "Shipped X".to_string()];
        doc.projects[0].name = "vitae".to_string();
        doc.projects[0].technologies = vec!["Rust".to_string(), " ".to_string(), "SQL".to_string()];
        doc
    }

    #[test]
    fn test_blank_document_renders_placeholder_name_only() {
        let rendered = render(&ResumeDocument::skeleton(), ResumeTemplate::Modern);
        assert!(rendered.html.contains("<h1>Your Name</h1>"));
        assert!(!rendered.html.contains("<section>"));
    }

    #[test]
    fn test_sections_and_placeholders() {
        let html = render(&sample(), ResumeTemplate::Modern).html;
        assert!(html.contains("555-0100 • jane@example.com"));
        assert!(html.contains("GitHub: janedoe"));
        assert!(html.contains("<strong>Go</strong> (Advanced)"));
        assert!(html.contains("<h3>Position Title</h3>"));
        assert!(html.contains("March 2021 - Present"));
        assert!(html.contains("<li>Shipped X</li>"));
        assert!(!html.contains("<li></li>"));
        assert!(html.contains("Rust, SQL"));
        // Blank education entry is hidden.
        assert!(!html.contains("Education"));
    }

    #[test]
    fn test_section_order() {
        let html = render(&sample(), ResumeTemplate::Classic).html;
        let skills = html.find("Technical Skills").unwrap();
        let experience = html.find("Professional Experience").unwrap();
        let projects = html.find("Projects").unwrap();
        assert!(skills < experience && experience < projects);
    }

    #[test]
    fn test_template_changes_typography_only() {
        let doc = sample();
        let modern = render(&doc, ResumeTemplate::Modern).html;
        let classic = render(&doc, ResumeTemplate::Classic).html;
        let minimal = render(&doc, ResumeTemplate::Minimal).html;
        assert!(modern.contains("font-sans"));
        assert!(classic.contains("font-serif"));
        assert!(!minimal.contains("ruled"));
        assert!(modern.contains("ruled"));
    }

    #[test]
    fn test_education_title() {
        let mut doc = ResumeDocument::skeleton();
        doc.education[0].institution = "MIT".to_string();
        doc.education[0].field_of_study = "Physics".to_string();
        let html = render(&doc, ResumeTemplate::Modern).html;
        assert!(html.contains("<h3>Degree in Physics</h3>"));
        assert!(html.contains("Start - End"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut doc = ResumeDocument::skeleton();
        doc.personal_info.full_name = "<script>x</script>".to_string();
        let html = render(&doc, ResumeTemplate::Modern).html;
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_does_not_mutate() {
        let doc = sample();
        let copy = doc.clone();
        render(&doc, ResumeTemplate::Minimal);
        assert_eq!(doc, copy);
    }
}
