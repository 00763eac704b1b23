//! Built-in roadmap and session templates plus placeholder substitution.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateVariant {
    #[default]
    Default,
    Minimal,
    Detailed,
}

impl TemplateVariant {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateVariant::Default => "default",
            TemplateVariant::Minimal => "minimal",
            TemplateVariant::Detailed => "detailed",
        }
    }
}

impl fmt::Display for TemplateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(TemplateVariant::Default),
            "minimal" => Ok(TemplateVariant::Minimal),
            "detailed" => Ok(TemplateVariant::Detailed),
            other => Err(format!(
                "unknown template '{other}' (expected default, minimal or detailed)"
            )),
        }
    }
}

const PROJECT_NAME: &str = "[Project Name]";
const DATE: &str = "[Date]";
const LONG_DATE: &str = "[Month Day, Year]";
const PHASE_LONG: &str = "[Current Phase Number/Name]";
const PHASE_SHORT: &str = "[Current Phase]";
const SESSION_ID: &str = "YYYY-MM-DD-X";

/// Values substituted into a session template. Unknown values leave their
/// placeholder in place for the author to fill in.
#[derive(Debug, Clone)]
pub struct SessionPlaceholders {
    pub session_id: String,
    pub date: NaiveDate,
    pub project_name: Option<String>,
    pub phase: Option<String>,
}

#[must_use]
pub fn render_session(template: &str, values: &SessionPlaceholders) -> String {
    let long_date = values.date.format("%B %d, %Y").to_string();
    let mut out = template
        .replace(SESSION_ID, &values.session_id)
        .replace(LONG_DATE, &long_date)
        .replace(DATE, &long_date);
    if let Some(phase) = values.phase.as_deref() {
        out = out.replace(PHASE_LONG, phase).replace(PHASE_SHORT, phase);
    }
    if let Some(name) = values.project_name.as_deref() {
        out = out.replace(PROJECT_NAME, name);
    }
    out
}

#[must_use]
pub fn render_roadmap(template: &str, project_name: &str, date: NaiveDate) -> String {
    template
        .replace(PROJECT_NAME, project_name)
        .replace(DATE, &date.format("%B %d, %Y").to_string())
}

#[must_use]
pub fn roadmap_template(_variant: TemplateVariant) -> &'static str {
    ROADMAP_TEMPLATE
}

#[must_use]
pub fn session_template(variant: TemplateVariant) -> &'static str {
    match variant {
        TemplateVariant::Minimal => MINIMAL_SESSION_TEMPLATE,
        TemplateVariant::Default | TemplateVariant::Detailed => SESSION_TEMPLATE,
    }
}

pub const ROADMAP_TEMPLATE: &str = r#"# 📖 Quick Start

**Living Roadmap** for [Project Name]

**6-Step Workflow**: Plan → Consult (optional) → Implement → Document → Sanity Check → Repeat

**Philosophy**: *"Automate the predictable; document the decisions."*

---

## 🤖 AI Assistant Workflow

**Every conversation start:**
1. ✅ Read this file (PROJECT_ROADMAP.md) - Current Status section
2. ✅ Check for `SESSION_YYYY_MM_DD_X.md` in root
3. ✅ If exists: Read it, continue that session
4. ✅ If not: Create new session (increment letter: A→B→C or new date)

**During session:**
- Use SESSION file as scratchpad freely
- Git commit after each logical unit
- Ask before deleting/major changes
- Update working doc with progress

**Session end:**
- Update this roadmap briefly
- Archive SESSION file to docs/archive/sessions/
- Ensure git clean

**Key principle:** Always in a session. Always grounded in roadmap. Commit frequently.

**Template:** `docs/reference/SESSION_WORKING_TEMPLATE.md`

---

# [Project Name]

**Goal**: [Project goal]

**Vision**: [Project vision]

**Last Updated**: [Date]

---

## 📊 Current Status

**Project Health:** 🆕 New Project

**Phase Progress:**
- 🟢 Phase 0: Project Foundation (In Progress)

---

## 📋 Phases

[Add your phases here]

---

**Note:** This roadmap was created using roadmapper. 🗺️
"#;

pub const SESSION_TEMPLATE: &str = r#"# Session YYYY-MM-DD-X: [Session Title]

**Date:** [Month Day, Year]
**Phase:** [Current Phase Number/Name]
**Focus:** [Brief description of session goals]

---

## 📊 Project Context (Brief Roadmap Synopsis)

**From PROJECT_ROADMAP.md:**

**Current Phase:**
- [Copy current phase from roadmap]

**Recent Completions:**
- [1-2 key recent achievements]

**System Status:**
- [Brief health check - tools working? tests passing?]

---

## 🎯 Session Goals

**Primary objectives:**
1. [Goal 1]
2. [Goal 2]
3. [Goal 3]

**Success criteria:**
- [ ] [Criterion 1]
- [ ] [Criterion 2]

---

## 🔧 Work Log

### [Task/Investigation Name]

**[Document your work here freely]**

Use this space as scratchpad:
- Findings and discoveries
- Code snippets and analysis
- Decisions and rationale
- Questions and answers
- Progress tracking

**Git commits:**
- `<hash>` - [Brief description]

---

## ✅ Session Accomplishments

**Completed:**
- [List what got done]

**Deferred:**
- [What was postponed and why]

**Discoveries:**
- [Important findings or insights]

---

## 📝 Before Archiving This Session

**Checklist:**
- [ ] Update PROJECT_ROADMAP.md with session summary
- [ ] All git commits made (git status clean)
- [ ] Valuable insights added to roadmap if applicable
- [ ] Archive this file to docs/archive/sessions/
- [ ] Create new SESSION_YYYY_MM_DD_X.md for next session (if continuing)

---

**Remember:** This is YOUR working document. Use it however helps you work best. Document freely, commit frequently, stay grounded in the roadmap.
"#;

pub const MINIMAL_SESSION_TEMPLATE: &str = r#"# Session YYYY-MM-DD-X: [Session Title]

**Date:** [Month Day, Year]
**Phase:** [Current Phase]
**Focus:** [Brief description]

---

## 🎯 Session Goals

**Primary objectives:**
1. [Goal 1]
2. [Goal 2]

**Success criteria:**
- [ ] [Criterion 1]

---

## 🔧 Work Log

[Document your work here]

---

## ✅ Session Accomplishments

**Completed:**
- [List accomplishments]

---
"#;
