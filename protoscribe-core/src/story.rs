// Requirements story composition (Markdown)

use crate::assets::ScreenshotLinks;
use crate::report::{ScreenSummary, SummarizedPrototype};
use protoscribe_fetch::{TaskTicket, TextGenerator};
use tracing::warn;

pub const MAX_HEADING_WORDS: usize = 6;

const USER_STORY_MAX_TOKENS: u32 = 350;
const HEADING_MAX_TOKENS: u32 = 30;
const RULES_MAX_TOKENS: u32 = 700;

const SECTIONS: [&str; 8] = [
    "Table of Contents",
    "User Story",
    "Preconditions",
    "Figma/Wireframe Link",
    "Acceptance Criteria",
    "Reference Requirements",
    "BA Cross-Check List",
    "Requirements Acceptance By Product Owner",
];

const BA_CONDITIONS: [&str; 13] = [
    "Are all flow with Business Rules covered?",
    "Is Figma as per standard?",
    "Are all attached Screenshots as per latest Figma?",
    "Is permission section Covered",
    "Is Dashboard Notification Covered?",
    "Is Email Notification Covered? With respective email link navigation.",
    "Is all other functionality impact covered?",
    "Is history impact covered?",
    "Mobile Scope is Defined?",
    "Admin/Super Admin impact are covered?",
    "Is Correct Figma Link attached in the story?",
    "Is Story in Published Mode?",
    "Is Published Story link attached in the Click up?",
];

const PO_CONDITIONS: [&str; 9] = [
    "Functional Flow and Dependencies Covered?",
    "Figma covered for all the scenarios for Web and Mobile both?",
    "UI Elements explained?",
    "Validations covered?",
    "Decisions covered for existing data / flow ? (if existing flow / data behavior is going to be impacted)",
    "Admin / Super Admin touchpoints covered?",
    "Roles / Rights / Permissions covered?",
    "Email / Notification content covered?",
    "Mobile Scope defined?",
];

const FIGMA_LINK_PLACEHOLDER: &str = "ADD LINK TO ARTICLE DESCRIBING RELEVANT UI";
const RESPONSIBLE_PLACEHOLDER: &str = "@... MENTION RESPONSIBLE PERSON HERE";

/// Renders a ticket and its summarized prototype as a requirements story.
///
/// Generated prose (user story, step headings, business rules) comes from the optional
/// [`TextGenerator`]. Without one, or when a call fails or returns unusable text, the
/// deterministic templates below are used instead, so composition itself never fails.
///
/// Screenshots point at the remote render URL unless [`StoryComposer::with_screenshots`]
/// supplies a saved local copy.
pub struct StoryComposer<'a> {
    generator: Option<&'a dyn TextGenerator>,
    screenshots: ScreenshotLinks,
}

impl<'a> StoryComposer<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self {
            generator: Some(generator),
            screenshots: ScreenshotLinks::new(),
        }
    }

    /// Template text only; no remote calls.
    pub fn template_only() -> Self {
        Self {
            generator: None,
            screenshots: ScreenshotLinks::new(),
        }
    }

    pub fn with_screenshots(mut self, screenshots: ScreenshotLinks) -> Self {
        self.screenshots = screenshots;
        self
    }

    pub async fn compose(&self, ticket: &TaskTicket, summary: &SummarizedPrototype) -> String {
        let mut doc = String::new();

        doc.push_str(&format!("# {}\n\n", or_placeholder(&ticket.title, "Untitled Story")));
        push_page_properties(&mut doc, ticket);
        push_table_of_contents(&mut doc);

        doc.push_str("## User Story\n\n");
        for line in self.user_story(ticket).await {
            doc.push_str(&format!("**{}**  \n", line));
        }
        doc.push_str("\n---\n\n");

        push_preconditions(&mut doc, ticket);

        doc.push_str("## Figma/Wireframe Link\n\n");
        doc.push_str(
            ticket
                .figma_link
                .as_deref()
                .filter(|link| !link.is_empty())
                .unwrap_or(FIGMA_LINK_PLACEHOLDER),
        );
        doc.push_str("\n\n");

        self.push_acceptance_criteria(&mut doc, ticket, summary).await;
        push_reference_requirements(&mut doc);
        push_ba_cross_check(&mut doc);
        push_po_acceptance(&mut doc);

        doc
    }

    /// Exactly three lines: "As a", "I want", "So that".
    pub async fn user_story(&self, ticket: &TaskTicket) -> Vec<String> {
        if let Some(generator) = self.generator {
            let prompt = format!(
                "Create a concise 3-line user story in the format:\n\
                 As a [role]\nI want [feature/action]\nSo that [benefit/outcome]\n\n\
                 Based on this information:\nTitle: {}\nDescription: {}\nBusiness Case: {}\n\n\
                 Return only the 3 lines without any additional text.",
                ticket.title, ticket.description_part1, ticket.business_case
            );
            match generator.generate(&prompt, USER_STORY_MAX_TOKENS).await {
                Ok(text) => {
                    if let Some(lines) = parse_user_story(&text) {
                        return lines;
                    }
                    warn!("Generated user story was not in As a / I want / So that form");
                }
                Err(e) => warn!("User story generation failed: {}", e),
            }
        }
        fallback_user_story(ticket)
    }

    /// Short heading for an acceptance-criteria step.
    pub async fn step_heading(&self, frame_summary: &str) -> String {
        if let Some(generator) = self.generator {
            let prompt = format!(
                "Create a concise step heading of 5-6 words maximum from this screen description:\n\
                 \"{}\"\n\nReturn only the heading text, no quotes or additional text.",
                frame_summary
            );
            match generator.generate(&prompt, HEADING_MAX_TOKENS).await {
                Ok(text) if !text.trim().is_empty() => {
                    let unquoted = text.trim().trim_matches(|c: char| c == '"' || c == '\'');
                    return first_words(unquoted, MAX_HEADING_WORDS);
                }
                Ok(_) => warn!("Generated step heading was empty"),
                Err(e) => warn!("Step heading generation failed: {}", e),
            }
        }
        first_words(frame_summary, MAX_HEADING_WORDS)
    }

    /// One rule for the screen itself, then one per interaction.
    pub async fn business_rules(&self, screen: &ScreenSummary, ticket: &TaskTicket) -> Vec<String> {
        if screen.frame_summary.is_empty() && screen.interactions.is_empty() {
            return vec![
                "Business rules will be defined based on screen functionality.".to_string(),
            ];
        }

        if let Some(generator) = self.generator {
            let prompt = business_rules_prompt(screen, ticket);
            match generator.generate(&prompt, RULES_MAX_TOKENS).await {
                Ok(text) => {
                    let rules = parse_bullets(&text);
                    if !rules.is_empty() {
                        return rules;
                    }
                    warn!("Generated business rules were empty");
                }
                Err(e) => warn!("Business rule generation failed: {}", e),
            }
        }
        fallback_business_rules(screen)
    }

    async fn push_acceptance_criteria(
        &self,
        doc: &mut String,
        ticket: &TaskTicket,
        summary: &SummarizedPrototype,
    ) {
        doc.push_str("## Acceptance Criteria\n\n");
        doc.push_str(&format!("**ID:** {}  \n", ticket.task_id));
        doc.push_str(&format!("**Name:** {}  \n", cell(&ticket.title)));
        doc.push_str(&format!("**Business Use Case:** {}\n\n", cell(&ticket.business_case)));

        doc.push_str(
            "| Module/Submodule/Feature | Current Screen | Figma Screenshot | Business Rules \
             | Comments |\n",
        );
        doc.push_str("|---|---|---|---|---|\n");

        for (i, screen) in summary.screens.iter().enumerate() {
            let heading = self.step_heading(&screen.frame_summary).await;
            let rules = self.business_rules(screen, ticket).await;

            doc.push_str(&format!(
                "| {} {} |  | {} | {} |  |\n",
                i + 1,
                cell(&heading),
                self.image(&format!("Screen {}", i + 1), &screen.frame_url),
                self.rules_cell(&rules, screen)
            ));
        }

        doc.push_str("| **Permissions** |  |  |  |  |\n");
        doc.push_str("| **Dashboard Notifications** |  |  |  |  |\n\n");
    }

    /// Local copy when one was saved, otherwise the remote render.
    fn image(&self, alt: &str, url: &str) -> String {
        if url.is_empty() {
            return "(image unavailable)".to_string();
        }
        match self.screenshots.get(url) {
            Some(local) if local.contains(char::is_whitespace) => {
                format!("![{}](<{}>)", alt, local)
            }
            Some(local) => format!("![{}]({})", alt, local),
            None => format!("![{}]({})", alt, url),
        }
    }

    /// Rule `j > 0` describes interaction `j - 1` and is followed by its destination screenshot.
    fn rules_cell(&self, rules: &[String], screen: &ScreenSummary) -> String {
        let mut parts = Vec::with_capacity(rules.len() * 2);
        for (j, rule) in rules.iter().enumerate() {
            parts.push(format!("• {}", cell(rule)));
            if j > 0
                && let Some(interaction) = screen.interactions.get(j - 1)
                && !interaction.to_url.is_empty()
            {
                parts.push(self.image("Destination", &interaction.to_url));
            }
        }
        parts.join("<br>")
    }
}

const STORY_PREFIXES: [&str; 3] = ["as a", "i want", "so that"];

/// Strip list markers and take one "As a", one "I want" and one "So that" line, in that order.
///
/// Other lines are skipped. A repeated or out-of-order prefix rejects the text.
pub fn parse_user_story(text: &str) -> Option<Vec<String>> {
    let mut lines = Vec::with_capacity(STORY_PREFIXES.len());

    for line in text.lines().map(strip_marker) {
        let lower = line.to_lowercase();
        let Some(kind) = STORY_PREFIXES.iter().position(|p| lower.starts_with(p)) else {
            continue;
        };
        if kind != lines.len() {
            return None;
        }
        lines.push(line.to_string());
        if lines.len() == STORY_PREFIXES.len() {
            return Some(lines);
        }
    }
    None
}

pub fn fallback_user_story(ticket: &TaskTicket) -> Vec<String> {
    let feature = first_sentence(&ticket.description_part1)
        .or_else(|| Some(ticket.title.trim()).filter(|t| !t.is_empty()))
        .unwrap_or("to complete this workflow");
    let benefit =
        first_sentence(&ticket.business_case).unwrap_or("I can achieve my goal efficiently");

    vec![
        "As a user of the system".to_string(),
        format!("I want {}", lowercase_first(feature.trim_end_matches('.'))),
        format!("So that {}", lowercase_first(benefit.trim_end_matches('.'))),
    ]
}

/// Rules drawn from the summaries themselves.
pub fn fallback_business_rules(screen: &ScreenSummary) -> Vec<String> {
    let mut rules = Vec::new();

    if !screen.frame_summary.is_empty() {
        let purpose = screen
            .frame_summary
            .lines()
            .find(|line| line.to_lowercase().contains("purpose"))
            .map(|line| line.split_once(':').map_or(line, |(_, rest)| rest))
            .unwrap_or_else(|| screen.frame_summary.lines().next().unwrap_or_default());
        let purpose = clean_markdown(purpose);
        if !purpose.is_empty() {
            rules.push(purpose);
        }
    }

    for interaction in &screen.interactions {
        if interaction.from_summary.is_empty() || interaction.to_summary.is_empty() {
            continue;
        }
        let action = pick_line(&interaction.from_summary, &["click", "select", "navigate"]);
        let destination = pick_line(&interaction.to_summary, &["purpose", "screen", "navigated"]);
        rules.push(format!("{} leads to {}", action, destination));
    }

    if rules.is_empty() {
        rules = vec![
            "Users can interact with screen elements and components".to_string(),
            "System provides navigation between different screens and features".to_string(),
        ];
    }
    rules
}

pub fn first_words(text: &str, max: usize) -> String {
    text.split_whitespace().take(max).collect::<Vec<_>>().join(" ")
}

fn business_rules_prompt(screen: &ScreenSummary, ticket: &TaskTicket) -> String {
    let comments = ticket
        .comments
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut interactions = String::new();
    for (i, interaction) in screen.interactions.iter().enumerate() {
        if interaction.from_summary.is_empty() && interaction.to_summary.is_empty() {
            continue;
        }
        interactions.push_str(&format!(
            "\nInteraction {}:\nFrom: {}\nTo: {}\n",
            i + 1,
            interaction.from_summary,
            interaction.to_summary
        ));
    }

    format!(
        "Based on this screen description and ALL interactions, generate business rules as bullet points.\n\n\
         SCREEN OVERVIEW:\n{}\n\nALL INTERACTIONS:\n{}\n\n\
         Ticket:\nDescription:\n{}\n\nBusiness Case:\n{}\n\nComments:\n{}\n\n\
         Generate exactly 1 bullet point for the main screen purpose, then 1 bullet point for EACH \
         interaction. Total bullet points: {}. Format each as \"• rule\", 25-35 words maximum.\n\
         Return ONLY the bullet points.",
        screen.frame_summary,
        interactions,
        ticket.description_part1,
        ticket.business_case,
        comments,
        screen.interactions.len() + 1
    )
}

fn parse_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| {
            c.is_ascii_digit() || matches!(c, '.' | '-' | '*' | '•' | ' ')
        })
        .trim()
}

fn first_sentence(text: &str) -> Option<&str> {
    text.split(['.', '\n'])
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn clean_markdown(text: &str) -> String {
    text.replace('*', "").trim().to_string()
}

fn pick_line(text: &str, keywords: &[&str]) -> String {
    let line = text
        .lines()
        .find(|line| {
            let lower = line.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .or_else(|| text.lines().next())
        .unwrap_or_default();
    clean_markdown(strip_marker(line))
}

fn or_placeholder<'s>(value: &'s str, placeholder: &'s str) -> &'s str {
    if value.trim().is_empty() { placeholder } else { value }
}

/// Make text safe for a single Markdown table cell.
fn cell(text: &str) -> String {
    text.trim().replace('|', "\\|").replace("\r\n", "<br>").replace('\n', "<br>")
}

fn push_page_properties(doc: &mut String, ticket: &TaskTicket) {
    let responsible = if ticket.assignees.is_empty() {
        RESPONSIBLE_PLACEHOLDER.to_string()
    } else {
        ticket.assignees.join(", ")
    };

    doc.push_str("## Page Properties\n\n");
    doc.push_str("| Property | Value |\n|---|---|\n");
    doc.push_str("| User Story | ADD LINK TO STORY IN AZURE DEVOPS HERE |\n");
    doc.push_str("| Epic/Feature | ADD LINK TO RELATED EPIC IN AZURE DEVOPS HERE |\n");
    doc.push_str("| Requirement status | |\n");
    doc.push_str(&format!("| Responsible | **{}** |\n", cell(&responsible)));
    doc.push_str("| Tracking | Changes for the current version are marked in Green |\n");
    doc.push_str("| Current Version | Editable version TBD in expander |\n\n");
}

fn push_table_of_contents(doc: &mut String) {
    doc.push_str("## Table of Contents\n\n");
    for section in SECTIONS {
        doc.push_str(&format!("- {}\n", section));
    }
    doc.push('\n');
}

fn push_preconditions(doc: &mut String, ticket: &TaskTicket) {
    let screen_name = or_placeholder(&ticket.title, "[SCREEN_NAME]");
    doc.push_str("## Preconditions\n\n");
    doc.push_str("| # | Precondition |\n|---|---|\n");
    doc.push_str("| 1 | User has logged in to the System as Tenant or Tenant User |\n");
    doc.push_str("| 2 | User's role has permissions associated with this screen |\n");
    doc.push_str(&format!("| 3 | User has navigated to {} |\n\n", cell(screen_name)));
}

fn push_reference_requirements(doc: &mut String) {
    doc.push_str("## Reference Requirements\n\n");
    doc.push_str("1. Data: User data, System configuration\n");
    doc.push_str("2. Mobile: Included in above requirements\n");
    doc.push_str("3. Permissions/Notification Settings: Standard permissions apply\n\n");
}

fn push_ba_cross_check(doc: &mut String) {
    doc.push_str("## BA Cross-Check List\n\n");
    doc.push_str("**Reviewer:**  \n**Review Date:**\n\n");
    doc.push_str("| SL No. | Condition | Covered/Yes/No/NA | Comments |\n|---|---|---|---|\n");
    for (i, condition) in BA_CONDITIONS.iter().enumerate() {
        doc.push_str(&format!("| {} | {} |  |  |\n", i + 1, cell(condition)));
    }
    doc.push('\n');
}

fn push_po_acceptance(doc: &mut String) {
    doc.push_str("## Requirements Acceptance By Product Owner\n\n");
    doc.push_str("**Reviewer:**  \n**Review Date:**\n\n");
    doc.push_str("| Condition | Covered(Yes/No/NA) | Comments |\n|---|---|---|\n");
    for condition in PO_CONDITIONS {
        doc.push_str(&format!("| {} |  |  |\n", cell(condition)));
    }
}
