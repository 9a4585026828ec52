//! Task prompt templates and the output contracts applied to model replies.

use std::collections::HashSet;
use std::fmt::Write as _;

use edumate_memory::Turn;

/// Sentence returned when the documents cannot support an answer.
///
/// The model is told to reply with exactly this text, and the assistant
/// returns it directly when retrieval produces no context.
pub const REFUSAL_MESSAGE: &str = "Information not available in school documents.";

/// Header every mindmap reply must start with.
pub const MINDMAP_HEADER: &str = "graph TD";

pub const MAX_MINDMAP_NODES: usize = 15;

pub const QUIZ_QUESTIONS: usize = 3;

const PERSONA: &str = "You are EduMate, a helpful school assistant for Class 10 students.";

const MINDMAP_KEYWORDS: [&str; 7] = [
    "subgraph", "end", "style", "classDef", "class", "click", "linkStyle",
];

/// Render prior turns as alternating `Student:` / `EduMate:` lines.
#[must_use]
pub fn format_history(history: &[Turn]) -> String {
    let mut out = String::new();
    for (i, turn) in history.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "Student: {}\nEduMate: {}", turn.question, turn.answer);
    }
    out
}

#[must_use]
pub fn ask_prompt(context: &str, history: &[Turn], question: &str) -> String {
    let history = format_history(history);
    let history = if history.is_empty() {
        "(none)".to_owned()
    } else {
        history
    };
    format!(
        "{PERSONA}
Use the following Context and Conversation History to answer the student's question accurately.

Context:
{context}

Conversation History:
{history}

Current Question: {question}

Instructions:
- Answer in clear English.
- Use the History to understand references (like \"he\", \"it\", \"that\").
- Only use the provided Context. If the answer is not in the context, reply exactly: \"{REFUSAL_MESSAGE}\"
- Keep it concise and student-friendly.

Answer:"
    )
}

#[must_use]
pub fn quiz_prompt(topic: &str, context: &str) -> String {
    format!(
        "You are a strict teacher. Create a {QUIZ_QUESTIONS}-question Multiple Choice Quiz (MCQ) for a Class 10 student about: \"{topic}\".
Use only the provided context.

Context:
{context}

Format:
Q1. [Question]
(a) [Option]
(b) [Option]
(c) [Option]
(d) [Option]
Answer: [Correct Option]

Repeat this format for exactly {QUIZ_QUESTIONS} questions, numbered Q1 to Q{QUIZ_QUESTIONS}, each with exactly four options and one \"Answer:\" line."
    )
}

#[must_use]
pub fn summary_prompt(topic: &str, context: &str) -> String {
    format!(
        "Summarize the topic \"{topic}\" for a Class 10 student.
Use bullet points. Keep it short and easy to revise.
Use only the provided context.

Context:
{context}"
    )
}

#[must_use]
pub fn mindmap_prompt(topic: &str, context: &str) -> String {
    format!(
        "Create a Mermaid.js flowchart to explain: \"{topic}\".
Use the following context:
{context}

Rules:
- Return ONLY the Mermaid code.
- Start with '{MINDMAP_HEADER}'.
- Do not use brackets () or special characters inside node text (use simple text).
- Keep it simple (10 to {MAX_MINDMAP_NODES} nodes).
- No markdown formatting and no code fences. Just raw code.

Example Output:
{MINDMAP_HEADER}
A[Topic] --> B[Subtopic]
A --> C[Another Subtopic]"
    )
}

/// Retrieval query used to find syllabus material for a subject.
#[must_use]
pub fn study_plan_query(subject: &str) -> String {
    format!("{subject} syllabus chapters")
}

#[must_use]
pub fn study_plan_prompt(subject: &str, days: u32, context: &str) -> String {
    format!(
        "You are an expert academic planner for Class 10.
Create a structured {days}-day study plan for the subject: \"{subject}\".

Use the syllabus content below to divide topics logically.
Ensure difficult chapters are given enough time.

Syllabus Context:
{context}

Format:
**Day 1:** [Topics to cover] - [Specific focus area]
**Day 2:** ...
...
**Day {days}:** ...
**Tips:** [One quick study tip]"
    )
}

/// Normalize a mindmap reply into bare Mermaid text.
///
/// Strips code fences, drops anything before the diagram declaration and
/// replaces that declaration (any `graph` or `flowchart` direction) with
/// [`MINDMAP_HEADER`], adding it when missing. Parentheses inside node labels
/// are removed and edges that would introduce more than [`MAX_MINDMAP_NODES`]
/// distinct nodes are dropped.
#[must_use]
pub fn clean_mindmap(raw: &str) -> String {
    let unfenced = raw
        .replace("```mermaid", "")
        .replace("~~~mermaid", "")
        .replace("```", "")
        .replace("~~~", "");
    let content: Vec<&str> = unfenced
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && *l != ";")
        .collect();

    let body = match content.iter().position(|l| is_declaration(l)) {
        Some(0) => &content[1..],
        Some(pos) => {
            tracing::warn!(dropped_lines = pos, "discarding text before mindmap header");
            &content[pos + 1..]
        }
        None => {
            tracing::warn!("mindmap reply has no header, adding it");
            &content[..]
        }
    };

    let mut lines = vec![MINDMAP_HEADER.to_owned()];
    let mut nodes: HashSet<String> = HashSet::new();
    let mut dropped = 0usize;

    for &line in body {
        if is_declaration(line) {
            continue;
        }
        let line = strip_label_parens(line);
        let first_word = line.split_whitespace().next().unwrap_or("");
        if line.starts_with("%%") || MINDMAP_KEYWORDS.contains(&first_word) {
            lines.push(line);
            continue;
        }
        let new_ids: Vec<String> = node_ids(&line)
            .into_iter()
            .filter(|id| !nodes.contains(id))
            .collect();
        if nodes.len() + new_ids.len() > MAX_MINDMAP_NODES {
            dropped += 1;
            continue;
        }
        nodes.extend(new_ids);
        lines.push(line);
    }

    if dropped > 0 {
        tracing::warn!(
            dropped,
            max_nodes = MAX_MINDMAP_NODES,
            "mindmap exceeded node budget"
        );
    }
    lines.join("\n")
}

/// `graph`/`flowchart` with an optional direction and trailing semicolon.
fn is_declaration(line: &str) -> bool {
    let line = line.trim_end_matches(';');
    let mut words = line.split_whitespace();
    let kind_ok = words
        .next()
        .is_some_and(|w| w.eq_ignore_ascii_case("graph") || w.eq_ignore_ascii_case("flowchart"));
    let direction_ok = words.next().is_none_or(|w| {
        ["TD", "TB", "BT", "LR", "RL"]
            .iter()
            .any(|d| w.eq_ignore_ascii_case(d))
    });
    kind_ok && direction_ok && words.next().is_none()
}

/// Remove `(` and `)` inside `[...]` and `{...}` labels.
fn strip_label_parens(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;
    for c in line.chars() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            '(' | ')' if depth > 0 => continue,
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Node identifiers on one Mermaid line, in order of appearance.
fn node_ids(line: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_edge_label = false;
    let mut in_quote = false;

    for c in line.chars() {
        match c {
            '"' => in_quote = !in_quote,
            '|' if !in_quote && depth == 0 => in_edge_label = !in_edge_label,
            '[' | '(' | '{' if !in_quote => depth += 1,
            ']' | ')' | '}' if !in_quote => depth = depth.saturating_sub(1),
            _ => {}
        }
        let outside = depth == 0 && !in_edge_label && !in_quote;
        if outside && (c.is_alphanumeric() || c == '_') {
            current.push(c);
        } else {
            push_id(&mut current, &mut ids);
        }
    }
    push_id(&mut current, &mut ids);
    ids
}

fn push_id(current: &mut String, ids: &mut Vec<String>) {
    if !current.is_empty() {
        let id = std::mem::take(current);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
}

/// Marker counts found in a quiz reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizCheck {
    pub questions: usize,
    pub answers: usize,
}

impl QuizCheck {
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.questions == QUIZ_QUESTIONS && self.answers == QUIZ_QUESTIONS
    }
}

/// Count `Q<n>.` question lines and `Answer:` lines in a quiz reply.
#[must_use]
pub fn check_quiz(text: &str) -> QuizCheck {
    let mut check = QuizCheck {
        questions: 0,
        answers: 0,
    };
    for line in text.lines().map(|l| l.trim().trim_start_matches(['*', '#', ' '])) {
        if line.starts_with("Answer:") {
            check.answers += 1;
        } else if is_question_marker(line) {
            check.questions += 1;
        }
    }
    check
}

fn is_question_marker(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('Q') else {
        return false;
    };
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && matches!(rest[digits..].chars().next(), Some('.' | ')' | ':'))
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use super::*;

    fn turn(q: &str, a: &str) -> Turn {
        Turn {
            question: q.into(),
            answer: a.into(),
        }
    }

    #[test]
    fn history_is_formatted_as_student_and_edumate_lines() {
        let text = format_history(&[turn("Who?", "Newton."), turn("When?", "1687.")]);
        assert_eq!(
            text,
            "Student: Who?\nEduMate: Newton.\nStudent: When?\nEduMate: 1687."
        );
    }

    #[test]
    fn ask_prompt_embeds_context_history_and_refusal() {
        let prompt = ask_prompt(
            "Evaporation is...",
            &[turn("hi", "hello")],
            "What is evaporation?",
        );
        assert!(prompt.starts_with(PERSONA));
        assert!(prompt.contains("Context:\nEvaporation is..."));
        assert!(prompt.contains("Student: hi\nEduMate: hello"));
        assert!(prompt.contains("Current Question: What is evaporation?"));
        assert!(prompt.contains(REFUSAL_MESSAGE));
    }

    #[test]
    fn ask_prompt_marks_empty_history() {
        let prompt = ask_prompt("ctx", &[], "q");
        assert!(prompt.contains("Conversation History:\n(none)"));
    }

    #[test]
    fn quiz_prompt_requires_three_answer_lines() {
        let prompt = quiz_prompt("Photosynthesis", "ctx");
        assert!(prompt.contains("\"Photosynthesis\""));
        assert!(prompt.contains("3-question"));
        assert!(prompt.contains("Answer: [Correct Option]"));
    }

    #[test]
    fn summary_prompt_mentions_bullets() {
        let prompt = summary_prompt("Acids", "ctx");
        assert!(prompt.contains("bullet points"));
        assert!(prompt.ends_with("Context:\nctx"));
    }

    #[test]
    fn study_plan_prompt_and_query() {
        assert_eq!(study_plan_query("Physics"), "Physics syllabus chapters");
        let prompt = study_plan_prompt("Physics", 7, "ctx");
        assert!(prompt.contains("7-day study plan"));
        assert!(prompt.contains("**Day 7:**"));
        assert!(prompt.contains("**Tips:**"));
    }

    #[test]
    fn mindmap_prompt_sets_header_and_budget() {
        let prompt = mindmap_prompt("Water Cycle", "ctx");
        assert!(prompt.contains("Start with 'graph TD'"));
        assert!(prompt.contains("15 nodes"));
    }

    #[test]
    fn clean_mindmap_strips_fences() {
        let raw = "```mermaid\ngraph TD\nA[Water] --> B[Vapour]\n```";
        assert_eq!(clean_mindmap(raw), "graph TD\nA[Water] --> B[Vapour]");
    }

    #[test]
    fn clean_mindmap_drops_leading_prose() {
        let raw = "Here is your diagram:\ngraph TD\nA --> B";
        assert_eq!(clean_mindmap(raw), "graph TD\nA --> B");
    }

    #[test]
    fn clean_mindmap_adds_missing_header() {
        assert_eq!(clean_mindmap("A[Sun] --> B[Heat]"), "graph TD\nA[Sun] --> B[Heat]");
    }

    #[test]
    fn clean_mindmap_removes_label_parens() {
        let raw = "graph TD\nA[Evaporation (heat)] --> B{Clouds (cold)}";
        assert_eq!(
            clean_mindmap(raw),
            "graph TD\nA[Evaporation heat] --> B{Clouds cold}"
        );
    }

    #[test]
    fn clean_mindmap_keeps_round_node_shapes() {
        let raw = "graph TD\nA(Start) --> B((End))";
        assert_eq!(clean_mindmap(raw), raw);
    }

    #[test]
    fn clean_mindmap_caps_distinct_nodes() {
        let mut raw = String::from("graph TD\n");
        for i in 1..=20 {
            let _ = writeln!(raw, "N0[Root] --> N{i}[Leaf {i}]");
        }
        let cleaned = clean_mindmap(&raw);
        let ids: HashSet<String> = cleaned.lines().skip(1).flat_map(node_ids).collect();
        assert_eq!(ids.len(), MAX_MINDMAP_NODES);
        assert!(cleaned.contains("N14[Leaf 14]"));
        assert!(!cleaned.contains("N15[Leaf 15]"));
    }

    #[test]
    fn node_ids_ignore_labels_and_edge_text() {
        assert_eq!(
            node_ids("A[Rain falls] -->|cools| B{Is it cold?} --- C((Ice))"),
            vec!["A", "B", "C"]
        );
        assert_eq!(node_ids("A-->B & C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn clean_mindmap_rewrites_left_right_graph() {
        let cleaned = clean_mindmap("graph LR\nA[Sun] --> B[Heat]");
        assert_eq!(cleaned, "graph TD\nA[Sun] --> B[Heat]");
    }

    #[test]
    fn clean_mindmap_rewrites_flowchart_declaration() {
        let raw = "Here you go:\nflowchart TD\nA[Rain] --> B[River]";
        assert_eq!(clean_mindmap(raw), "graph TD\nA[Rain] --> B[River]");
    }

    #[test]
    fn clean_mindmap_strips_tilde_fences() {
        let raw = "~~~mermaid\ngraph TD\nA[Ice] --> B[Water]\n~~~";
        assert_eq!(clean_mindmap(raw), "graph TD\nA[Ice] --> B[Water]");
    }

    #[test]
    fn clean_mindmap_drops_declaration_semicolon() {
        let raw = "graph TD;\nA[Seed] --> B[Plant];";
        assert_eq!(clean_mindmap(raw), "graph TD\nA[Seed] --> B[Plant];");
    }

    #[test]
    fn clean_mindmap_keeps_a_single_header() {
        let raw = "graph TD\ngraph LR\nA --> B";
        let cleaned = clean_mindmap(raw);
        assert_eq!(cleaned.matches("graph").count(), 1);
        assert_eq!(cleaned, "graph TD\nA --> B");
    }

    #[test]
    fn declaration_needs_known_direction() {
        assert!(is_declaration("graph"));
        assert!(is_declaration("flowchart BT;"));
        assert!(!is_declaration("graph of the water cycle"));
        assert!(!is_declaration("A --> B"));
    }

    #[test]
    fn clean_mindmap_passes_keywords_through() {
        let raw = "graph TD\nsubgraph Cycle\nA --> B\nend\nstyle A fill:#f9f";
        assert_eq!(clean_mindmap(raw), raw);
    }

    #[test]
    fn quiz_check_counts_markdown_markers() {
        let text = "Q1. What is H2O?\n(a) Water\n(b) Salt\n(c) Sand\n(d) Air\nAnswer: (a)\n\n\
                    Q2. Boiling point?\n(a) 50\n(b) 100\n(c) 0\n(d) 10\nAnswer: (b)\n\n\
                    **Q3.** Freezing point?\n(a) 0\n(b) 1\n(c) 2\n(d) 3\n**Answer:** (a)";
        let check = check_quiz(text);
        assert_eq!(check, QuizCheck { questions: 3, answers: 3 });
        assert!(check.is_well_formed());
    }

    #[test]
    fn quiz_check_flags_missing_answer() {
        let text = "Q1. a\nAnswer: x\nQ2. b\nQ3. c\nAnswer: z";
        let check = check_quiz(text);
        assert_eq!(check, QuizCheck { questions: 3, answers: 2 });
        assert!(!check.is_well_formed());
    }

    #[test]
    fn quiz_check_accepts_well_formed_quiz() {
        let text = "Q1. a\nAnswer: x\nQ2) b\nAnswer: y\nQ3: c\nAnswer: z";
        assert!(check_quiz(text).is_well_formed());
    }

    #[test]
    fn question_marker_requires_digits() {
        assert!(is_question_marker("Q12. text"));
        assert!(!is_question_marker("Question text"));
        assert!(!is_question_marker("Q. text"));
    }

    mod proptest_mindmap {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn cleaned_mindmap_honours_contract(
                raw in "((```|~~~)(mermaid)?\n)?(graph (LR|TD)|flowchart TD)?[A-Za-z \\[\\]()>\\-\n|]{0,400}(```|~~~)?"
            ) {
                let cleaned = clean_mindmap(&raw);
                prop_assert!(cleaned.starts_with(MINDMAP_HEADER));
                prop_assert!(!cleaned.contains("```"));
                prop_assert!(!cleaned.contains("~~~"));
                prop_assert!(cleaned.lines().skip(1).all(|l| !is_declaration(l)));
                let ids: HashSet<String> = cleaned
                    .lines()
                    .skip(1)
                    .filter(|l| {
                        let first = l.split_whitespace().next().unwrap_or("");
                        !MINDMAP_KEYWORDS.contains(&first)
                    })
                    .flat_map(node_ids)
                    .collect();
                prop_assert!(ids.len() <= MAX_MINDMAP_NODES);
            }
        }
    }
}
