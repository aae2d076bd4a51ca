//! Prompt text for the vision and answer models, plus response pre-cleaning.
//!
//! The prompts target the "Internes Rechnungswesen" module of the
//! Fernuniversität Hagen; the answer model is asked twice with different
//! prompts so the two responses can be cross-checked.

/// Instruction for the vision model: transcribe every task on the page in
/// a labeled format the task scanner can pick up.
pub const OCR_INSTRUCTION: &str = "\
Extract ALL exam tasks with:
1. Complete question text
2. All numbers and options (A/B/C...)
3. Formulas and tables
Format: 'TASK X: [Question] | OPTIONS: A)... B)...'";

/// Domain prompt for the primary answer request.
pub const ACCOUNTING_PROMPT: &str = r#"
Sie sind ein Klausurexperte für das Modul "Internes Rechnungswesen" der Fernuniversität Hagen. Nutzen Sie ALLE verfügbaren Wissensquellen in dieser Priorität:

1. **Primärquellen** (streng verbindlich):
   - Offizielle Modulskripte/Studienbriefe der Fernuniversität Hagen
   - Altklausuren der Fernuniversität Hagen sowie ggf. Lösungshinweise/Lösungen dieser Klausuren

2. **Sekundärquellen**
   - Im Wissen bereitgestellte externe Skripte und Klausurlösungen
   - Standardlehrwerke: Ewert/Wagenhofer, Coenenberg

3. **Verarbeitungsregeln**:
   - Immer zuerst Hagen-Quellen prüfen
   - Bei Widersprüchen: "Laut Einheit X S.Y: [Lösung] (Abweichung zu [andere Quelle] beachten)"
   - Keine Lösungen außerhalb der bereitgestellten Materialien

4. **Antwortformat**:
   Aufgabe [Nr]: [Lösung]
   Begründung: [1-Satz-Erklärung mit Hagen-Skriptreferenz]
"#;

/// Strict-format prompt for the secondary (recheck) answer request.
pub const RECHECK_PROMPT: &str = r#"Antworte genau im folgenden Format ohne zusätzlichen Text:

Aufgabe [Nr]: [Lösung]
Begründung: [1-Satz-Erklärung mit Hagen-Skriptreferenz]

Regeln:
• Nur Lösungen aus Hagen-Modulmaterialien (Skripte/Altklausuren)
• Keine Bestätigungen ('Verstanden...')
• Keine Überschriften
• Deutsche Fachbegriffe
• Keine Wiederholungen
• Immer Skriptstelle angeben (z.B. "Hagen-Skript 2023 S.45")"#;

/// Model chatter that must never survive into the parser input.
const CHATTER_MARKERS: [&str; 4] = ["Verstanden", "I'll", " format", "###"];

/// Build the primary answer prompt from the OCR transcript and the
/// optional knowledge corpus.
pub fn build_answer_prompt(ocr_text: &str, knowledge: Option<&str>) -> String {
    format!(
        "{}\n\n<EXAM_DOCUMENT>\n{}\n</EXAM_DOCUMENT>\n\n<KNOWLEDGE_BASE>\n{}\n</KNOWLEDGE_BASE>",
        ACCOUNTING_PROMPT,
        ocr_text,
        knowledge.unwrap_or("")
    )
}

/// Build the strict-format recheck prompt for the secondary request.
pub fn build_recheck_prompt(ocr_text: &str) -> String {
    format!(
        "{}\n\n<EXAM_DOCUMENT>\n{}\n</EXAM_DOCUMENT>",
        RECHECK_PROMPT, ocr_text
    )
}

/// Strip model chatter from a response before parsing.
///
/// Drops blank lines and lines containing known confirmation phrases, and
/// maps the English "TASK" label back to "Aufgabe".
pub fn clean_response_lines(response: &str) -> String {
    response
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !CHATTER_MARKERS.iter().any(|marker| line.contains(marker)))
        .map(|line| line.replace("TASK", "Aufgabe"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chatter_lines_are_removed() {
        let response = "Verstanden, hier die Lösungen:\n### Lösungen\nAufgabe 1: B\nBegründung: Skript S.45";
        let cleaned = clean_response_lines(response);
        assert_eq!(cleaned, "Aufgabe 1: B\nBegründung: Skript S.45");
    }

    #[test]
    fn english_task_label_maps_to_german() {
        assert_eq!(clean_response_lines("TASK 2: A"), "Aufgabe 2: A");
    }

    #[test]
    fn answer_prompt_embeds_document_and_knowledge() {
        let prompt = build_answer_prompt("TASK 1: ...", Some("Einheit 1"));
        assert!(prompt.contains("<EXAM_DOCUMENT>\nTASK 1: ...\n</EXAM_DOCUMENT>"));
        assert!(prompt.contains("<KNOWLEDGE_BASE>\nEinheit 1\n</KNOWLEDGE_BASE>"));
    }

    #[test]
    fn missing_knowledge_leaves_the_tag_empty() {
        let prompt = build_answer_prompt("TASK 1: ...", None);
        assert!(prompt.contains("<KNOWLEDGE_BASE>\n\n</KNOWLEDGE_BASE>"));
    }
}
