/// Report sections, in the order consumers expect them
pub const REPORT_SECTIONS: [&str; 4] = [
    "VISUAL FINDINGS",
    "NORMATIVE COMPLIANCE ANALYSIS",
    "PROBABLE ROOT CAUSE",
    "EXECUTIVE RECOMMENDATION",
];

/// Build the inspection prompt sent alongside the photos
pub fn build_inspection_prompt(
    discipline: &str,
    standard: &str,
    technical_context: &str,
    image_count: usize,
) -> String {
    let context = if technical_context.trim().is_empty() {
        "Not provided."
    } else {
        technical_context.trim()
    };

    let mut prompt = format!(
        r#"Role: Senior {discipline} inspector. Standard: {standard}.
Technical context: {context}
Task: Visual audit of the attached evidence. Produce a STRUCTURED TECHNICAL REPORT:
1. {s1} (Detailed).
2. {s2} {standard} (Compliant / Non-compliant and the criterion applied).
3. {s3}.
4. {s4} (Concrete action)."#,
        s1 = REPORT_SECTIONS[0],
        s2 = REPORT_SECTIONS[1],
        s3 = REPORT_SECTIONS[2],
        s4 = REPORT_SECTIONS[3],
    );

    if image_count > 1 {
        prompt.push_str(&format!(
            "\nEvidence: {} photographs of the same asset; reference them as Photo 1..{} in findings.",
            image_count, image_count
        ));
    }

    prompt.push_str("\nTone: Authoritative, technical, no greetings.");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_sections_in_order() {
        let prompt = build_inspection_prompt(
            "Mechanical (Tanks/Vessels)",
            "API 653",
            "diameter 15m, ASTM A36",
            1,
        );

        let positions: Vec<usize> = REPORT_SECTIONS
            .iter()
            .map(|s| prompt.find(s).expect("section present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(prompt.contains("Standard: API 653"));
        assert!(prompt.contains("diameter 15m, ASTM A36"));
        assert!(prompt.contains("Senior Mechanical (Tanks/Vessels) inspector"));
        assert!(!prompt.contains("Photo 1.."));
    }

    #[test]
    fn test_prompt_mentions_multiple_photos() {
        let prompt = build_inspection_prompt("Safety (HSE)", "OSHA 1910", "  ", 3);
        assert!(prompt.contains("3 photographs"));
        assert!(prompt.contains("Technical context: Not provided."));
    }
}
