//! Fixed FAQ table for the chat surface.
//!
//! Lookup is an exact, case-sensitive match after trimming surrounding
//! whitespace. There is no fuzzy or substring matching.

/// Answer returned when no question matches.
pub const FALLBACK_ANSWER: &str = "I'm not sure. Would you like to schedule a consultation?";

const FAQ: [(&str, &str); 6] = [
    (
        "What services do you offer?",
        "We offer general consultations, specialist care, diagnostics, and pharmacy services.",
    ),
    (
        "What are your working hours?",
        "We are open Monday to Friday, 8 AM to 6 PM, and Saturday, 9 AM to 1 PM.",
    ),
    (
        "How can I book an appointment?",
        "You can book an appointment through our website, by phone, or at the front desk.",
    ),
    (
        "Where are you located?",
        "We are located at 123 Health Street, in the city center.",
    ),
    (
        "Do you accept insurance?",
        "Yes, we accept most major insurance plans. Please contact us to confirm your coverage.",
    ),
    (
        "Do you have a pharmacy?",
        "Yes, our in-house pharmacy stocks common prescription and over-the-counter medicines.",
    ),
];

/// Look up the answer for a chat message.
#[must_use]
pub fn answer_faq(message: &str) -> &'static str {
    let question = message.trim();
    FAQ.iter()
        .find(|(known, _)| *known == question)
        .map_or(FALLBACK_ANSWER, |(_, answer)| answer)
}

/// Questions the table knows about, in display order.
pub fn known_questions() -> impl Iterator<Item = &'static str> {
    FAQ.iter().map(|(question, _)| *question)
}
