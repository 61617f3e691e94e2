//! System-context turns seeded into every new conversation
//!
//! The endpoint is called without a separate system instruction, so the
//! guardrail and department facts travel as the opening user turns of each
//! conversation. A deployment can replace them with a context file whose
//! turns are separated by lines containing only `---`.

use std::path::Path;

/// Line separating turns in a context file
const TURN_SEPARATOR: &str = "---";

/// Scope guardrail, assistant identity and project credits
const GUARDRAIL_PROMPT: &str = r"
SYSTEM: ONLY ANSWER COMPUTER RELATED QUESTIONS, POLITELY REFUSE UNRELATED QUESTIONS!
You are a Chatbot created by Umar Muhammad Muktar aka PyFuse for the Computer Science Department.
Format answers in Markdown and put code in fenced code blocks tagged with the language.

The Prime Event team that built this project is team 3 (3,8).
The team lead is Mal. Mubarak Jibril Yeldu.

Some of the top members:
1. Comr. Abdulrahman Musa Atuwo
2. Comr. Mujahid Saeed
3. Comr. Umar Muhammad Muktar
4. Comr. Rilwan Aliyu Muhammad
5. Comr. Suwaiba Muhammad
6. Comr. Hafsah Ismail
7. Comr. Abdulrahim Abubakar

Umar Muhammad Muktar is a Fullstack Software Engineer from the department of Computer Science at
Abdullahi Fodio University of Science and Technology, Aliero (AFUSTA).";

/// Department directory facts
const DEPARTMENT_PROMPT: &str = r"
SYSTEM: The HOD of Computer Science at Abdullahi Fodio University of Science and Technology,
Aliero (AFUSTA) is Dr. Hassan Umar Suru.

Examination officer/examiner is Mal. Anas Gulumbe.
Staff advisor is Dr. Bashir Aliyu Yauri.
400 Level coordinator is Mal. Shamsu Arzika.
300 Level coordinator is Mal. Mubarak Jibril Yeldu.
200 Level coordinator is Mal. Anas Muhammad Shehu.
100 Level coordinator is Mal. Mustapha Salisu Mungadi.
ICT Director is Dr. Muhammad Garba.
SIWES Coordinator is Malm. Salamatu Musa.
Project Coordinator is Mal. Salihu Suru.";

/// Built-in context turns, oldest first
pub fn default_context() -> Vec<String> {
    [GUARDRAIL_PROMPT, DEPARTMENT_PROMPT]
        .iter()
        .map(|turn| turn.trim().to_string())
        .collect()
}

/// Split context file content into turns.
///
/// Each turn is trimmed; blank turns are dropped.
pub fn parse_context(content: &str) -> Vec<String> {
    let mut turns = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if line.trim() == TURN_SEPARATOR {
            push_turn(&mut turns, &current);
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    push_turn(&mut turns, &current);

    turns
}

fn push_turn(turns: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        turns.push(text.to_string());
    }
}

/// Load context turns from a file. A file with no turns is an error so a
/// misconfigured deployment doesn't silently run without its guardrail.
pub fn load_context(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let turns = parse_context(&content);
    if turns.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("context file {} contains no turns", path.display()),
        ));
    }
    Ok(turns)
}
