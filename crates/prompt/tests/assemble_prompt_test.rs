//! Unit tests for `prompt::assemble_prompt` and `prompt::summarization_request`.
//!
//! External interactions: none (pure function tests).

use prompt::{
    assemble_prompt, last_message_content, summarization_request, ChatMessage,
    DEFAULT_RECENT_WINDOW, SECTION_RECENT, SUMMARY_INSTRUCTION,
};

fn conversation(n: usize) -> Vec<ChatMessage> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                ChatMessage::user(format!("question {}", i))
            } else {
                ChatMessage::assistant(format!("answer {}", i))
            }
        })
        .collect()
}

/// **Test: Sections appear in order: system, numbered summaries, recent messages.**
#[test]
fn assemble_orders_sections() {
    let out = assemble_prompt(
        "You are the community bot.",
        &["first summary", "second summary"],
        &conversation(2),
        DEFAULT_RECENT_WINDOW,
    );

    let expected = "You are the community bot.\n\n\
[Summary block 1]\nfirst summary\n\n\
[Summary block 2]\nsecond summary\n\n\
[Recent messages]\n\
User: question 0\n\
Assistant: answer 1\n";
    assert_eq!(out, expected);
}

/// **Test: Only the last `recent_window` messages are included, oldest first.**
#[test]
fn assemble_keeps_last_window() {
    let messages = conversation(25);
    let out = assemble_prompt("sys", &[] as &[&str], &messages, 10);

    let recent = out.split(SECTION_RECENT).nth(1).expect("recent section");
    let lines: Vec<&str> = recent.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0], "Assistant: answer 15");
    assert_eq!(lines[9], "User: question 24");
    assert!(!out.contains("question 14"));
}

/// **Test: A window wider than the history includes every message.**
#[test]
fn assemble_window_larger_than_history() {
    let out = assemble_prompt("sys", &[] as &[&str], &conversation(3), 40);
    assert!(out.contains("User: question 0"));
    assert!(out.contains("User: question 2"));
}

/// **Test: Empty history still emits the recent section header and no summary blocks.**
#[test]
fn assemble_empty_history() {
    let out = assemble_prompt("sys", &[] as &[&str], &[], DEFAULT_RECENT_WINDOW);
    assert_eq!(out, "sys\n\n[Recent messages]\n");
}

/// **Test: Same inputs produce the same prompt.**
#[test]
fn assemble_is_deterministic() {
    let messages = conversation(12);
    let summaries = vec!["s1".to_string()];
    let a = assemble_prompt("sys", &summaries, &messages, 10);
    let b = assemble_prompt("sys", &summaries, &messages, 10);
    assert_eq!(a, b);
}

/// **Test: Message content with newlines is kept verbatim.**
#[test]
fn assemble_does_not_truncate_content() {
    let long = "x".repeat(5000);
    let messages = vec![ChatMessage::user(format!("{}\nsecond line", long))];
    let out = assemble_prompt("sys", &[] as &[&str], &messages, 10);
    assert!(out.contains(&long));
    assert!(out.ends_with("second line\n"));
}

/// **Test: Summarization request carries the instruction and the whole transcript.**
#[test]
fn summarization_request_contains_transcript() {
    let out = summarization_request(&conversation(30));
    assert!(out.starts_with(SUMMARY_INSTRUCTION));
    assert!(out.contains("User: question 0\n"));
    assert!(out.contains("Assistant: answer 29\n"));
}

/// **Test: last_message_content finds the latest labelled line.**
#[test]
fn last_message_content_reads_last_line() {
    let out = assemble_prompt("sys", &[] as &[&str], &conversation(3), 10);
    assert_eq!(last_message_content(&out), Some("question 2"));
    assert_eq!(last_message_content("no labels here"), None);
}
