//! The round-tracking tool loop: send the conversation, run whatever workbook
//! operations the model asks for, feed the results back, repeat.

mod loop_guard;
mod prompt;

use std::io::Write;
use std::str::FromStr;

use serde_json::{Value, json};

use crate::ai::{CompletionBackend, Message};
use crate::error::HarnessError;
use crate::models::{RunOutcome, StopReason};
use crate::tools::{ToolName, tool_definitions};
use crate::workbook::VirtualWorkbook;

pub use loop_guard::{MAX_SAME_REPEATS, RepeatGuard};
pub use prompt::{final_round_notice, round_info, system_prompt};

const ARGS_PREVIEW: usize = 70;
const RESULT_PREVIEW: usize = 90;

/// Drive one conversation against `workbook` until the model answers in
/// text, goes quiet, repeats itself, errors, or uses up `max_rounds`.
pub async fn run(
    backend: &dyn CompletionBackend,
    workbook: &mut VirtualWorkbook,
    prompt: &str,
    label: &str,
    max_rounds: usize,
) -> RunOutcome {
    let rule = "=".repeat(60);
    println!("\n{}\n  TEST: {}\n  User: {}\n{}", rule, label, prompt, rule);
    log::info!("[agent] Starting '{}' (max {} rounds)", label, max_rounds);

    let tools = tool_definitions();
    let mut messages = vec![
        Message::system(system_prompt(max_rounds)),
        Message::user(prompt),
    ];
    let mut outcome = RunOutcome::new(label, StopReason::MaxRounds);
    let mut guard = RepeatGuard::new();
    // Index of the single "[Round r/max]" message, overwritten every round.
    let mut round_slot: Option<usize> = None;

    for round in 1..=max_rounds {
        outcome.rounds = round;

        let info = Message::system(round_info(round, max_rounds));
        match round_slot {
            Some(idx) => messages[idx] = info,
            None => {
                messages.push(info);
                round_slot = Some(messages.len() - 1);
            }
        }
        if round == max_rounds {
            messages.push(Message::user(final_round_notice(max_rounds)));
        }

        print!("  📡 R{}/{}...", round, max_rounds);
        let _ = std::io::stdout().flush();

        let response = match backend.complete(&messages, &tools).await {
            Ok(response) => response,
            Err(e) => return fail(outcome, e),
        };
        if let Some(usage) = response.usage {
            outcome.usage += usage;
        }
        let Some(choice) = response.choices.into_iter().next() else {
            return fail(outcome, HarnessError::NoChoices);
        };
        let message = choice.message;

        if !message.calls().is_empty() {
            let calls = message.calls().to_vec();
            println!(" {} tool(s)", calls.len());
            messages.push(message);

            if guard.observe(&calls) {
                println!("  🔄 LOOP DETECTED");
                log::warn!(
                    "[agent] '{}' repeated the same tool batch {} times in a row, stopping at round {}",
                    label,
                    guard.repeats() + 1,
                    round
                );
                outcome.stop = StopReason::Loop;
                return outcome;
            }

            for call in &calls {
                let name = call.function.name.as_str();
                let args = parse_arguments(&call.function.arguments);
                let result = workbook.execute(name, &args);
                outcome.tool_calls += 1;
                if result.get("error").is_none()
                    && ToolName::from_str(name).is_ok_and(|t| t.is_mutating())
                {
                    outcome.writes += 1;
                }

                let rendered = result.to_string();
                println!(
                    "    🔧 {}({}) → {}",
                    name,
                    clip(&call.function.arguments, ARGS_PREVIEW),
                    clip(&rendered, RESULT_PREVIEW)
                );
                messages.push(Message::tool(call.id.clone(), rendered));
            }
            continue;
        }

        let content = message.content.unwrap_or_default();
        if content.trim().is_empty() {
            println!(" ⚠️ EMPTY");
            log::warn!("[agent] '{}' got an empty reply in round {}", label, round);
            outcome.stop = StopReason::Empty;
            return outcome;
        }

        println!(" 💬 done");
        let thin = "─".repeat(50);
        println!("  {}", thin);
        for line in content.lines() {
            println!("    {}", line);
        }
        println!("  {}", thin);
        println!("  ✅ {} rounds, {} tool calls", round, outcome.tool_calls);
        log::info!(
            "[agent] '{}' finished in {} rounds ({} tool calls, {} writes)",
            label,
            round,
            outcome.tool_calls,
            outcome.writes
        );
        outcome.stop = StopReason::Ok;
        outcome.response = Some(content);
        return outcome;
    }

    println!("  ⚠️ MAX ROUNDS");
    log::warn!("[agent] '{}' hit the {}-round limit", label, max_rounds);
    outcome.rounds = max_rounds;
    outcome.stop = StopReason::MaxRounds;
    outcome
}

fn fail(mut outcome: RunOutcome, error: HarnessError) -> RunOutcome {
    println!(" ❌ {}", error);
    log::error!(
        "[agent] '{}' aborted in round {}: {}",
        outcome.label,
        outcome.rounds,
        error
    );
    outcome.stop = StopReason::ApiError;
    outcome.error = Some(error.to_string());
    outcome
}

/// Arguments that are not a JSON object are treated as no arguments.
fn parse_arguments(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| json!({}))
}

/// Shorten `s` to at most `max` characters, ending in `...` when cut.
pub fn clip(s: &str, max: usize) -> String {
    if s.chars().count() < max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
