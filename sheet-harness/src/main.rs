//! Runs every scenario against the configured chat-completion API.
//!
//! Usage:
//!   TEST_AGENT_SECRET="your-api-key" cargo run
//!
//! Environment variables (a `.env` file works too):
//!   TEST_AGENT_SECRET    - API key (required)
//!   TEST_AGENT_ENDPOINT  - API base (default: https://api.z.ai/api/paas/v4)
//!   TEST_AGENT_MODEL     - Model name (default: glm-4.7-flash)
//!   TEST_MAX_ROUNDS      - Round cap for scenarios without their own (default: 30)
//!   TEST_SCENARIOS       - Scenario file (default: config/scenarios.ron)

use std::io::Write;

use chrono::Utc;
use uuid::Uuid;

use sheet_harness::ai::ZaiClient;
use sheet_harness::config;
use sheet_harness::scenarios::{load_scenarios, print_summary, run_all};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let settings = match config::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let run_id = Uuid::new_v4();
    println!("🧪 Z.AI API Test");
    println!("   Run:    {} ({})", run_id, Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("   Model:  {}, Max rounds: {}", settings.model, settings.max_rounds);

    let client = match ZaiClient::new(&settings) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    println!("   API:    {}\n", client.endpoint());

    print!("📡 API check...");
    let _ = std::io::stdout().flush();
    match client.check_connectivity().await {
        Ok(()) => println!(" ✅"),
        Err(e) => {
            println!(" ❌ {}", e);
            std::process::exit(1);
        }
    }

    let scenarios = load_scenarios(&settings.scenarios_path);
    log::info!("[harness] Run {} with {} scenarios", run_id, scenarios.len());

    let report = run_all(&client, &scenarios, settings.max_rounds).await;
    print_summary(&report);
}
