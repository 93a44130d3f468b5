//! `deskhand ask` — Interactive or single-question chat mode.

use std::io::{BufRead, Write};

use deskhand_config::AppConfig;
use deskhand_core::ConversationHistory;

pub async fn run(
    question: Option<String>,
    username: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let pipeline = super::build_pipeline(&config).await?;

    if let Some(question) = question {
        // Single question mode
        let response = pipeline
            .process_query(&question, ConversationHistory::new(), &username)
            .await;
        println!("{}", response.answer);
        if response.is_manager() {
            eprintln!("  (forwarded to a specialist)");
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Deskhand — Interactive Mode");
    println!("  Bot:    {}", config.bot_username);
    println!("  Agents: {}", config.agents.len());
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let stdin = std::io::stdin();
    let mut history = ConversationHistory::new();

    print!("  {username} > ");
    std::io::stdout().flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let question = line.trim();
        if question == "exit" {
            break;
        }

        let response = pipeline
            .process_query(question, history, &username)
            .await;
        println!();
        println!("  {} > {}", config.bot_username, response.answer);
        if response.is_manager() {
            println!("  (forwarded to a specialist)");
        }
        history = response.history;
        println!();

        print!("  {username} > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}
