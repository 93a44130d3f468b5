//! `deskhand status` — Show configuration and agent corpora.
//!
//! Reads config and corpus files only; makes no backend calls.

use deskhand_agents::load_paragraphs;
use deskhand_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Deskhand Status");
    println!("===============");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Bot:            {}", config.bot_username);
    println!("  Endpoint:       {}", config.provider.base_url);
    println!("  Embedding:      {}", config.provider.embedding_model);
    println!("  Generation:     {}", config.provider.generation_model);
    println!("  Window:         {} tokens", config.budget.max_total_tokens);
    println!(
        "  Reserved:       {} tokens (+{} margin)",
        config.budget.reserved_output_tokens, config.budget.safety_margin_tokens
    );
    println!("  Store:          {}", config.store.backend);

    println!("\n  Agents ({}):", config.agents.len());
    for agent in &config.agents {
        match load_paragraphs(&agent.name, &agent.corpus_path) {
            Ok(paragraphs) => println!(
                "    {} — {} paragraphs ({})",
                agent.name,
                paragraphs.len(),
                agent.corpus_path.display()
            ),
            Err(e) => println!("    {} — unavailable: {e}", agent.name),
        }
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file — run `deskhand onboard` first");
    }

    Ok(())
}
