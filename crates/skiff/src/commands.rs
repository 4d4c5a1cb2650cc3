//! Chat session wiring: config, provider, skills, and the interactive loop.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use skiff_agent::{AgentLoop, AgentSettings, ConsoleConfirmation};
use skiff_config::Config;
use skiff_provider::OpenRouterProvider;
use skiff_skills::SkillCatalog;

/// Seed prompt used when the CLI gets no argument.
const DEFAULT_PROMPT: &str = "Say '你好' and nothing else.";

pub async fn chat_command(initial: Option<String>) -> Result<()> {
    let config = Config::load().await.context("failed to load config")?;
    let api_key = config.require_api_key()?;

    let provider = OpenRouterProvider::new(api_key, config.provider.base_url.clone());
    let workspace = config.workspace_path();

    let skills = SkillCatalog::discover(&config.skills_dir()).await;
    info!("loaded {} skills", skills.len());

    let settings = AgentSettings {
        max_tool_rounds: config.agent.max_tool_rounds,
        shell_timeout_secs: config.agent.shell_timeout_secs,
        max_tokens: config.agent.max_tokens,
        temperature: config.agent.temperature,
    };

    let mut agent = AgentLoop::new(
        provider,
        config.provider.model.clone(),
        &workspace,
        skills,
        Arc::new(ConsoleConfirmation),
        settings,
    );

    let first = initial.unwrap_or_else(|| DEFAULT_PROMPT.to_string());
    run_turn(&mut agent, &first).await;

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        let read = std::io::stdin().read_line(&mut input)?;
        if read == 0 {
            // End of input.
            println!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        run_turn(&mut agent, input).await;
    }

    Ok(())
}

/// A failed turn is terminal for that turn only; history is retained and
/// the session keeps going.
async fn run_turn<P: skiff_provider::Provider>(agent: &mut AgentLoop<P>, text: &str) {
    match agent.run_turn(text).await {
        Ok(answer) => println!("{}", answer),
        Err(e) => println!("error: {}", e),
    }
}
