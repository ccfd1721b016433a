use anyhow::{Result, bail};
use roundtable_application::{DebouncedSettingsWriter, SessionSettingsResolver};
use roundtable_core::config::ClientConfig;
use roundtable_core::session::{CreateSessionRequest, DiscussionMode, Session, SessionGateway};
use std::sync::Arc;
use std::time::Duration;

use super::session_gateway;
use crate::ConfigureArgs;

pub async fn list(config: &ClientConfig) -> Result<()> {
    let sessions = session_gateway(config)?.list().await?;
    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    for session in &sessions {
        println!("{}", summary_line(session));
    }
    Ok(())
}

pub async fn show(config: &ClientConfig, id: &str, json: bool) -> Result<()> {
    let Some(session) = session_gateway(config)?.get(id).await? else {
        bail!("Session '{id}' not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!("{}", summary_line(&session));
    for coach in &session.participants {
        println!("  coach      {} ({})", coach.name, coach.id);
    }
    if let Some(moderator) = &session.moderator {
        println!("  moderator  {} ({})", moderator.name, moderator.id);
    }
    if let Some(style) = &session.debate_style {
        println!("  style      {style}");
    }
    let settings = session
        .settings
        .clone()
        .unwrap_or_else(|| config.default_settings.clone());
    println!(
        "  model      {} / {} (temperature {}, max tokens {})",
        settings.model.provider.as_deref().unwrap_or("default"),
        settings.model.model.as_deref().unwrap_or("default"),
        settings.model.temperature,
        settings.model.max_tokens
    );
    println!(
        "  knowledge  {} (top {}, {} candidates)",
        settings.knowledge_base.timing.as_str(),
        settings.knowledge_base.top_k,
        settings.knowledge_base.max_candidates
    );
    Ok(())
}

pub async fn create(
    config: &ClientConfig,
    coach_ids: Vec<String>,
    moderator_id: Option<String>,
    discussion_mode: DiscussionMode,
    title: Option<String>,
    debate_style: Option<String>,
) -> Result<()> {
    if discussion_mode == DiscussionMode::Moderated && moderator_id.is_none() {
        bail!("A moderated session needs --moderator");
    }

    let request = CreateSessionRequest {
        title,
        discussion_mode,
        coach_ids,
        moderator_id,
        debate_style,
    };
    let session = session_gateway(config)?.create(&request).await?;
    println!("Created {}", summary_line(&session));
    Ok(())
}

pub async fn configure(config: &ClientConfig, args: ConfigureArgs) -> Result<()> {
    if !args.has_changes() {
        bail!("Nothing to change; pass at least one setting");
    }
    let gateway: Arc<dyn SessionGateway> = Arc::new(session_gateway(config)?);
    let Some(session) = gateway.get(&args.id).await? else {
        bail!("Session '{}' not found", args.id);
    };
    if !session.is_active {
        bail!("Session '{}' has ended", args.id);
    }

    let writer = DebouncedSettingsWriter::new(
        gateway,
        session.id.clone(),
        Duration::from_millis(config.settings_debounce_ms),
    );
    let mut settings =
        SessionSettingsResolver::new(config.default_settings.clone(), session.settings.clone())
            .with_writer(writer);

    if args.has_model_changes() {
        let mut model = settings.session_settings().model.clone();
        if args.model.is_some() {
            model.model = args.model.clone();
        }
        if args.provider.is_some() {
            model.provider = args.provider.clone();
        }
        if let Some(temperature) = args.temperature {
            model.temperature = temperature;
        }
        if let Some(max_tokens) = args.max_tokens {
            model.max_tokens = max_tokens;
        }
        settings.set_model(model);
    }
    if let Some(timing) = args.kb_timing {
        settings.set_kb_timing(timing);
    }
    if let Some(top_k) = args.kb_top_k {
        settings.set_kb_top_k(top_k);
    }
    if let Some(max_candidates) = args.kb_max_candidates {
        settings.set_kb_max_candidates(max_candidates);
    }

    tracing::info!("[roundtable] Saving settings for session {}", session.id);
    settings.flush().await;
    println!("Updated settings for {}", summary_line(&session));
    Ok(())
}

pub async fn end(config: &ClientConfig, id: &str) -> Result<()> {
    session_gateway(config)?.end(id).await?;
    println!("Ended session {id}");
    Ok(())
}

fn summary_line(session: &Session) -> String {
    let mode = match session.discussion_mode {
        DiscussionMode::Free => "free",
        DiscussionMode::Moderated => "moderated",
    };
    let state = if session.is_active { "active" } else { "ended" };
    format!(
        "{}  {}  [{}, {}, {} coach(es)]",
        session.id,
        session.title.as_deref().unwrap_or("(untitled)"),
        mode,
        state,
        session.participants.len()
    )
}
