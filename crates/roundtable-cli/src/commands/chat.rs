use anyhow::{Context, Result, bail};
use roundtable_application::{ExchangeOutcome, RoundtableService, RoundtableUpdate};
use roundtable_core::attachment::PendingAttachment;
use roundtable_core::config::ClientConfig;
use roundtable_core::roundtable::MessageType;
use roundtable_core::session::SessionGateway;
use roundtable_interaction::{
    ApiClient, HttpAttachmentService, HttpRoundtableTransport, HttpSessionGateway,
};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::ChatArgs;

pub async fn run(config: &ClientConfig, args: ChatArgs) -> Result<()> {
    let api = ApiClient::from_config(config)?;
    let gateway = Arc::new(HttpSessionGateway::new(api.clone()));
    let Some(session) = gateway.get(&args.session_id).await? else {
        bail!("Session '{}' not found", args.session_id);
    };

    let attachments = args
        .attachments
        .iter()
        .map(|path| {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            PendingAttachment::new(path, mime.essence_str())
        })
        .collect::<Vec<_>>();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut service = RoundtableService::new(
        session,
        config,
        Arc::new(HttpRoundtableTransport::new(api.clone())),
        gateway,
        Arc::new(HttpAttachmentService::new(api)),
    )
    .with_updates(tx);
    if let Some(max_rounds) = args.max_rounds {
        service = service.with_max_rounds(max_rounds);
    }

    if args.has_model_override() {
        let mut model = service.settings().session_settings().model.clone();
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
        service.settings_mut().override_model(model);
    }

    let printer = tokio::spawn(async move {
        let mut printer = TranscriptPrinter::default();
        while let Some(update) = rx.recv().await {
            printer.print(update);
        }
    });

    let outcome = service
        .send(&args.message, attachments)
        .await
        .context("Message was not sent")?;
    drop(service);
    printer.await.context("Transcript printer stopped unexpectedly")?;

    if let ExchangeOutcome::Failed { message } = outcome {
        bail!(message);
    }
    Ok(())
}

/// Renders updates as plain text while the discussion streams.
#[derive(Default)]
struct TranscriptPrinter {
    streaming: Option<String>,
}

impl TranscriptPrinter {
    fn print(&mut self, update: RoundtableUpdate) {
        let mut stdout = std::io::stdout().lock();
        match update {
            RoundtableUpdate::UserMessage(turn) => {
                let _ = writeln!(stdout, "> {}", turn.content);
                for attachment in &turn.attachments {
                    let _ = writeln!(stdout, "  [{}]", attachment.file_name);
                }
            }
            RoundtableUpdate::RoundStarted { round } => {
                let _ = writeln!(stdout, "\n--- Round {round} ---");
            }
            RoundtableUpdate::SpeakerStarted {
                coach_id,
                coach_name,
                message_type,
            } => {
                let label = match message_type {
                    MessageType::Response => String::new(),
                    other => format!(" ({other:?})").to_lowercase(),
                };
                let _ = write!(stdout, "\n{coach_name}{label}: ");
                self.streaming = Some(coach_id);
            }
            RoundtableUpdate::ContentDelta { coach_id, delta } => {
                if self.streaming.as_deref() == Some(coach_id.as_str()) {
                    let _ = write!(stdout, "{delta}");
                }
            }
            RoundtableUpdate::TurnFinalized(turn) => {
                if turn.is_error {
                    let _ = writeln!(stdout, "\n[error] {}", turn.content);
                } else if self.streaming.as_deref() == turn.coach_id.as_deref() {
                    let _ = writeln!(stdout);
                    self.streaming = None;
                } else {
                    // Another speaker's text was interleaved; print the whole turn.
                    let _ = writeln!(
                        stdout,
                        "\n{}: {}",
                        turn.coach_name.as_deref().unwrap_or("coach"),
                        turn.content
                    );
                }
            }
            RoundtableUpdate::ExchangeFinished(ExchangeOutcome::Completed { turns }) => {
                let _ = writeln!(stdout, "\n({turns} turn(s))");
            }
            RoundtableUpdate::ExchangeFinished(ExchangeOutcome::Failed { .. }) => {}
        }
        let _ = stdout.flush();
    }
}
