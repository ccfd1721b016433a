//! Roundtable exchange use case.
//!
//! `RoundtableService` owns the live state of one session and runs the
//! exchange loop: attachments are processed, the user turn is recorded, the
//! response stream is drained into the turn state machine and every outcome
//! ends up as a visible transcript entry.

use crate::attachment_pipeline::AttachmentPipeline;
use crate::settings::{DebouncedSettingsWriter, SessionSettingsResolver};
use roundtable_core::attachment::{AttachmentService, PendingAttachment};
use roundtable_core::config::ClientConfig;
use roundtable_core::error::{Result, RoundtableError, user_facing_message};
use roundtable_core::roundtable::{
    ChatRequest, Flow, MessageType, RoundtableTransport, ServerEvent, TranscriptAssembler,
    TranscriptEntry, TurnRecord, TurnStateMachine,
};
use roundtable_core::session::{Session, SessionGateway};
use roundtable_interaction::StreamEventDispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// How an exchange ended. Failures are already in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    Completed { turns: usize },
    Failed { message: String },
}

impl ExchangeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Live progress of an exchange, for interfaces that render while streaming.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundtableUpdate {
    UserMessage(TurnRecord),
    RoundStarted {
        round: u32,
    },
    SpeakerStarted {
        coach_id: String,
        coach_name: String,
        message_type: MessageType,
    },
    ContentDelta {
        coach_id: String,
        delta: String,
    },
    /// A finalized coach turn or an error entry
    TurnFinalized(TurnRecord),
    ExchangeFinished(ExchangeOutcome),
}

/// Runs exchanges for a single roundtable session.
///
/// `send` takes `&mut self`, so at most one exchange is in flight and the
/// session cannot be ended while a stream is being read.
pub struct RoundtableService {
    session: Session,
    transcript: TranscriptAssembler,
    settings: SessionSettingsResolver,
    pipeline: AttachmentPipeline,
    transport: Arc<dyn RoundtableTransport>,
    gateway: Arc<dyn SessionGateway>,
    max_rounds: u32,
    vision_models: Vec<String>,
    updates: Option<UnboundedSender<RoundtableUpdate>>,
}

impl RoundtableService {
    /// Creates the service for `session` with settings persisted through
    /// `gateway` after the configured debounce window.
    pub fn new(
        session: Session,
        config: &ClientConfig,
        transport: Arc<dyn RoundtableTransport>,
        gateway: Arc<dyn SessionGateway>,
        attachments: Arc<dyn AttachmentService>,
    ) -> Self {
        let writer = DebouncedSettingsWriter::new(
            gateway.clone(),
            session.id.clone(),
            Duration::from_millis(config.settings_debounce_ms),
        );
        let settings =
            SessionSettingsResolver::new(config.default_settings.clone(), session.settings.clone())
                .with_writer(writer);

        Self {
            transcript: TranscriptAssembler::new(session.id.clone()),
            session,
            settings,
            pipeline: AttachmentPipeline::new(attachments),
            transport,
            gateway,
            max_rounds: config.max_rounds,
            vision_models: config.vision_models.clone(),
            updates: None,
        }
    }

    /// Publishes progress on `sender`. A dropped receiver is ignored.
    pub fn with_updates(mut self, sender: UnboundedSender<RoundtableUpdate>) -> Self {
        self.updates = Some(sender);
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transcript(&self) -> &TranscriptAssembler {
        &self.transcript
    }

    pub fn settings(&self) -> &SessionSettingsResolver {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SessionSettingsResolver {
        &mut self.settings
    }

    /// Sends a user message and streams the roundtable's response.
    ///
    /// Transport and server failures are not returned as `Err`: they become
    /// an error entry in the transcript and an `ExchangeOutcome::Failed`.
    ///
    /// # Errors
    ///
    /// Returns an error, without touching the transcript, when the session
    /// has ended or the message has neither text nor attachments.
    pub async fn send(
        &mut self,
        content: &str,
        mut attachments: Vec<PendingAttachment>,
    ) -> Result<ExchangeOutcome> {
        if !self.session.is_active {
            return Err(RoundtableError::SessionInactive(self.session.id.clone()));
        }
        if content.trim().is_empty() && attachments.is_empty() {
            return Err(RoundtableError::invalid_input("Message is empty"));
        }

        let settings = self.settings.effective();
        tracing::info!(
            "[RoundtableService] Sending message to session {} ({:?} settings, {} attachment(s))",
            self.session.id,
            self.settings.layer(),
            attachments.len()
        );

        let vision_enabled = settings.model.supports_vision(&self.vision_models);
        let processed = self
            .pipeline
            .process(&mut attachments, vision_enabled)
            .await;

        let user_turn = self
            .transcript
            .append_user(content, processed.uploaded, 0)
            .clone();
        self.publish(RoundtableUpdate::UserMessage(user_turn));

        let request = ChatRequest::new(
            &self.session,
            content,
            processed.api_attachments,
            self.max_rounds,
            &settings,
        );
        let outcome = self.run_exchange(&request).await;

        self.settings.complete_exchange();
        drop(attachments);

        match &outcome {
            ExchangeOutcome::Completed { turns } => tracing::info!(
                "[RoundtableService] Exchange in session {} completed with {} turn(s)",
                self.session.id,
                turns
            ),
            ExchangeOutcome::Failed { message } => tracing::warn!(
                "[RoundtableService] Exchange in session {} failed: {}",
                self.session.id,
                message
            ),
        }
        self.publish(RoundtableUpdate::ExchangeFinished(outcome.clone()));
        Ok(outcome)
    }

    /// Ends the session on the backend and stops persisting settings.
    pub async fn end_session(&mut self) -> Result<()> {
        if !self.session.is_active {
            return Ok(());
        }
        self.gateway.end(&self.session.id).await?;
        self.session.is_active = false;
        self.settings.shutdown();
        tracing::info!("[RoundtableService] Ended session {}", self.session.id);
        Ok(())
    }

    async fn run_exchange(&mut self, request: &ChatRequest) -> ExchangeOutcome {
        // State never carries over between exchanges.
        let mut machine = TurnStateMachine::new();

        let stream = match self.transport.open_stream(request).await {
            Ok(stream) => stream,
            Err(e) => return self.fail(&mut machine, &e),
        };
        let mut dispatcher = StreamEventDispatcher::new(stream);

        while let Some(next) = dispatcher.next_event().await {
            let event = match next {
                Ok(event) => event,
                Err(e) => return self.fail(&mut machine, &e),
            };
            if let Flow::Stop { error } = self.apply(&mut machine, event) {
                return match error {
                    Some(message) => ExchangeOutcome::Failed { message },
                    None => self.resolve(&machine),
                };
            }
        }

        tracing::warn!(
            "[RoundtableService] Stream for session {} closed without a terminal event",
            self.session.id
        );
        machine.discard_open_buffers("end of stream");
        self.resolve(&machine)
    }

    fn apply(&mut self, machine: &mut TurnStateMachine, event: ServerEvent) -> Flow {
        let event = self.fill_speaker_name(event);
        let before = self.transcript.len();
        let previous_round = machine.current_round();
        let notice = self.updates.as_ref().and_then(|_| pre_apply_notice(&event));

        let flow = machine.apply(event, &mut self.transcript);

        match notice {
            Some(Notice::Round(round))
                if round != previous_round && machine.current_round() == round =>
            {
                self.publish(RoundtableUpdate::RoundStarted { round });
            }
            Some(Notice::Speaker(coach_id)) => {
                if let Some(buffer) = machine.buffer(&coach_id) {
                    let update = RoundtableUpdate::SpeakerStarted {
                        coach_id: buffer.coach_id.clone(),
                        coach_name: buffer.coach_name.clone(),
                        message_type: buffer.message_type,
                    };
                    self.publish(update);
                }
            }
            Some(Notice::Delta(coach_id, delta)) if machine.buffer(&coach_id).is_some() => {
                self.publish(RoundtableUpdate::ContentDelta { coach_id, delta });
            }
            _ => {}
        }
        self.publish_new_turns(before);
        flow
    }

    /// Names a speaker from the session roster when the event carries none.
    fn fill_speaker_name(&self, mut event: ServerEvent) -> ServerEvent {
        if let ServerEvent::CoachStart { coach_id, name, .. }
        | ServerEvent::ModeratorStart { coach_id, name, .. } = &mut event
        {
            if name.trim().is_empty() {
                if let Some(coach) = self.session.coach(coach_id) {
                    *name = coach.name.clone();
                }
            }
        }
        event
    }

    /// Guarantees the user message is followed by an entry.
    fn resolve(&mut self, machine: &TurnStateMachine) -> ExchangeOutcome {
        let before = self.transcript.len();
        let fallback = self
            .transcript
            .resolve_exchange(machine.current_round())
            .map(|record| record.content.clone());
        self.publish_new_turns(before);

        match fallback {
            Some(message) => ExchangeOutcome::Failed { message },
            None => ExchangeOutcome::Completed {
                turns: machine.finalized_count(),
            },
        }
    }

    fn fail(&mut self, machine: &mut TurnStateMachine, error: &RoundtableError) -> ExchangeOutcome {
        tracing::error!(
            "[RoundtableService] Exchange in session {} aborted: {}",
            self.session.id,
            error
        );
        machine.discard_open_buffers("transport error");

        let message = user_facing_message(error);
        let before = self.transcript.len();
        self.transcript
            .append_error(message.clone(), machine.current_round());
        self.publish_new_turns(before);
        ExchangeOutcome::Failed { message }
    }

    fn publish_new_turns(&self, from: usize) {
        if self.updates.is_none() {
            return;
        }
        for entry in &self.transcript.entries()[from..] {
            if let TranscriptEntry::Turn(record) = entry {
                self.publish(RoundtableUpdate::TurnFinalized(record.clone()));
            }
        }
    }

    fn publish(&self, update: RoundtableUpdate) {
        if let Some(sender) = &self.updates {
            let _ = sender.send(update);
        }
    }
}

enum Notice {
    Round(u32),
    Speaker(String),
    Delta(String, String),
}

fn pre_apply_notice(event: &ServerEvent) -> Option<Notice> {
    match event {
        ServerEvent::RoundStart { round } => Some(Notice::Round(*round)),
        ServerEvent::CoachStart { coach_id, .. } | ServerEvent::ModeratorStart { coach_id, .. } => {
            Some(Notice::Speaker(coach_id.clone()))
        }
        ServerEvent::Content { coach_id, content } => {
            Some(Notice::Delta(coach_id.clone(), content.clone()))
        }
        _ => None,
    }
}
