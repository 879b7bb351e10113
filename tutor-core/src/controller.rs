//! Runs user turns against a `ChatBackend` and keeps the thread consistent.
//!
//! A turn moves `Idle -> Composing -> Submitting` and back to `Idle`; whether
//! it succeeded or failed is reported through [`TurnOutcome`]. Refused
//! submissions (see [`SubmitError`]) leave every piece of state untouched and
//! never reach the network.

use crate::attachment::{Attachment, PreviewHandle, PreviewRegistry};
use crate::auth::AuthCredential;
use crate::backend::{BackendError, ChatBackend};
use crate::context::{ContextWindow, build_context};
use crate::conversation::{Conversation, Message};
use crate::dictation::{Dictation, DictationEvent};
use crate::error::SubmitError;
use crate::progress::{Celebration, MascotMood, ProgressState};
use crate::suggestions::{SuggestionSet, compose_follow_up};
use crate::tool::ToolResult;
use crate::turn::{PendingTurn, TurnInput};
use tracing::{debug, info, warn};

/// Shown as the assistant reply when the backend gave no usable error text
pub const FALLBACK_REPLY: &str =
    "Sorry, I had trouble understanding that. Could you try asking again?";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TurnState {
    #[default]
    Idle,
    Composing,
    Submitting,
}

#[derive(Debug)]
pub enum TurnOutcome {
    Answered {
        reply: String,
        celebration: Option<Celebration>,
    },
    /// `message` is what was appended to the thread in place of a reply
    Failed { message: String, error: BackendError },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NewThreadOutcome {
    Reset,
    Cancelled,
}

pub struct TurnController<B> {
    backend: B,
    window: ContextWindow,
    conversation: Conversation,
    previews: PreviewRegistry,
    progress: ProgressState,
    mascot: MascotMood,
    celebration: Option<Celebration>,
    suggestions: Option<SuggestionSet>,
    state: TurnState,
    pending: Option<PendingTurn>,
    draft: String,
    selected_image: Option<(Attachment, PreviewHandle)>,
    dictation: Dictation,
}

impl<B: ChatBackend> TurnController<B> {
    pub fn new(backend: B, window: ContextWindow) -> Self {
        TurnController {
            backend,
            window,
            conversation: Conversation::new(),
            previews: PreviewRegistry::new(),
            progress: ProgressState::default(),
            mascot: MascotMood::default(),
            celebration: None,
            suggestions: None,
            state: TurnState::Idle,
            pending: None,
            draft: String::new(),
            selected_image: None,
            dictation: Dictation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn mascot(&self) -> MascotMood {
        self.mascot
    }

    pub fn celebration(&self) -> Option<Celebration> {
        self.celebration
    }

    /// Follow-up prompts, when they are showing
    pub fn suggestions(&self) -> Option<&'static [&'static str]> {
        self.suggestions.map(|set| set.items())
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == TurnState::Submitting
    }

    /// The turn in flight, for the thinking placeholder
    pub fn pending(&self) -> Option<&PendingTurn> {
        self.pending.as_ref()
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn is_listening(&self) -> bool {
        self.dictation.is_listening()
    }

    /// Select the image for the next turn, releasing the preview it replaces.
    pub fn select_image(&mut self, attachment: Attachment) -> PreviewHandle {
        let handle = self.previews.register(&attachment);
        if let Some((_, previous)) = self.selected_image.replace((attachment, handle.clone())) {
            self.previews.release(&previous);
        }
        handle
    }

    pub fn clear_selected_image(&mut self) {
        if let Some((_, handle)) = self.selected_image.take() {
            self.previews.release(&handle);
        }
    }

    pub fn selected_image(&self) -> Option<&PreviewHandle> {
        self.selected_image.as_ref().map(|(_, handle)| handle)
    }

    /// Submit the draft text and selected image as one turn.
    pub async fn submit_draft(
        &mut self,
        credential: Option<&AuthCredential>,
    ) -> Result<TurnOutcome, SubmitError> {
        let input = match &self.selected_image {
            Some((attachment, _)) => TurnInput::with_image(self.draft.clone(), attachment.clone()),
            None => TurnInput::text(self.draft.clone()),
        };
        let credential = self.admit(credential, &input)?;

        self.draft.clear();
        let preview = self.selected_image.take().map(|(_, handle)| handle);
        Ok(self.run_turn(credential, input, preview).await)
    }

    pub async fn submit(
        &mut self,
        credential: Option<&AuthCredential>,
        input: TurnInput,
    ) -> Result<TurnOutcome, SubmitError> {
        let credential = self.admit(credential, &input)?;
        Ok(self.run_turn(credential, input, None).await)
    }

    /// Submit the follow-up at `index` of the visible suggestion list.
    pub async fn choose_suggestion(
        &mut self,
        credential: Option<&AuthCredential>,
        index: usize,
    ) -> Result<TurnOutcome, SubmitError> {
        let set = self.suggestions.ok_or(SubmitError::NoSuggestions)?;
        let suggestion = set
            .items()
            .get(index)
            .ok_or(SubmitError::UnknownSuggestion(index))?;
        let composed = compose_follow_up(suggestion, self.conversation.last_assistant_text());
        self.submit(credential, TurnInput::follow_up(composed, *suggestion))
            .await
    }

    pub async fn submit_tool_result(
        &mut self,
        credential: Option<&AuthCredential>,
        result: ToolResult,
    ) -> Result<TurnOutcome, SubmitError> {
        self.submit(credential, result.into_input()).await
    }

    /// Feed a recognizer signal. Live transcripts fill the draft; the end of a
    /// listening session submits it, once.
    pub async fn handle_dictation(
        &mut self,
        credential: Option<&AuthCredential>,
        event: DictationEvent,
    ) -> Option<Result<TurnOutcome, SubmitError>> {
        if let DictationEvent::Transcript(text) = &event
            && self.dictation.is_listening()
        {
            self.draft = text.clone();
        }
        self.dictation.handle(event)?;
        Some(self.submit_draft(credential).await)
    }

    /// Replace the thread with the welcome preamble.
    ///
    /// `confirm` is asked only when the thread has more than the preamble.
    pub fn start_new_thread(&mut self, confirm: impl FnOnce() -> bool) -> NewThreadOutcome {
        if self.conversation.has_activity() && !confirm() {
            return NewThreadOutcome::Cancelled;
        }

        for message in self.conversation.reset() {
            if let Some(handle) = message.image() {
                self.previews.release(handle);
            }
        }
        self.suggestions = None;
        self.celebration = None;
        self.mascot = MascotMood::Happy;
        self.progress.reset_thread();
        self.pending = None;
        self.state = TurnState::Idle;
        info!("Started a new thread");
        NewThreadOutcome::Reset
    }

    fn admit<'c>(
        &self,
        credential: Option<&'c AuthCredential>,
        input: &TurnInput,
    ) -> Result<&'c AuthCredential, SubmitError> {
        if self.state == TurnState::Submitting {
            return Err(SubmitError::Busy);
        }
        if input.is_empty() {
            return Err(SubmitError::EmptyTurn);
        }
        credential.ok_or(SubmitError::Unauthenticated)
    }

    async fn run_turn(
        &mut self,
        credential: &AuthCredential,
        input: TurnInput,
        preview: Option<PreviewHandle>,
    ) -> TurnOutcome {
        self.state = TurnState::Composing;
        let context = build_context(&self.conversation, self.window);

        let shown = input.shown_text();
        let follow_ups = SuggestionSet::for_question(&shown);
        let preview = preview.or_else(|| input.attachment().map(|a| self.previews.register(a)));
        self.conversation.push(Message::user(shown, preview));
        self.progress.record_attempt();
        self.suggestions = None;
        self.celebration = None;
        self.mascot = MascotMood::Thinking;

        let pending = input.into_pending(context);
        let outgoing = pending.outgoing();
        let is_new_question = pending.is_new_question();
        debug!(
            path = outgoing.path(),
            context_len = outgoing.context().len(),
            "Submitting turn"
        );
        self.pending = Some(pending);
        self.state = TurnState::Submitting;

        let mut in_flight = InFlight {
            state: &mut self.state,
            pending: &mut self.pending,
            conversation: &mut self.conversation,
            mascot: &mut self.mascot,
            open: true,
        };
        let result = self.backend.send(credential, &outgoing).await;
        in_flight.close();
        drop(in_flight);

        match result {
            Ok(reply) => {
                self.conversation.push(Message::assistant(reply.message.clone()));
                let celebration = self.progress.record_success();
                self.celebration = celebration;
                self.mascot = if celebration.is_some() {
                    MascotMood::Celebrating
                } else {
                    MascotMood::Happy
                };
                self.suggestions = is_new_question.then_some(follow_ups);
                TurnOutcome::Answered {
                    reply: reply.message,
                    celebration,
                }
            }
            Err(error) => {
                warn!("Turn failed: {}", error);
                let message = error.user_message().unwrap_or(FALLBACK_REPLY).to_string();
                self.conversation.push(Message::assistant(message.clone()));
                self.mascot = MascotMood::Encouraging;
                TurnOutcome::Failed { message, error }
            }
        }
    }
}

/// Turn bookkeeping borrowed for the duration of the backend call.
///
/// If the submit future is dropped before the reply arrives, the turn is
/// closed with the fallback reply and the controller returns to `Idle`.
struct InFlight<'a> {
    state: &'a mut TurnState,
    pending: &'a mut Option<PendingTurn>,
    conversation: &'a mut Conversation,
    mascot: &'a mut MascotMood,
    open: bool,
}

impl InFlight<'_> {
    fn close(&mut self) {
        *self.pending = None;
        *self.state = TurnState::Idle;
        self.open = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.open {
            warn!("Turn abandoned before the backend replied");
            self.conversation.push(Message::assistant(FALLBACK_REPLY));
            *self.mascot = MascotMood::Encouraging;
            self.close();
        }
    }
}
