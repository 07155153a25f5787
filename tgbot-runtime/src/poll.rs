//! The polling step and the forever-running driver built on it.

use serde_json::Value;
use thiserror::Error;
use tgbot_api::methods::GetUpdates;
use tgbot_core::{codec, ApiError, BotError, SchemaError, Update, UpdateKind, NO_UPDATES};
use tracing::{debug, error, info, instrument, warn};

use crate::action::Action;
use crate::bot::Bot;

/// What happened to a consumed update.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A handler produced an action and it was interpreted.
    Handled { update_id: i64 },
    /// No handler applies (or dispatch was not requested); the caller gets the update.
    Unhandled(Update),
}

#[derive(Error, Debug)]
pub enum PollError {
    /// Nothing new. Expected, not a failure.
    #[error("{}", NO_UPDATES)]
    NoUpdates,

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Request(#[from] BotError),
}

impl Bot {
    /// Consumes the next update.
    ///
    /// The offset moves past the update as soon as its id is known, so an update whose payload
    /// cannot be decoded is skipped instead of being fetched forever.
    #[instrument(skip(self), fields(offset = self.offset))]
    pub async fn pop_update(&mut self, run_commands: bool) -> Result<PollOutcome, PollError> {
        let fetch = GetUpdates::new(self.offset)
            .limit(1)
            .timeout(self.poll_timeout.as_secs());
        let raw: Vec<Value> = self.client.request(&fetch).await??;
        let Some(raw) = raw.into_iter().next() else {
            return Err(PollError::NoUpdates);
        };

        let update_id: i64 = codec::as_object(&raw, "update")
            .and_then(|obj| codec::required(obj, "update_id"))
            .map_err(BotError::from)?;
        self.advance_offset(update_id).map_err(BotError::from)?;
        self.acknowledge().await;

        let update = Update::from_json(&raw).map_err(|err| {
            warn!(update_id, error = %err, "step: skipping undecodable update");
            BotError::from(err)
        })?;
        info!(update_id, kind = update.kind.key(), "step: update received");

        if !run_commands {
            return Ok(PollOutcome::Unhandled(update));
        }

        match self.route(&update) {
            Some(action) => {
                if let Err(err) = self.interpret(action).await {
                    warn!(update_id, error = %err, "step: handler action failed");
                }
                Ok(PollOutcome::Handled { update_id })
            }
            None => Ok(PollOutcome::Unhandled(update)),
        }
    }

    /// Polls forever, dispatching each update. Failed polls are logged and followed by the
    /// configured back-off; unhandled updates are dropped. With short polling an empty poll is
    /// followed by the idle pause.
    pub async fn run(&mut self) {
        self.drive(None).await
    }

    /// Like [`Bot::run`], but hands unhandled updates to `fallback`.
    pub async fn run_with(&mut self, fallback: impl Fn(Update) -> Action + Send + Sync) {
        self.drive(Some(&fallback)).await
    }

    async fn drive(&mut self, fallback: Option<&(dyn Fn(Update) -> Action + Send + Sync)>) {
        info!(offset = self.offset, "step: polling started");
        loop {
            match self.pop_update(true).await {
                Ok(PollOutcome::Handled { update_id }) => {
                    debug!(update_id, "step: update handled");
                }
                Ok(PollOutcome::Unhandled(update)) => match fallback {
                    Some(fallback) => {
                        let update_id = update.id;
                        if let Err(err) = self.interpret(fallback(update)).await {
                            warn!(update_id, error = %err, "step: fallback action failed");
                        }
                    }
                    None => debug!(
                        update_id = update.id,
                        kind = update.kind.key(),
                        "step: no handler for update"
                    ),
                },
                Err(PollError::NoUpdates) => {
                    debug!("step: no updates");
                    // Short polls return at once.
                    if self.poll_timeout.is_zero() {
                        tokio::time::sleep(self.idle_pause).await;
                    }
                }
                Err(PollError::Api(err)) => {
                    warn!(error = %err, "step: poll refused");
                    tokio::time::sleep(self.error_backoff).await;
                }
                Err(PollError::Request(err)) => {
                    error!(error = %err, "step: poll failed");
                    tokio::time::sleep(self.error_backoff).await;
                }
            }
        }
    }

    fn advance_offset(&mut self, update_id: i64) -> Result<(), SchemaError> {
        let next = update_id
            .checked_add(1)
            .ok_or_else(|| SchemaError::mismatch("update_id", "no offset past i64::MAX"))?;
        self.offset = self.offset.max(next);
        Ok(())
    }

    /// Confirms the new offset to the server. Failure only costs a redelivery attempt.
    async fn acknowledge(&self) {
        let ack = GetUpdates::new(self.offset).limit(0).timeout(0);
        match self.client.request::<_, Vec<Value>>(&ack).await {
            Ok(Ok(_)) => debug!(offset = self.offset, "step: offset acknowledged"),
            Ok(Err(err)) => warn!(offset = self.offset, error = %err, "step: acknowledgement refused"),
            Err(err) => warn!(offset = self.offset, error = %err, "step: acknowledgement failed"),
        }
    }

    fn route(&self, update: &Update) -> Option<Action> {
        match &update.kind {
            UpdateKind::InlineQuery(query) => self.handlers.inline_query.as_ref().map(|h| h(query)),
            UpdateKind::CallbackQuery(query) => {
                self.handlers.callback_query.as_ref().map(|h| h(query))
            }
            UpdateKind::ChosenInlineResult(result) => self
                .handlers
                .chosen_inline_result
                .as_ref()
                .map(|h| h(result)),
            UpdateKind::Message(message) if message.is_command() => self
                .commands
                .as_ref()
                .map(|registry| registry.match_message(message)),
            UpdateKind::Message(message) => {
                let event = message.chat_event()?;
                self.handlers
                    .chat_event
                    .as_ref()
                    .map(|h| h(message, &event))
            }
            _ => None,
        }
    }
}
