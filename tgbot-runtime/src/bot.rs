use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tgbot_api::methods::{GetMe, GetUpdates};
use tgbot_api::{ApiClient, Method};
use tgbot_core::{
    ApiError, CallbackQuery, ChatEvent, ChosenInlineResult, InlineQuery, Message, Result,
};
use tracing::{debug, debug_span, warn, Instrument};

use crate::action::Action;
use crate::command::CommandRegistry;
use crate::config::BotConfig;
use crate::handlers::Handlers;
use crate::poll::PollError;

const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_millis(1000);
const DEFAULT_IDLE_PAUSE: Duration = Duration::from_millis(500);

/// A polling session: the API client, the update offset and the installed handlers.
///
/// The offset starts at 0 and only moves forward, by the poll step.
pub struct Bot {
    pub(crate) client: ApiClient,
    pub(crate) offset: i64,
    pub(crate) commands: Option<CommandRegistry>,
    pub(crate) handlers: Handlers,
    pub(crate) poll_timeout: Duration,
    pub(crate) error_backoff: Duration,
    pub(crate) idle_pause: Duration,
}

impl Bot {
    pub fn builder(client: ApiClient) -> BotBuilder {
        BotBuilder::new(client)
    }

    /// Next update id to request.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn commands(&self) -> Option<&CommandRegistry> {
        self.commands.as_ref()
    }

    pub fn commands_mut(&mut self) -> Option<&mut CommandRegistry> {
        self.commands.as_mut()
    }

    /// Performs `action`.
    ///
    /// `Chain(a, b)` finishes `a` and every action its continuations return before `b` starts.
    /// Refused acknowledgement-only calls are logged and skipped; transport and decoding failures
    /// stop the walk and are returned.
    pub fn interpret(&mut self, action: Action) -> BoxFuture<'_, Result<()>> {
        let span = debug_span!("interpret", root = action.name());
        async move {
            let mut pending = vec![action];
            while let Some(action) = pending.pop() {
                debug!(action = action.name(), "step: interpret");
                let next = match action {
                    Action::Nothing => continue,
                    Action::Chain(first, second) => {
                        pending.push(*second);
                        pending.push(*first);
                        continue;
                    }

                    Action::SendChatAction(m) => self.fire(&m).await?,
                    Action::ForwardMessage(m) => self.fire(&m).await?,
                    Action::BanChatMember(m) => self.fire(&m).await?,
                    Action::UnbanChatMember(m) => self.fire(&m).await?,
                    Action::LeaveChat(m) => self.fire(&m).await?,
                    Action::AnswerCallbackQuery(m) => self.fire(&m).await?,
                    Action::AnswerInlineQuery(m) => self.fire(&m).await?,
                    Action::EditMessageText(m) => self.fire(&m).await?,
                    Action::EditMessageCaption(m) => self.fire(&m).await?,
                    Action::EditMessageReplyMarkup(m) => self.fire(&m).await?,
                    Action::DeleteMessage(m) => self.fire(&m).await?,

                    Action::GetMe(then) => then.call(self.client.call(&GetMe {}).await?),
                    Action::SendMessage(m, then) => then.call(self.client.call(&m).await?),
                    Action::SendPhoto(m, then) => then.call(self.client.call(&m).await?),
                    Action::SendAudio(m, then) => then.call(self.client.call(&m).await?),
                    Action::SendDocument(m, then) => then.call(self.client.call(&m).await?),
                    Action::SendSticker(m, then) => then.call(self.client.call(&m).await?),
                    Action::SendVideo(m, then) => then.call(self.client.call(&m).await?),
                    Action::SendVoice(m, then) => then.call(self.client.call(&m).await?),
                    Action::SendLocation(m, then) => then.call(self.client.call(&m).await?),
                    Action::SendVenue(m, then) => then.call(self.client.call(&m).await?),
                    Action::SendContact(m, then) => then.call(self.client.call(&m).await?),
                    Action::GetUserProfilePhotos(m, then) => then.call(self.client.call(&m).await?),
                    Action::GetFile(m, then) => then.call(self.client.call(&m).await?),
                    Action::DownloadFile(file, then) => {
                        then.call(self.client.download_file(&file).await?)
                    }
                    Action::GetChat(m, then) => then.call(self.client.call(&m).await?),
                    Action::GetChatAdministrators(m, then) => then.call(self.client.call(&m).await?),
                    Action::GetChatMemberCount(m, then) => then.call(self.client.call(&m).await?),
                    Action::GetChatMember(m, then) => then.call(self.client.call(&m).await?),

                    Action::GetUpdates(then) => {
                        let request = GetUpdates::new(self.offset);
                        then.call(self.client.call(&request).await?)
                    }
                    Action::PeekUpdate(then) => {
                        let request = GetUpdates::new(self.offset).limit(1);
                        let result = self.client.call(&request).await?.and_then(|updates| {
                            updates.into_iter().next().ok_or_else(ApiError::no_updates)
                        });
                        then.call(result)
                    }
                    Action::PopUpdate { run_commands, then } => {
                        let result = match self.pop_update(run_commands).await {
                            Ok(outcome) => Ok(outcome),
                            Err(PollError::NoUpdates) => Err(ApiError::no_updates()),
                            Err(PollError::Api(err)) => Err(err),
                            Err(PollError::Request(err)) => return Err(err),
                        };
                        then.call(result)
                    }
                };
                pending.push(next);
            }
            Ok(())
        }
        .instrument(span)
        .boxed()
    }

    /// Sends an acknowledgement-only call. The result is discarded.
    async fn fire<M: Method>(&self, method: &M) -> Result<Action> {
        if let Err(err) = self.client.request::<M, Value>(method).await? {
            warn!(method = M::NAME, error = %err, "API call refused");
        }
        Ok(Action::Nothing)
    }
}

/// Builds a [`Bot`]: command registry, per-kind handlers and polling timings.
pub struct BotBuilder {
    client: ApiClient,
    commands: Option<CommandRegistry>,
    handlers: Handlers,
    poll_timeout: Duration,
    error_backoff: Duration,
    idle_pause: Duration,
}

impl BotBuilder {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            commands: None,
            handlers: Handlers::default(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            error_backoff: DEFAULT_ERROR_BACKOFF,
            idle_pause: DEFAULT_IDLE_PAUSE,
        }
    }

    /// Takes the polling timings from `config`.
    pub fn with_config(self, config: &BotConfig) -> Self {
        self.poll_timeout(config.poll_timeout)
            .error_backoff(config.error_backoff)
    }

    pub fn commands(mut self, registry: CommandRegistry) -> Self {
        self.commands = Some(registry);
        self
    }

    pub fn on_inline_query(
        mut self,
        handler: impl Fn(&InlineQuery) -> Action + Send + Sync + 'static,
    ) -> Self {
        self.handlers.inline_query = Some(Arc::new(handler));
        self
    }

    pub fn on_callback_query(
        mut self,
        handler: impl Fn(&CallbackQuery) -> Action + Send + Sync + 'static,
    ) -> Self {
        self.handlers.callback_query = Some(Arc::new(handler));
        self
    }

    pub fn on_chosen_inline_result(
        mut self,
        handler: impl Fn(&ChosenInlineResult) -> Action + Send + Sync + 'static,
    ) -> Self {
        self.handlers.chosen_inline_result = Some(Arc::new(handler));
        self
    }

    pub fn on_chat_event(
        mut self,
        handler: impl Fn(&Message, &ChatEvent) -> Action + Send + Sync + 'static,
    ) -> Self {
        self.handlers.chat_event = Some(Arc::new(handler));
        self
    }

    /// Long-polling timeout sent with each fetch. Zero means short polling.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Pause after a failed poll in [`Bot::run`].
    pub fn error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Pause after an empty poll in [`Bot::run`] when short polling.
    pub fn idle_pause(mut self, pause: Duration) -> Self {
        self.idle_pause = pause;
        self
    }

    pub fn build(self) -> Bot {
        Bot {
            client: self.client,
            offset: 0,
            commands: self.commands,
            handlers: self.handlers,
            poll_timeout: self.poll_timeout,
            error_backoff: self.error_backoff,
            idle_pause: self.idle_pause,
        }
    }
}
