//! Serialized access to the panel controller.
//!
//! The UI never touches the controller directly. It sends `PanelCommand`s
//! down an unbounded channel and one task runs them in order. Commands that
//! arrive while another one is executing are either handled on the spot
//! (close cancels the running generation), rejected (a second submission)
//! or queued behind it. Nothing is dropped silently.

use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures::future::{self, Either};
use futures::StreamExt;

use composer_types::{
    config::GenerationConfig,
    event::ToastLevel,
    store::UserProfile,
    template::TemplateKey,
};
use crate::event_bus::EventBus;
use crate::generation::GenerationClient;
use crate::panel::PanelController;
use crate::persistence::Persistence;
use crate::ports::EditablePort;
use crate::tag_prompt::TagPrompt;

/// Toast shown when a message is sent while the previous one is still running
pub const STILL_WORKING_MESSAGE: &str = "Still working on the last message";

pub type CommandSender = UnboundedSender<PanelCommand>;
pub type CommandReceiver = UnboundedReceiver<PanelCommand>;

/// One user action for the controller
pub enum PanelCommand {
    Toggle,
    Close,
    SelectTemplate(TemplateKey),
    Submit(String),
    QuickReply(String),
    Regenerate,
    Reset,
    Copy,
    Insert(Rc<dyn EditablePort>),
    /// Save the last result under an already collected tag
    Save(String),
    /// Reload saved items and profile into the UI
    RefreshLibrary,
    DeleteSaved(String),
    UpdateProfile(UserProfile),
    Reconfigure {
        generator: Rc<GenerationClient>,
        store: Rc<Persistence>,
        config: GenerationConfig,
    },
}

impl PanelCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PanelCommand::Toggle => "toggle",
            PanelCommand::Close => "close",
            PanelCommand::SelectTemplate(_) => "select-template",
            PanelCommand::Submit(_) => "submit",
            PanelCommand::QuickReply(_) => "quick-reply",
            PanelCommand::Regenerate => "regenerate",
            PanelCommand::Reset => "reset",
            PanelCommand::Copy => "copy",
            PanelCommand::Insert(_) => "insert",
            PanelCommand::Save(_) => "save",
            PanelCommand::RefreshLibrary => "refresh-library",
            PanelCommand::DeleteSaved(_) => "delete-saved",
            PanelCommand::UpdateProfile(_) => "update-profile",
            PanelCommand::Reconfigure { .. } => "reconfigure",
        }
    }

    /// Sends a message through the active flow
    pub fn is_submission(&self) -> bool {
        matches!(
            self,
            PanelCommand::Submit(_) | PanelCommand::QuickReply(_) | PanelCommand::Regenerate
        )
    }

    /// Ends the session
    fn is_close(&self) -> bool {
        matches!(self, PanelCommand::Toggle | PanelCommand::Close)
    }
}

pub fn channel() -> (CommandSender, CommandReceiver) {
    futures::channel::mpsc::unbounded()
}

impl PanelController {
    /// Run commands until every sender is gone.
    pub async fn run(&mut self, mut commands: CommandReceiver) {
        let mut queued: VecDeque<PanelCommand> = VecDeque::new();

        loop {
            let command = match queued.pop_front() {
                Some(command) => command,
                None => match commands.next().await {
                    Some(command) => command,
                    None => break,
                },
            };

            let generator = self.generator();
            let events = self.events();
            let submitting = command.is_submission();
            let mut closing = false;
            let mut senders_gone = false;

            let mut work = Box::pin(self.execute(command));
            while !senders_gone {
                match future::select(work.as_mut(), commands.next()).await {
                    Either::Left(((), _)) => break,
                    Either::Right((Some(incoming), _)) => {
                        if incoming.is_submission() && submitting {
                            log::debug!("Rejected {}: a submission is in flight", incoming.name());
                            events.toast(ToastLevel::Info, STILL_WORKING_MESSAGE);
                            continue;
                        }
                        if incoming.is_close() && !closing {
                            closing = true;
                            if generator.cancel_in_flight() {
                                log::info!("Cancelled in-flight generation for {}", incoming.name());
                            }
                        }
                        log::debug!("Queued {} behind the running command", incoming.name());
                        queued.push_back(incoming);
                    }
                    Either::Right((None, _)) => senders_gone = true,
                }
            }
            if senders_gone {
                work.as_mut().await;
            }
        }
        log::info!("Panel command loop stopped");
    }

    /// Run a single command to completion.
    pub async fn execute(&mut self, command: PanelCommand) {
        match command {
            PanelCommand::Toggle => {
                if self.toggle() {
                    self.refresh_library().await;
                }
            }
            PanelCommand::Close => {
                self.close();
            }
            PanelCommand::SelectTemplate(key) => {
                self.select_template(key.as_str()).await;
            }
            PanelCommand::Submit(text) => {
                self.submit_user_message(&text).await;
            }
            PanelCommand::QuickReply(value) => {
                self.choose_quick_reply(&value).await;
            }
            PanelCommand::Regenerate => {
                self.regenerate().await;
            }
            PanelCommand::Reset => self.reset(),
            PanelCommand::Copy => {
                self.copy_result();
            }
            PanelCommand::Insert(target) => {
                if let Err(e) = self.insert_result(target.as_ref()) {
                    log::warn!("Insert failed: {}", e);
                }
            }
            PanelCommand::Save(tag) => {
                self.save_result(Some(tag), &TagPrompt::new()).await;
            }
            PanelCommand::RefreshLibrary => self.refresh_library().await,
            PanelCommand::DeleteSaved(id) => {
                self.delete_saved_item(&id).await;
            }
            PanelCommand::UpdateProfile(profile) => {
                self.update_profile(profile).await;
            }
            PanelCommand::Reconfigure { generator, store, config } => {
                self.reconfigure(generator, store, &config);
            }
        }
    }

    async fn refresh_library(&mut self) {
        self.load_saved_items().await;
        self.load_profile().await;
    }
}

/// Ask for a tag without holding the controller, then queue the save.
///
/// The controller keeps serving other commands while the prompt is open.
pub async fn save_with_prompt(prompt: TagPrompt, events: EventBus, commands: CommandSender) {
    let tag = prompt.collect(&events).await;
    if commands.unbounded_send(PanelCommand::Save(tag)).is_err() {
        log::warn!("Save dropped: panel command loop is gone");
    }
}
