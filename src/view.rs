//! Turns a room record into everything a listing needs to render it.

use bitflags::bitflags;
use unicode_segmentation::UnicodeSegmentation;

use crate::address::Address;
use crate::colour::{text_to_colour, Rgb};
use crate::count::UserCount;
use crate::error::BuildError;
use crate::highlight::{Highlighter, Run};
use crate::language::{prettify_language, LanguageFallback};
use crate::precedence::Precedence;
use crate::room::{non_empty, PublicInfo, RenderOptions, RoomRecord};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Badges: u8 {
        const CLOSED = 1;
        const NON_ANONYMOUS = 1 << 1;
        const HAS_LOGS = 1 << 2;
        const HAS_WEB_CHAT = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Join,
    ViewLogs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub url: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Avatar {
    Image { url: String },
    Placeholder { initial: String, colour: Rgb },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMarkup {
    pub localpart: Option<Vec<Run>>,
    pub domain: Vec<Run>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomViewModel {
    pub address: Address,
    pub display_name: String,
    pub display_description: Option<String>,
    pub display_language: Option<String>,
    pub display_user_count: Option<UserCount>,
    pub badges: Badges,
    pub actions: Vec<Action>,
    pub avatar: Avatar,
    pub address_markup: AddressMarkup,
    pub name_markup: Vec<Run>,
    pub description_markup: Option<Vec<Run>>,
}

impl RoomViewModel {
    pub fn action(&self, kind: ActionKind) -> Option<&Action> {
        self.actions.iter().find(|a| a.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    pub precedence: Precedence,
    pub language_fallback: LanguageFallback,
    pub avatar_base_url: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            precedence: Precedence::default(),
            language_fallback: LanguageFallback::default(),
            avatar_base_url: "/avatar/v1/".to_string(),
        }
    }
}

/// Stateless: one builder can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct RoomViewModelBuilder {
    config: BuilderConfig,
}

impl RoomViewModelBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        RoomViewModelBuilder { config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn build(
        &self,
        record: &RoomRecord,
        public_info: Option<&PublicInfo>,
        options: &RenderOptions,
    ) -> Result<RoomViewModel, BuildError> {
        validate(&record.address)?;

        let empty = PublicInfo::default();
        let info = public_info.unwrap_or(&empty);
        let address = &record.address;
        let precedence = &self.config.precedence;

        let display_name = precedence.resolve_name(address, info);
        let display_description = precedence.resolve_description(address, info);
        let display_language =
            prettify_language(info.language.as_deref(), self.config.language_fallback);
        let display_user_count =
            UserCount::resolve(record.nusers_moving_average, record.nusers);

        let actions = actions(info, &display_name);
        let badges = badges(record, &actions);

        let highlighter = Highlighter::new(&options.keywords);
        let address_markup = AddressMarkup {
            localpart: address
                .unescaped_localpart()
                .map(|localpart| highlighter.runs(&localpart)),
            domain: highlighter.runs(&address.domain),
        };
        let name_markup = highlighter.runs(&display_name);
        let description_markup = display_description
            .as_deref()
            .map(|description| highlighter.runs(description));

        let avatar = if options.has_avatar {
            Avatar::Image {
                url: format!("{}{}", self.config.avatar_base_url, address),
            }
        } else {
            Avatar::Placeholder {
                initial: initial(&display_name),
                colour: text_to_colour(&address.to_string()),
            }
        };

        Ok(RoomViewModel {
            address: address.clone(),
            display_name,
            display_description,
            display_language,
            display_user_count,
            badges,
            actions,
            avatar,
            address_markup,
            name_markup,
            description_markup,
        })
    }
}

fn validate(address: &Address) -> Result<(), BuildError> {
    if address.domain.trim().is_empty() {
        log::debug!("rejecting record without domain: {address:?}");
        return Err(BuildError::InvalidRecord(format!(
            "address {address:?} has no domain"
        )));
    }
    if address.localpart.as_deref() == Some("") {
        log::debug!("rejecting record with empty localpart: {address:?}");
        return Err(BuildError::InvalidRecord(format!(
            "address {address:?} has an empty localpart"
        )));
    }
    Ok(())
}

fn badges(record: &RoomRecord, actions: &[Action]) -> Badges {
    let mut badges = Badges::empty();
    badges.set(Badges::CLOSED, !record.is_open);
    badges.set(Badges::NON_ANONYMOUS, record.is_non_anonymous());
    for action in actions {
        match action.kind {
            ActionKind::Join => badges.insert(Badges::HAS_WEB_CHAT),
            ActionKind::ViewLogs => badges.insert(Badges::HAS_LOGS),
        }
    }
    badges
}

// Join always precedes logs.
fn actions(info: &PublicInfo, display_name: &str) -> Vec<Action> {
    let mut actions = Vec::with_capacity(2);
    if let Some(url) = non_empty(info.web_chat_url.as_ref()) {
        actions.push(Action {
            kind: ActionKind::Join,
            url: url.to_string(),
            label: format!("Join {display_name} using a web client"),
        });
    }
    if let Some(url) = non_empty(info.http_logs_url.as_ref()) {
        actions.push(Action {
            kind: ActionKind::ViewLogs,
            url: url.to_string(),
            label: format!("View the history of {display_name}"),
        });
    }
    actions
}

fn initial(display_name: &str) -> String {
    display_name
        .graphemes(true)
        .next()
        .map(str::to_uppercase)
        .unwrap_or_default()
}
