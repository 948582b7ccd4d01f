//! HTML projections of resolved rooms.
//!
//! The layouts only pick and arrange fields; nothing is resolved here.

use std::fmt::Write;

use crate::highlight::{escape_html, runs_to_html};
use crate::view::{ActionKind, Avatar, Badges, RoomViewModel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    #[default]
    CardGrid,
    CompactTable,
    LegacyTable,
}

impl Layout {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cards" | "cardgrid" => Some(Layout::CardGrid),
            "compact" | "compacttable" => Some(Layout::CompactTable),
            "legacy" | "legacytable" => Some(Layout::LegacyTable),
            _ => None,
        }
    }
}

const BADGE_LABELS: [(Badges, &str, &str); 4] = [
    (Badges::CLOSED, "closed", "This room is not open to everyone"),
    (
        Badges::NON_ANONYMOUS,
        "non-anonymous",
        "Your address is visible to other occupants",
    ),
    (Badges::HAS_LOGS, "logs", "Public history is available"),
    (Badges::HAS_WEB_CHAT, "webchat", "Can be joined from a browser"),
];

pub fn render(layout: Layout, rooms: &[RoomViewModel]) -> String {
    match layout {
        Layout::CardGrid => card_grid(rooms),
        Layout::CompactTable => compact_table(rooms),
        Layout::LegacyTable => legacy_table(rooms),
    }
}

fn address_html(room: &RoomViewModel) -> String {
    let markup = &room.address_markup;
    let domain = runs_to_html(&markup.domain);
    match &markup.localpart {
        Some(localpart) => format!(
            "<span class='localpart'>{}</span>@<span class='domain'>{domain}</span>",
            runs_to_html(localpart)
        ),
        None => format!("<span class='domain'>{domain}</span>"),
    }
}

fn badges_html(badges: Badges) -> String {
    let mut out = String::new();
    for (flag, class, title) in BADGE_LABELS {
        if badges.contains(flag) {
            let _ = write!(
                out,
                "<span class='badge badge-{class}' title='{}'>{class}</span>",
                escape_html(title)
            );
        }
    }
    out
}

fn avatar_html(room: &RoomViewModel) -> String {
    match &room.avatar {
        Avatar::Image { url } => format!(
            "<img class='avatar' src='{}' alt=''>",
            escape_html(url)
        ),
        Avatar::Placeholder { initial, colour } => format!(
            "<div class='avatar' aria-hidden='true' style='background-color: {colour}'>{}</div>",
            escape_html(initial)
        ),
    }
}

fn users_html(room: &RoomViewModel) -> String {
    match &room.display_user_count {
        Some(count) => format!(
            "<span class='nusers' aria-label='{}'>{}</span>",
            escape_html(&count.accessible),
            escape_html(&count.compact)
        ),
        None => String::new(),
    }
}

fn actions_html(room: &RoomViewModel) -> String {
    let mut out = String::new();
    for action in &room.actions {
        let _ = write!(
            out,
            "<a class='action' href='{}' aria-label='{}'>{}</a>",
            escape_html(&action.url),
            escape_html(&action.label),
            match action.kind {
                ActionKind::Join => "Join",
                ActionKind::ViewLogs => "Logs",
            }
        );
    }
    out
}

fn card_grid(rooms: &[RoomViewModel]) -> String {
    let mut out = String::from("<ol class='roomcards'>");
    for room in rooms {
        out.push_str("<li class='roomcard'>");
        out.push_str(&avatar_html(room));
        let _ = write!(
            out,
            "<h3 class='name'>{}</h3><div class='address'>{}</div>",
            runs_to_html(&room.name_markup),
            address_html(room)
        );
        if let Some(description) = &room.description_markup {
            let _ = write!(out, "<p class='description'>{}</p>", runs_to_html(description));
        }
        out.push_str("<div class='meta'>");
        out.push_str(&users_html(room));
        if let Some(language) = &room.display_language {
            let _ = write!(out, "<span class='language'>{}</span>", escape_html(language));
        }
        out.push_str(&badges_html(room.badges));
        out.push_str("</div>");
        if !room.actions.is_empty() {
            let _ = write!(out, "<div class='actions'>{}</div>", actions_html(room));
        }
        out.push_str("</li>");
    }
    out.push_str("</ol>");
    out
}

fn compact_table(rooms: &[RoomViewModel]) -> String {
    let mut out = String::from(
        "<table class='roomlist compact'><thead><tr><th>Users</th><th>Room</th><th></th></tr></thead><tbody>",
    );
    for room in rooms {
        let _ = write!(
            out,
            "<tr><td class='nusers'>{}</td><td><div class='name'>{}</div><div class='address'>{}</div></td><td>{}{}</td></tr>",
            users_html(room),
            runs_to_html(&room.name_markup),
            address_html(room),
            badges_html(room.badges),
            actions_html(room),
        );
    }
    out.push_str("</tbody></table>");
    out
}

fn legacy_table(rooms: &[RoomViewModel]) -> String {
    let mut out = String::from(
        "<table class='roomlist'><thead><tr><th>Address</th><th>Name</th><th>Description</th><th>Users</th></tr></thead><tbody>",
    );
    for room in rooms {
        let description = room
            .description_markup
            .as_deref()
            .map(runs_to_html)
            .unwrap_or_default();
        let users = room
            .display_user_count
            .as_ref()
            .map(|c| c.value.to_string())
            .unwrap_or_default();
        let _ = write!(
            out,
            "<tr><td class='address'>{}</td><td class='name'>{}</td><td class='description'>{description}</td><td class='nusers'>{users}</td></tr>",
            address_html(room),
            runs_to_html(&room.name_markup),
        );
    }
    out.push_str("</tbody></table>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::room::{PublicInfo, RenderOptions, RoomRecord};
    use crate::view::RoomViewModelBuilder;

    fn lounge() -> RoomViewModel {
        let mut record = RoomRecord::new(Address::parse("lounge@example.org").unwrap());
        record.nusers_moving_average = Some(1234.4);
        record.is_open = false;
        let info = PublicInfo {
            name: Some("The <Lounge>".to_string()),
            description: Some("Coffee & chat".to_string()),
            language: Some("en".to_string()),
            web_chat_url: Some("https://web.example.org/?room=lounge".to_string()),
            ..PublicInfo::default()
        };
        RoomViewModelBuilder::default()
            .build(&record, Some(&info), &RenderOptions::with_keywords(["lounge"]))
            .unwrap()
    }

    #[test]
    fn card_grid_shows_all_resolved_fields() {
        let html = render(Layout::CardGrid, &[lounge()]);
        assert!(html.contains("The &lt;<span class='search-match'>Lounge</span>&gt;"));
        assert!(html.contains("<span class='localpart'><span class='search-match'>lounge</span></span>"));
        assert!(html.contains("Coffee &amp; chat"));
        assert!(html.contains("aria-label='1,234 users online'>1.2k</span>"));
        assert!(html.contains("<span class='language'>English</span>"));
        assert!(html.contains("badge-closed"));
        assert!(html.contains("badge-webchat"));
        assert!(!html.contains("badge-logs"));
        assert!(html.contains("href='https://web.example.org/?room=lounge'"));
    }

    #[test]
    fn tables_share_the_same_resolution() {
        let compact = render(Layout::CompactTable, &[lounge()]);
        assert!(compact.contains("1.2k"));
        assert!(!compact.contains("Coffee"));

        let legacy = render(Layout::LegacyTable, &[lounge()]);
        assert!(legacy.contains("<td class='nusers'>1234</td>"));
        assert!(legacy.contains("Coffee &amp; chat"));
    }

    #[test]
    fn layout_names() {
        assert_eq!(Layout::from_name("compact"), Some(Layout::CompactTable));
        assert_eq!(Layout::from_name("cards"), Some(Layout::CardGrid));
        assert_eq!(Layout::from_name("legacy"), Some(Layout::LegacyTable));
        assert_eq!(Layout::from_name("grid"), None);
    }
}
