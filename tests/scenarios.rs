use muc_directory::directory::{Directory, DirectoryEntry, SearchScope};
use muc_directory::precedence::{Precedence, PrecedenceRevision};
use muc_directory::surface::{render, Layout};
use muc_directory::view::ActionKind;
use muc_directory::{
    Address, AnonymityMode, Badges, BuildError, BuilderConfig, PublicInfo, RenderOptions,
    RoomRecord, RoomViewModelBuilder,
};
use pretty_assertions::assert_eq;

fn record(addr: &str) -> RoomRecord {
    RoomRecord::new(Address::parse(addr).unwrap())
}

#[test]
fn closed_non_anonymous_room_without_public_info() {
    let mut r = record("chat@example.org");
    r.is_open = false;
    r.anonymity_mode = Some(AnonymityMode::None);

    let vm = RoomViewModelBuilder::default()
        .build(&r, Some(&PublicInfo::default()), &RenderOptions::default())
        .unwrap();

    assert_eq!(vm.display_name, "chat");
    assert_eq!(vm.badges, Badges::CLOSED | Badges::NON_ANONYMOUS);
    assert!(vm.actions.is_empty());
}

#[test]
fn named_room_with_web_chat() {
    let mut r = record("lounge@example.org");
    r.nusers_moving_average = Some(41.6);
    let info = PublicInfo {
        name: Some("The Lounge".to_string()),
        description: Some("lounge".to_string()),
        web_chat_url: Some("https://x/".to_string()),
        ..PublicInfo::default()
    };

    let vm = RoomViewModelBuilder::default()
        .build(&r, Some(&info), &RenderOptions::default())
        .unwrap();

    assert_eq!(vm.display_name, "The Lounge");
    assert_eq!(vm.display_user_count.as_ref().map(|c| c.value), Some(42));
    assert_eq!(
        vm.actions.iter().map(|a| a.kind).collect::<Vec<_>>(),
        vec![ActionKind::Join]
    );
    assert_eq!(vm.actions[0].url, "https://x/");
    assert_eq!(vm.display_description, None);
}

#[test]
fn description_equal_to_localpart_is_suppressed() {
    let info = PublicInfo {
        description: Some("lounge".to_string()),
        ..PublicInfo::default()
    };
    for revision in [PrecedenceRevision::Legacy, PrecedenceRevision::Current] {
        let builder = RoomViewModelBuilder::new(BuilderConfig {
            precedence: Precedence::for_revision(revision),
            ..BuilderConfig::default()
        });
        let vm = builder
            .build(&record("lounge@example.org"), Some(&info), &RenderOptions::default())
            .unwrap();
        assert_eq!(vm.display_description, None, "{revision:?}");
    }
}

#[test]
fn service_without_localpart_uses_full_address() {
    let vm = RoomViewModelBuilder::default()
        .build(&record("conference.example.org"), None, &RenderOptions::default())
        .unwrap();
    assert_eq!(vm.display_name, "conference.example.org");
    assert_eq!(vm.address_markup.localpart, None);
}

#[test]
fn record_without_domain_is_rejected() {
    let r = RoomRecord::new(Address {
        localpart: Some("chat".to_string()),
        domain: String::new(),
    });
    let err = RoomViewModelBuilder::default()
        .build(&r, None, &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, BuildError::InvalidRecord(_)));
}

#[test]
fn builder_is_shareable_across_threads() {
    let builder = std::sync::Arc::new(RoomViewModelBuilder::default());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let builder = builder.clone();
            std::thread::spawn(move || {
                let mut r = record(&format!("room{i}@example.org"));
                r.nusers = Some(i);
                builder
                    .build(&r, None, &RenderOptions::default())
                    .map(|vm| vm.display_name)
            })
        })
        .collect();
    let names: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert_eq!(names, vec!["room0", "room1", "room2", "room3"]);
}

#[test]
fn search_results_render_with_highlighting() {
    let mut r = record("rust@example.org");
    r.nusers_moving_average = Some(12.0);
    let directory = Directory::new(vec![DirectoryEntry {
        record: r,
        public_info: Some(PublicInfo {
            name: Some("Rust users".to_string()),
            description: Some("All things Rust".to_string()),
            ..PublicInfo::default()
        }),
        has_avatar: false,
    }]);

    let outcome = directory.search("rust", SearchScope::default());
    let builder = RoomViewModelBuilder::default();
    let rooms: Vec<_> = outcome
        .results
        .iter()
        .map(|e| {
            builder
                .build(
                    &e.record,
                    e.public_info.as_ref(),
                    &RenderOptions::with_keywords(outcome.keywords.clone()),
                )
                .unwrap()
        })
        .collect();

    let html = render(Layout::CompactTable, &rooms);
    assert!(html.contains("<span class='search-match'>Rust</span> users"));
    assert!(html.contains("<span class='localpart'><span class='search-match'>rust</span></span>"));
}
