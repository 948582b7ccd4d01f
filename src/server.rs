use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt::Write;
use std::sync::Arc;

use warp::http::{StatusCode, Uri};
use warp::reply::{self, Reply, Response};
use warp::Filter;

use crate::config::DirectoryConfig;
use crate::directory::{
    visible_pages, ApiPage, Directory, DirectoryEntry, ListingFilter, SearchScope, Statistics,
};
use crate::highlight::escape_html;
use crate::room::RenderOptions;
use crate::surface::{render, Layout};
use crate::view::{RoomViewModel, RoomViewModelBuilder};

type Query = HashMap<String, String>;

#[derive(Clone)]
pub struct Server {
    directory: Arc<Directory>,
    builder: Arc<RoomViewModelBuilder>,
    config: Arc<DirectoryConfig>,
}

impl Server {
    pub fn new(config: DirectoryConfig, directory: Directory) -> Self {
        Server {
            directory: Arc::new(directory),
            builder: Arc::new(RoomViewModelBuilder::new(config.builder_config())),
            config: Arc::new(config),
        }
    }

    pub fn routes(self) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
        let server = Arc::new(self);

        let index = warp::path::end()
            .and(warp::get())
            .map(|| warp::redirect::see_other(Uri::from_static("/rooms/1")).into_response());

        let first_page = warp::path!("rooms")
            .and(warp::get())
            .and(warp::query::<Query>())
            .and(with_server(server.clone()))
            .map(|query: Query, server: Arc<Server>| server.room_list(1, &query));

        let room_page = warp::path!("rooms" / usize)
            .and(warp::get())
            .and(warp::query::<Query>())
            .and(with_server(server.clone()))
            .map(|page: usize, query: Query, server: Arc<Server>| server.room_list(page, &query));

        let search = warp::path!("search")
            .and(warp::get())
            .and(warp::query::<Query>())
            .and(with_server(server.clone()))
            .map(|query: Query, server: Arc<Server>| server.search(&query));

        let stats = warp::path!("stats")
            .and(warp::get())
            .and(with_server(server.clone()))
            .map(|server: Arc<Server>| server.statistics());

        let api = warp::path!("api" / "1.0" / "rooms.json")
            .and(warp::get())
            .and(warp::query::<Query>())
            .and(with_server(server))
            .map(|query: Query, server: Arc<Server>| server.api_rooms(&query));

        index
            .or(first_page)
            .unify()
            .or(room_page)
            .unify()
            .or(search)
            .unify()
            .or(stats)
            .unify()
            .or(api)
            .unify()
    }

    fn listing_filter(&self, include_closed: bool) -> ListingFilter {
        ListingFilter {
            include_closed,
            min_users: self.config.min_users,
        }
    }

    fn view_models(&self, entries: &[&DirectoryEntry], keywords: &[String]) -> Vec<RoomViewModel> {
        entries
            .iter()
            .filter_map(|entry| {
                let options = RenderOptions {
                    keywords: keywords.to_vec(),
                    has_avatar: entry.has_avatar,
                };
                self.builder
                    .build(&entry.record, entry.public_info.as_ref(), &options)
                    .map_err(|e| log::warn!("skipping {}: {e}", entry.record.address))
                    .ok()
            })
            .collect()
    }

    fn room_list(&self, page: usize, query: &Query) -> Response {
        let Some(layout) = query
            .get("layout")
            .map_or(Some(Layout::default()), |name| Layout::from_name(name))
        else {
            return error_page(StatusCode::BAD_REQUEST, "Unknown layout");
        };

        let page = match self
            .directory
            .page(page, self.config.per_page, self.listing_filter(false))
        {
            Ok(page) => page,
            Err(e) => return error_page(StatusCode::BAD_REQUEST, &e.to_string()),
        };
        if page.page > page.pages.max(1) {
            return error_page(StatusCode::NOT_FOUND, "No such page");
        }

        let rooms = self.view_models(&page.items, &[]);
        let mut body = format!("<p>{} rooms listed.</p>", page.total);
        body.push_str(&render(layout, &rooms));
        body.push_str(&pagination(page.page, page.pages));
        reply::html(document("Rooms", &body)).into_response()
    }

    fn search(&self, query: &Query) -> Response {
        let Some(text) = query.get("q") else {
            return reply::html(document("Search", &search_form("", SearchScope::default())))
                .into_response();
        };

        let scope = if query.contains_key("f") {
            SearchScope {
                address: query.contains_key("sinaddr"),
                description: query.contains_key("sindescr"),
                name: query.contains_key("sinname"),
            }
        } else {
            SearchScope::default()
        };

        let outcome = self.directory.search(text, scope);
        let mut body = search_form(text, scope);
        if outcome.no_keywords {
            body.push_str("<p class='error'>Please enter at least one keyword of three or more characters.</p>");
        } else if outcome.too_many_keywords {
            body.push_str("<p class='error'>Too many keywords; use at most five.</p>");
        } else {
            if outcome.too_many_results {
                body.push_str("<p class='warning'>Only the first 100 results are shown.</p>");
            }
            let rooms = self.view_models(&outcome.results, &outcome.keywords);
            body.push_str(&render(Layout::CardGrid, &rooms));
        }
        reply::html(document("Search", &body)).into_response()
    }

    fn statistics(&self) -> Response {
        let body = statistics_table(&self.directory.statistics());
        reply::html(document("Statistics", &body)).into_response()
    }

    fn api_rooms(&self, query: &Query) -> Response {
        let Some(page) = query.get("p").and_then(|p| p.parse::<usize>().ok()) else {
            return reply::with_status("missing or invalid page", StatusCode::BAD_REQUEST)
                .into_response();
        };
        let include_closed = query.contains_key("include_closed");

        match self
            .directory
            .page(page, self.config.api_per_page, self.listing_filter(include_closed))
        {
            Ok(page) => reply::json(&ApiPage::from(page)).into_response(),
            Err(e) => reply::with_status(e.to_string(), StatusCode::BAD_REQUEST).into_response(),
        }
    }
}

fn with_server(
    server: Arc<Server>,
) -> impl Filter<Extract = (Arc<Server>,), Error = Infallible> + Clone {
    warp::any().map(move || server.clone())
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset='utf-8'><title>{}</title></head><body>{body}</body></html>",
        escape_html(title)
    )
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!("<p class='error'>{}</p>", escape_html(message));
    reply::with_status(reply::html(document("Error", &body)), status).into_response()
}

fn search_form(text: &str, scope: SearchScope) -> String {
    let checked = |on: bool| if on { " checked" } else { "" };
    format!(
        "<form action='/search' method='get'><input type='search' name='q' value='{}'>\
         <input type='hidden' name='f'>\
         <label><input type='checkbox' name='sinaddr'{}> Address</label>\
         <label><input type='checkbox' name='sindescr'{}> Description</label>\
         <label><input type='checkbox' name='sinname'{}> Name</label>\
         <button type='submit'>Search</button></form>",
        escape_html(text),
        checked(scope.address),
        checked(scope.description),
        checked(scope.name),
    )
}

fn statistics_table(stats: &Statistics) -> String {
    let rows = [
        ("Rooms known", stats.nmucs),
        ("Publicly listed", stats.npublicmucs),
        ("Open to everyone", stats.nopenmucs),
        ("Hidden", stats.nhiddenmucs),
        ("Domains", stats.ndomains),
    ];
    let mut out = String::from("<table class='stats'><tbody>");
    for (label, value) in rows {
        let _ = write!(out, "<tr><th>{label}</th><td>{value}</td></tr>");
    }
    let _ = write!(
        out,
        "<tr><th>Users online</th><td>{}</td></tr></tbody></table>",
        stats.nusers
    );
    out
}

fn pagination(current: usize, pages: usize) -> String {
    let mut out = String::from("<nav class='pagination'>");
    for (page, gap) in visible_pages(current, pages) {
        if gap {
            out.push_str("<span class='gap'>…</span>");
        }
        if page == current {
            let _ = write!(out, "<span class='current'>{page}</span>");
        } else {
            let _ = write!(out, "<a href='/rooms/{page}'>{page}</a>");
        }
    }
    out.push_str("</nav>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::room::{PublicInfo, RoomRecord};

    fn server() -> Server {
        let mut closed = RoomRecord::new(Address::parse("secret@example.org").unwrap());
        closed.is_open = false;
        closed.nusers_moving_average = Some(30.0);
        let mut lounge = RoomRecord::new(Address::parse("lounge@example.org").unwrap());
        lounge.nusers_moving_average = Some(41.6);

        let entries = vec![
            DirectoryEntry {
                record: lounge,
                public_info: Some(PublicInfo {
                    name: Some("The Lounge".to_string()),
                    ..PublicInfo::default()
                }),
                has_avatar: false,
            },
            DirectoryEntry {
                record: closed,
                public_info: Some(PublicInfo::default()),
                has_avatar: false,
            },
        ];
        Server::new(DirectoryConfig::default(), Directory::new(entries))
    }

    #[tokio::test]
    async fn index_redirects_to_first_page() {
        let res = warp::test::request().path("/").reply(&server().routes()).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/rooms/1");
    }

    #[tokio::test]
    async fn room_list_renders_open_rooms() {
        let filter = server().routes();
        let res = warp::test::request().path("/rooms/1").reply(&filter).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = String::from_utf8_lossy(res.body()).to_string();
        assert!(body.contains("The Lounge"));
        assert!(!body.contains("secret"));

        let res = warp::test::request()
            .path("/rooms/1?layout=legacy")
            .reply(&filter)
            .await;
        assert!(String::from_utf8_lossy(res.body()).contains("<td class='nusers'>42</td>"));

        let res = warp::test::request().path("/rooms/7").reply(&filter).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = warp::test::request().path("/rooms/0").reply(&filter).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res = warp::test::request()
            .path("/rooms/18446744073709551615")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = warp::test::request()
            .path("/rooms/1?layout=nope")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_highlights_matches() {
        let res = warp::test::request()
            .path("/search?q=lounge")
            .reply(&server().routes())
            .await;
        let body = String::from_utf8_lossy(res.body()).to_string();
        assert!(body.contains("<span class='search-match'>Lounge</span>"));

        let res = warp::test::request()
            .path("/search?q=lo")
            .reply(&server().routes())
            .await;
        assert!(String::from_utf8_lossy(res.body()).contains("at least one keyword"));
    }

    #[tokio::test]
    async fn api_pages_and_validation() {
        let filter = server().routes();
        let res = warp::test::request()
            .path("/api/1.0/rooms.json?p=1")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["items"][0]["nusers"], 42);

        let res = warp::test::request()
            .path("/api/1.0/rooms.json?p=1&include_closed")
            .reply(&filter)
            .await;
        let json: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(json["total"], 2);

        let res = warp::test::request()
            .path("/api/1.0/rooms.json?p=18446744073709551615")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(json["items"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["total"], 1);

        for bad in ["/api/1.0/rooms.json", "/api/1.0/rooms.json?p=x", "/api/1.0/rooms.json?p=0"] {
            let res = warp::test::request().path(bad).reply(&filter).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{bad}");
        }
    }

    #[tokio::test]
    async fn stats_count_hidden_and_closed_rooms() {
        let res = warp::test::request().path("/stats").reply(&server().routes()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = String::from_utf8_lossy(res.body()).to_string();
        assert!(body.contains("<tr><th>Rooms known</th><td>2</td></tr>"));
        assert!(body.contains("<tr><th>Open to everyone</th><td>1</td></tr>"));
        assert!(body.contains("<tr><th>Domains</th><td>1</td></tr>"));
    }

    #[test]
    fn pagination_marks_current_and_gaps() {
        let nav = pagination(6, 12);
        assert!(nav.contains("<span class='current'>6</span>"));
        assert!(nav.contains("<a href='/rooms/12'>12</a>"));
        assert_eq!(nav.matches("class='gap'").count(), 2);
    }
}
