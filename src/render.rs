//! HTML pages, rendered with maud.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde_json::Value;

use crate::diary::DiaryEntry;

/// Pages with fixed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticPage {
    Home,
    ThankYou,
    Why,
    Parkour,
    Weekly,
    Projects,
}

impl StaticPage {
    /// Label written to the activity log when the page is viewed.
    pub fn action(self) -> &'static str {
        match self {
            StaticPage::Home => "Viewed Home Page",
            StaticPage::ThankYou => "Viewed Thank You Page",
            StaticPage::Why => "Viewed Why Page",
            StaticPage::Parkour => "Viewed Parkour Page",
            StaticPage::Weekly => "Viewed Weekly Page",
            StaticPage::Projects => "Viewed Projects Page",
        }
    }

    fn title(self) -> &'static str {
        match self {
            StaticPage::Home => "Home",
            StaticPage::ThankYou => "Thank You",
            StaticPage::Why => "Why",
            StaticPage::Parkour => "Parkour",
            StaticPage::Weekly => "Weekly",
            StaticPage::Projects => "Projects",
        }
    }

    pub fn render(self) -> Markup {
        let body = match self {
            StaticPage::Home => html! {
                h1 { "Thank you for stopping by" }
                p { "This is a small corner of the web for saying thanks, writing things down and saying goodbye." }
                p { "Total views so far: " span id="views" { "…" } }
                script {
                    (PreEscaped(r#"fetch("/api/views").then(r => r.json()).then(d => { document.getElementById("views").textContent = d.total_views; });"#))
                }
            },
            StaticPage::ThankYou => html! {
                h1 { "Thank you" }
                p { "To everyone who helped, listened, taught or simply showed up: thank you. This site exists because of you." }
                p { a href="/honour" { "See the honour wall" } }
            },
            StaticPage::Why => html! {
                h1 { "Why this site exists" }
                p { "Some thanks are too big for a message and too small for a book. They end up here instead." }
            },
            StaticPage::Parkour => html! {
                h1 { "Parkour" }
                p { "Notes, spots and progress from training. Movement is a conversation with the city." }
            },
            StaticPage::Weekly => html! {
                h1 { "Weekly" }
                p { "A short weekly log of what happened, what was learned and what comes next." }
            },
            StaticPage::Projects => html! {
                h1 { "Projects" }
                p { "Things built along the way, finished or otherwise." }
            },
        };
        layout(self.title(), body)
    }
}

pub fn honour(entries: &[Value]) -> Markup {
    entry_list(
        "Honour Wall",
        "People who deserve more thanks than a page can hold.",
        entries,
    )
}

pub fn goodbyes(entries: &[Value]) -> Markup {
    entry_list("Goodbyes", "Words left behind on the way out.", entries)
}

pub fn diaries(entries: &[DiaryEntry]) -> Markup {
    layout(
        "Diaries",
        html! {
            h1 { "Diaries" }
            @if entries.is_empty() {
                p.empty { "Nothing written yet." }
            }
            @for entry in entries {
                article.diary {
                    h2 { (entry.title) }
                    (PreEscaped(&entry.html))
                }
            }
        },
    )
}

pub fn server_error() -> Markup {
    layout(
        "Internal Server Error",
        html! {
            h1 { "Internal Server Error" }
            p { "Something went wrong while loading this page." }
        },
    )
}

fn entry_list(title: &str, intro: &str, entries: &[Value]) -> Markup {
    layout(
        title,
        html! {
            h1 { (title) }
            p { (intro) }
            @if entries.is_empty() {
                p.empty { "No entries yet." }
            }
            ul.entries {
                @for entry in entries {
                    li { (json_entry(entry)) }
                }
            }
        },
    )
}

/// Renders an opaque JSON entry verbatim: objects as key/value pairs in
/// document order, everything else as text.
fn json_entry(value: &Value) -> Markup {
    match value {
        Value::Object(fields) => html! {
            dl.entry {
                @for (key, field) in fields {
                    dt { (key) }
                    dd { (plain_text(field)) }
                }
            }
        },
        other => html! { p.entry { (plain_text(other)) } },
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
            }
            body {
                nav {
                    a href="/" { "Home" } " · "
                    a href="/thankyou" { "Thank You" } " · "
                    a href="/why" { "Why" } " · "
                    a href="/honour" { "Honour" } " · "
                    a href="/diaries" { "Diaries" } " · "
                    a href="/goodbyes" { "Goodbyes" } " · "
                    a href="/parkour" { "Parkour" } " · "
                    a href="/weekly" { "Weekly" } " · "
                    a href="/projects" { "Projects" }
                }
                main { (body) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_static_page_has_a_title() {
        for page in [
            StaticPage::Home,
            StaticPage::ThankYou,
            StaticPage::Why,
            StaticPage::Parkour,
            StaticPage::Weekly,
            StaticPage::Projects,
        ] {
            let html = page.render().into_string();
            assert!(html.starts_with("<!DOCTYPE html>"));
            assert!(html.contains(&format!("<title>{}</title>", page.title())));
        }
    }

    #[test]
    fn entries_are_escaped_and_ordered() {
        let entries = vec![json!({"name": "<b>Ada</b>", "message": "thanks", "year": 2024})];

        let html = honour(&entries).into_string();

        assert!(html.contains("<dt>name</dt><dd>&lt;b&gt;Ada&lt;/b&gt;</dd>"));
        assert!(html.contains("<dt>year</dt><dd>2024</dd>"));
        let name_at = html.find("<dt>name</dt>").unwrap();
        let message_at = html.find("<dt>message</dt>").unwrap();
        assert!(name_at < message_at);
    }

    #[test]
    fn non_object_entries_render_as_text() {
        let html = goodbyes(&[json!("see you"), json!(42)]).into_string();

        assert!(html.contains("<p class=\"entry\">see you</p>"));
        assert!(html.contains("<p class=\"entry\">42</p>"));
    }

    #[test]
    fn empty_lists_say_so() {
        assert!(goodbyes(&[]).into_string().contains("No entries yet."));
        assert!(diaries(&[]).into_string().contains("Nothing written yet."));
    }

    #[test]
    fn diary_html_is_not_escaped() {
        let entries = vec![DiaryEntry {
            title: "2024-02-01".to_string(),
            html: "<p>hello</p>".to_string(),
        }];

        let html = diaries(&entries).into_string();

        assert!(html.contains("<h2>2024-02-01</h2><p>hello</p>"));
    }
}
