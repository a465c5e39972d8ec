//! The dashboard page.
//!
//! The HTML is rendered once at startup: the template only needs the tab
//! title and the date span of the loaded data. Everything else is fetched by
//! the page from `/api`.

use std::sync::Arc;

use axum::{extract::State, response::Html};
use covid_core::Pipeline;

const TEMPLATE: &str = include_str!("../static/index.html");

/// `dd/mm/yyyy`, as shown in the subheading.
const SUBTITLE_DATE_FORMAT: &str = "%d/%m/%Y";

pub struct Page {
  html: String,
}

impl Page {
  pub fn render(title: &str, pipeline: &Pipeline) -> Self {
    let subtitle = match pipeline.date_range() {
      Some((first, last)) => format!(
        "Statistics Date ({} - {})",
        first.format(SUBTITLE_DATE_FORMAT),
        last.format(SUBTITLE_DATE_FORMAT)
      ),
      None => "No statistics loaded".to_owned(),
    };
    let html = TEMPLATE
      .replace("{{title}}", &escape_html(title))
      .replace("{{subtitle}}", &escape_html(&subtitle));
    Self { html }
  }

  pub fn html(&self) -> &str { &self.html }
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

/// `GET /`
pub async fn handler(State(page): State<Arc<Page>>) -> Html<String> {
  Html(page.html.clone())
}
