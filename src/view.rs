use std::fmt::Write;

use crate::db::TrendingEntry;
use crate::search::SearchState;
use crate::tmdb::MovieSummary;

const NO_POSTER: &str = "/no-movie.png";

/// Which of the three result panes the page shows.
#[derive(Debug, PartialEq)]
pub enum ResultsView<'a> {
    Spinner,
    Error(&'a str),
    Grid(&'a [MovieSummary]),
}

pub fn results_view(state: &SearchState) -> ResultsView<'_> {
    if state.is_loading {
        return ResultsView::Spinner;
    }
    match state.error_message.as_deref() {
        Some(msg) if !msg.is_empty() => ResultsView::Error(msg),
        _ => ResultsView::Grid(&state.movies),
    }
}

pub fn render_page(state: &SearchState) -> String {
    let mut html = String::with_capacity(8192);
    html.push_str(PAGE_HEAD);
    html.push_str("<main>\n<div class=\"pattern\"></div>\n<div class=\"wrapper\">\n");
    render_header(&mut html, &state.search_term, state.term_seq);
    render_trending(&mut html, &state.trending);
    html.push_str(&render_results(state));
    html.push_str("</div>\n</main>\n");
    html.push_str(PAGE_SCRIPT);
    html.push_str("</body>\n</html>\n");
    html
}

fn render_header(html: &mut String, search_term: &str, term_seq: u64) {
    let _ = write!(
        html,
        "<header>\n\
         <img src=\"/hero-img.png\" alt=\"Hero Banner\">\n\
         <h1>Find <span class=\"text-gradient\">Movies</span> You'll Enjoy Without the Hassle</h1>\n\
         <div class=\"search\"><div>\
         <img src=\"/search.svg\" alt=\"search\">\
         <input id=\"search\" type=\"text\" placeholder=\"Search through thousands of movies\" value=\"{}\" data-seq=\"{}\">\
         </div></div>\n\
         </header>\n",
        escape_html(search_term),
        term_seq
    );
}

/// Omitted entirely when there is nothing trending.
fn render_trending(html: &mut String, trending: &[TrendingEntry]) {
    if trending.is_empty() {
        return;
    }
    html.push_str("<section class=\"trending\">\n<h2>Trending Movies</h2>\n<ul>\n");
    for (index, entry) in trending.iter().enumerate() {
        let _ = writeln!(
            html,
            "<li data-key=\"{}\"><p>{}</p><img src=\"{}\" alt=\"{}\"></li>",
            entry.id,
            index + 1,
            escape_html(&entry.poster_url),
            escape_html(&entry.search_term)
        );
    }
    html.push_str("</ul>\n</section>\n");
}

pub fn render_results(state: &SearchState) -> String {
    let mut html = String::from("<section class=\"all-movies\" id=\"results\">\n<h2>All Movies</h2>\n");
    match results_view(state) {
        ResultsView::Spinner => {
            html.push_str("<div class=\"spinner\" role=\"status\"><span>Loading...</span></div>\n");
        }
        ResultsView::Error(msg) => {
            let _ = writeln!(html, "<p class=\"text-red-500\">{}</p>", escape_html(msg));
        }
        ResultsView::Grid(movies) => {
            html.push_str("<ul>\n");
            for movie in movies {
                render_movie_card(&mut html, movie);
            }
            html.push_str("</ul>\n");
        }
    }
    html.push_str("</section>\n");
    html
}

fn render_movie_card(html: &mut String, movie: &MovieSummary) {
    let poster = movie.poster_url().unwrap_or_else(|| NO_POSTER.to_string());
    let rating = movie
        .vote_average
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "N/A".to_string());
    let language = movie.original_language.as_deref().unwrap_or("N/A");
    let year = movie.release_year().unwrap_or("N/A");

    let _ = writeln!(
        html,
        "<li class=\"movie-card\" data-key=\"{id}\">\
         <img src=\"{poster}\" alt=\"{title}\">\
         <div class=\"mt-4\"><h3>{title}</h3>\
         <div class=\"content\">\
         <div class=\"rating\"><img src=\"/star.svg\" alt=\"Star Icon\"><p>{rating}</p></div>\
         <span>&bull;</span><p class=\"lang\">{language}</p>\
         <span>&bull;</span><p class=\"year\">{year}</p>\
         </div></div></li>",
        id = movie.id,
        poster = escape_html(&poster),
        title = escape_html(&movie.title),
        rating = rating,
        language = escape_html(language),
        year = escape_html(year),
    );
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

const PAGE_HEAD: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>Movie Finder</title>\n\
</head>\n<body>\n";

// Sends every keystroke to the server, one request at a time and numbered
// so the server can drop any that still arrive late.
const PAGE_SCRIPT: &str = r#"<script>
const input = document.getElementById('search');
let seq = Number(input.dataset.seq) || 0;
let pending = Promise.resolve();
input.addEventListener('input', (event) => {
  seq += 1;
  const body = JSON.stringify({term: event.target.value, seq: seq});
  pending = pending
    .then(() => fetch('/api/term', {
      method: 'PUT',
      headers: {'Content-Type': 'application/json'},
      body: body,
    }))
    .catch(() => {});
});
setInterval(async () => {
  const response = await fetch('/results');
  if (response.ok) {
    document.getElementById('results').outerHTML = await response.text();
  }
}, 250);
</script>
"#;
