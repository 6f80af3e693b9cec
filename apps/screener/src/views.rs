//! Server-rendered HTML pages.
//!
//! Everything user- or model-supplied goes through `escape_html`, or through
//! `render_markdown`, which turns raw HTML in the source into inert text and
//! points links with a non-web scheme at `#`.

use std::fmt::Write;

use axum::http::StatusCode;
use pulldown_cmark::{html, CowStr, Event, Parser, Tag};

use crate::analysis::pipeline::BatchOutcome;
use crate::analysis::prompts::AnalysisTask;
use crate::models::document::{AnalysisResponseRow, PdfDocumentRow};

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #1f2933; }
nav a { margin-right: 1rem; }
form.card, section.card { border: 1px solid #d9e2ec; border-radius: 6px; padding: 1rem 1.25rem; margin: 1rem 0; }
label { display: block; margin-top: .75rem; font-weight: 600; }
input[type=text], input[type=email], input[type=password], textarea, select { width: 100%; padding: .4rem; box-sizing: border-box; }
textarea { min-height: 8rem; }
button { margin-top: 1rem; padding: .5rem 1.25rem; }
.error { background: #fde8e8; border: 1px solid #f8b4b4; padding: .75rem; border-radius: 4px; }
.notice { background: #e3f8e8; border: 1px solid #9be1ac; padding: .75rem; border-radius: 4px; }
pre.extracted { white-space: pre-wrap; max-height: 16rem; overflow-y: auto; background: #f5f7fa; padding: .75rem; }
table { border-collapse: collapse; width: 100%; margin-bottom: 2rem; }
th, td { border: 1px solid #d9e2ec; padding: .4rem; vertical-align: top; text-align: left; }
td.text { white-space: pre-wrap; max-width: 32rem; }
"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>"#,
        title = escape_html(title),
    )
}

pub fn login_page() -> String {
    layout(
        "Login",
        r#"<h1>Resume Screener</h1>
<form class="card" method="post" action="/login">
  <h2>Login</h2>
  <label for="username">Username</label>
  <input type="text" id="username" name="username" required>
  <label for="password">Password</label>
  <input type="password" id="password" name="password" required>
  <button type="submit">Login</button>
</form>
<p>No account yet? <a href="/register">Register</a></p>"#,
    )
}

pub fn register_page() -> String {
    layout(
        "Register",
        r#"<h1>Resume Screener</h1>
<form class="card" method="post" action="/register">
  <h2>Create an account</h2>
  <label for="username">Username</label>
  <input type="text" id="username" name="username" required>
  <label for="email">Email</label>
  <input type="email" id="email" name="email" required>
  <label for="password">Password</label>
  <input type="password" id="password" name="password" required>
  <button type="submit">Register</button>
</form>
<p>Already registered? <a href="/login">Login</a></p>"#,
    )
}

pub fn home_page(username: &str, outcome: &BatchOutcome) -> String {
    let mut body = format!(
        r#"<nav><a href="/home">Home</a><a href="/work">Stored records</a><a href="/logout">Logout</a></nav>
<h1>Welcome, {}</h1>
"#,
        escape_html(username)
    );

    if let Some(error) = &outcome.error {
        let _ = writeln!(body, r#"<p class="error">{}</p>"#, escape_html(error));
    }
    if let Some(message) = &outcome.message {
        let _ = writeln!(body, r#"<div class="notice">{}</div>"#, render_markdown(message));
    }

    body.push_str(
        r#"<form class="card" method="post" action="/home" enctype="multipart/form-data">
  <label for="job_description">Job description</label>
  <textarea id="job_description" name="job_description"></textarea>
  <label for="resume_files">Resume PDFs</label>
  <input type="file" id="resume_files" name="resume_files" accept="application/pdf" multiple>
  <label for="task">Task</label>
  <select id="task" name="task">
"#,
    );
    for task in AnalysisTask::ALL {
        let _ = writeln!(
            body,
            r#"    <option value="{}">{}</option>"#,
            task.as_str(),
            task.label()
        );
    }
    body.push_str("  </select>\n  <button type=\"submit\">Analyze</button>\n</form>\n");

    for result in &outcome.results {
        let _ = write!(
            body,
            r#"<section class="card">
  <h2>{file_name}</h2>
  <p><strong>Match percentage:</strong> {percentage:.2}%</p>
  <h3>Analysis</h3>
  <div class="analysis">{analysis}</div>
  <details><summary>Extracted text</summary><pre class="extracted">{extracted}</pre></details>
</section>
"#,
            file_name = escape_html(&result.file_name),
            percentage = result.match_percentage,
            analysis = render_markdown(&result.generated_text),
            extracted = escape_html(&result.extracted_text),
        );
    }

    layout("Home", &body)
}

pub fn work_page(documents: &[PdfDocumentRow], responses: &[AnalysisResponseRow]) -> String {
    let mut body = String::from(
        r#"<nav><a href="/home">Home</a><a href="/logout">Logout</a></nav>
<h1>Stored records</h1>
<h2>Extracted documents</h2>
<table>
<tr><th>ID</th><th>File name</th><th>Extracted text</th><th>Uploaded at</th></tr>
"#,
    );
    for doc in documents {
        let _ = writeln!(
            body,
            r#"<tr><td>{}</td><td>{}</td><td class="text">{}</td><td>{}</td></tr>"#,
            doc.id,
            escape_html(&doc.file_name),
            escape_html(&doc.extracted_text),
            doc.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    body.push_str(
        r#"</table>
<h2>Generated responses</h2>
<table>
<tr><th>ID</th><th>File name</th><th>Response</th><th>Match %</th><th>Created at</th></tr>
"#,
    );
    for response in responses {
        let percentage = response
            .match_percentage
            .map(|p| format!("{p:.2}"))
            .unwrap_or_default();
        let _ = writeln!(
            body,
            r#"<tr><td>{}</td><td>{}</td><td class="text">{}</td><td>{}</td><td>{}</td></tr>"#,
            response.id,
            escape_html(&response.file_name),
            escape_html(&response.response_text),
            percentage,
            response.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    body.push_str("</table>\n");

    layout("Stored records", &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    layout(
        status.canonical_reason().unwrap_or("Error"),
        &format!(
            r#"<p class="error">{}</p>
<p><a href="/login">Back to login</a></p>"#,
            escape_html(message)
        ),
    )
}

/// Renders Markdown to HTML. Raw HTML blocks in the source are emitted as text.
pub fn render_markdown(source: &str) -> String {
    let events = Parser::new(source).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::Start(Tag::Link(kind, dest, title)) => {
            Event::Start(Tag::Link(kind, safe_destination(dest), title))
        }
        Event::Start(Tag::Image(kind, dest, title)) => {
            Event::Start(Tag::Image(kind, safe_destination(dest), title))
        }
        other => other,
    });
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    if is_allowed_url(&dest) {
        dest
    } else {
        CowStr::Borrowed("#")
    }
}

/// Relative URLs pass; absolute ones only with http, https or mailto.
/// Whitespace and control characters are stripped before the scheme is read.
fn is_allowed_url(dest: &str) -> bool {
    let compact: String = dest
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    match compact.find(':') {
        None => true,
        Some(idx) => {
            let scheme = &compact[..idx];
            scheme.contains(&['/', '?', '#'][..]) || matches!(scheme, "http" | "https" | "mailto")
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
