use crate::evaluation::EvaluationContext;

use super::FlagRow;

/// Paths offered in the navigation bar. The backend's targeting rules key off
/// these, so visiting each one shows a different mix of flag values.
pub const NAV_LINKS: [(&str, &str); 12] = [
    ("/", "Home"),
    ("/pricing", "Pricing"),
    ("/features", "Features"),
    ("/docs", "Docs"),
    ("/blog", "Blog"),
    ("/about", "About"),
    ("/careers", "Careers"),
    ("/contact", "Contact"),
    ("/login", "Log in"),
    ("/signup", "Sign up"),
    ("/dashboard", "Dashboard"),
    ("/settings", "Settings"),
];

pub const NO_FLAGS_NOTICE: &str = "<p>No flags found for this context.</p>";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem}\
nav a{margin-right:.75rem}\
nav a.active{font-weight:bold;text-decoration:none}\
table{border-collapse:collapse;margin-top:1rem}\
th,td{border:1px solid #ccc;padding:.25rem .5rem;text-align:left}";

pub fn escape(input: &str) -> String {
    html_escape::encode_quoted_attribute(input).into_owned()
}

pub fn render_nav(current_path: &str) -> String {
    let links: Vec<String> = NAV_LINKS
        .iter()
        .map(|(path, label)| {
            let class = if *path == current_path {
                " class=\"active\""
            } else {
                ""
            };
            format!("<a href=\"{}\"{}>{}</a>", escape(path), class, escape(label))
        })
        .collect();

    format!("<nav>{}</nav>", links.join(""))
}

fn render_row(row: &FlagRow) -> String {
    format!(
        "<tr class=\"flag\"><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td></tr>",
        escape(&row.key),
        escape(&row.value),
        escape(&row.reason),
        escape(row.in_experiment),
    )
}

pub fn render_page(context: &EvaluationContext, rows: &[FlagRow]) -> String {
    let context_json = serde_json::to_string(context).unwrap_or_default();
    let body: String = rows.iter().map(render_row).collect();

    format!(
        "<!DOCTYPE html>\
<html><head><meta charset=\"utf-8\"><title>Flag overview</title><style>{style}</style></head>\
<body>\
<p class=\"context\">Context: <code>{context}</code></p>\
{nav}\
<table><thead><tr><th>Flag</th><th>Value</th><th>Reason</th><th>In experiment</th></tr></thead>\
<tbody>{body}</tbody></table>\
</body></html>",
        style = STYLE,
        context = escape(&context_json),
        nav = render_nav(&context.path),
        body = body,
    )
}
