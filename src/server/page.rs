//! Server-rendered question page

use crate::agent::{AgentError, Answer};

/// Everything the page shows for one request
pub struct PageView<'a> {
    pub model: &'a str,
    pub question: &'a str,
    /// Connection banner: record count or the reason it failed
    pub connection: Result<usize, String>,
    pub result: Option<&'a Result<Answer, AgentError>>,
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; color: #1f2933; }
.banner { padding: .6rem .9rem; border-radius: .4rem; margin: 1rem 0; }
.success { background: #e3f9e5; color: #1f6d33; }
.error { background: #fde8e8; color: #9b1c1c; }
form { display: flex; gap: .5rem; }
input[type=text] { flex: 1; padding: .5rem; font-size: 1rem; }
button { padding: .5rem 1rem; font-size: 1rem; }
.answer { white-space: pre-wrap; }
footer { margin-top: 2rem; border-top: 1px solid #ccc; padding-top: .8rem; color: #52606d; }
"#;

pub fn render(view: &PageView<'_>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Dermatologist SQL Agent</title>\n");
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));
    html.push_str("<h1>&#x1FA7A; SQL Agent for the Doctors DB</h1>\n");

    match &view.connection {
        Ok(count) => html.push_str(&format!(
            "<div class=\"banner success\">Connected to the database ({} records).</div>\n",
            count
        )),
        Err(reason) => html.push_str(&format!(
            "<div class=\"banner error\">Could not read the database: {}</div>\n",
            escape_html(reason)
        )),
    }

    html.push_str(
        "<p>Ask questions about dermatologists in the database. \
         For example: 'Show all active dermatologists in New York'.</p>\n",
    );
    html.push_str(&format!(
        "<form method=\"get\" action=\"/\">\n<input type=\"text\" name=\"q\" placeholder=\"Your Question\" value=\"{}\" autofocus>\n<button type=\"submit\">Ask</button>\n</form>\n",
        escape_html(view.question)
    ));

    match view.result {
        Some(Ok(answer)) => {
            html.push_str("<h2>Answer:</h2>\n");
            html.push_str(&format!("<div class=\"answer\">{}</div>\n", escape_html(&answer.text)));
            html.push_str(&format!(
                "<details><summary>SQL</summary><pre>{}</pre></details>\n",
                escape_html(&answer.sql)
            ));
        }
        Some(Err(err)) => {
            html.push_str(&format!(
                "<div class=\"banner error\">{}</div>\n",
                escape_html(&err.user_message())
            ));
        }
        None => {}
    }

    html.push_str(&format!(
        "<footer>This application uses the {} model to interact with a SQLite database.</footer>\n",
        escape_html(view.model)
    ));
    html.push_str("</body>\n</html>\n");
    html
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
