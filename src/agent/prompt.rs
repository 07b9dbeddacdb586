//! Prompt construction and reply parsing for the SQL agent

use crate::storage::QueryOutput;

/// A rejected query and why, fed back into the next attempt
#[derive(Debug, Clone)]
pub struct Feedback {
    pub sql: String,
    pub error: String,
}

/// Build the prompt that asks for a single SQLite query.
pub fn sql_prompt(question: &str, schema: &str, sample: &QueryOutput, feedback: Option<&Feedback>) -> String {
    let mut prompt = format!(
        "You are an agent designed to interact with a SQLite database.\n\
         Given a question, write one syntactically correct SQLite SELECT query that answers it.\n\
         Never write INSERT, UPDATE, DELETE, DROP or any other statement that changes data.\n\
         Only use columns that exist in the schema below. Return ONLY the SQL, no explanation, no markdown.\n\n\
         Schema:\n{}\n\nSample rows:\n{}\n\n",
        schema,
        sample.to_text()
    );

    if let Some(fb) = feedback {
        prompt.push_str(&format!(
            "Your previous query failed.\nQuery: {}\nError: {}\nWrite a corrected query.\n\n",
            fb.sql, fb.error
        ));
    }

    prompt.push_str(&format!("Question: {}\n\nSQL:", question));
    prompt
}

/// Build the prompt that turns query results into a sentence for the user.
pub fn answer_prompt(question: &str, sql: &str, rows: &QueryOutput) -> String {
    let results = if rows.is_empty() && !rows.truncated {
        "(no rows)".to_string()
    } else {
        rows.to_text()
    };
    format!(
        "You answer questions about a directory of dermatologists.\n\
         A SQL query was run to answer the user's question.\n\n\
         Question: {}\nSQL: {}\nResult:\n{}\n\n\
         Answer the question in plain language using only the result above. \
         If the result is empty, say that no dermatologists matched.\n\nAnswer:",
        question, sql, results
    )
}

/// Pull the SQL out of a model reply: drop code fences, a leading label and trailing semicolons.
pub fn extract_sql(reply: &str) -> String {
    let trimmed = reply.trim();
    let inner = if let Some(s) = trimmed.strip_prefix("```sql") {
        s
    } else if let Some(s) = trimmed.strip_prefix("```") {
        s
    } else {
        trimmed
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner).trim();
    let inner = inner
        .strip_prefix("SQLQuery:")
        .or_else(|| inner.strip_prefix("SQL:"))
        .unwrap_or(inner)
        .trim();
    inner.trim_end_matches(';').trim().to_string()
}

/// Accept only a single SELECT (or WITH ... SELECT) statement.
pub fn check_read_only(sql: &str) -> Result<(), String> {
    if sql.is_empty() {
        return Err("empty query".to_string());
    }
    if let Some(end) = statement_end(sql) {
        let rest = sql[end + 1..].trim_matches(|c: char| c == ';' || c.is_whitespace());
        if !rest.is_empty() {
            return Err("only one statement is allowed".to_string());
        }
    }
    let first = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match first.as_str() {
        "select" | "with" => Ok(()),
        other => Err(format!("`{}` statements are not allowed, use SELECT", other)),
    }
}

/// Byte offset of the first `;` outside literals, quoted identifiers and comments
fn statement_end(sql: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
            }
            b'[' => {
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 1;
            }
            b';' => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}
