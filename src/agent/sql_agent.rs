use std::sync::Arc;

use tokio::sync::Mutex;

use super::prompt::{self, Feedback};
use super::{AgentError, Answer};
use crate::config::AgentConfig;
use crate::llm::LlmProvider;
use crate::storage::DermatologistStore;

/// Sample rows shown to the model alongside the schema
const SAMPLE_ROWS: usize = 3;

/// Answers questions by having the model write SQL, running it, then
/// having the model phrase the result.
pub struct SqlAgent {
    llm: Arc<dyn LlmProvider>,
    store: Arc<Mutex<DermatologistStore>>,
    settings: AgentConfig,
}

impl SqlAgent {
    pub fn new(llm: Arc<dyn LlmProvider>, store: Arc<Mutex<DermatologistStore>>, settings: AgentConfig) -> Self {
        Self { llm, store, settings }
    }

    pub fn store(&self) -> &Arc<Mutex<DermatologistStore>> {
        &self.store
    }

    pub async fn answer(&self, question: &str) -> Result<Answer, AgentError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AgentError::EmptyQuestion);
        }

        let (schema, sample) = {
            let store = self.store.lock().await;
            (store.schema_sql()?, store.sample_rows(SAMPLE_ROWS)?)
        };

        let attempts = self.settings.max_attempts.max(1);
        let mut feedback: Option<Feedback> = None;

        for attempt in 1..=attempts {
            let request = prompt::sql_prompt(question, &schema, &sample, feedback.as_ref());
            let reply = self.llm.complete(&request).await?;
            let sql = prompt::extract_sql(&reply);
            tracing::debug!("Attempt {}/{} via {}: {}", attempt, attempts, self.llm.name(), sql);

            if let Err(error) = prompt::check_read_only(&sql) {
                tracing::warn!("Rejected query: {}", error);
                feedback = Some(Feedback { sql, error });
                continue;
            }

            let result = self.store.lock().await.run_query(&sql, self.settings.row_limit);
            match result {
                Ok(rows) => {
                    let text = self
                        .llm
                        .complete(&prompt::answer_prompt(question, &sql, &rows))
                        .await?;
                    return Ok(Answer {
                        text: text.trim().to_string(),
                        sql,
                        rows,
                    });
                }
                Err(e) => {
                    tracing::warn!("Query failed: {}", e);
                    feedback = Some(Feedback { sql, error: e.to_string() });
                }
            }
        }

        Err(AgentError::GaveUp {
            attempts,
            last_error: feedback.map(|f| f.error).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::llm::scripted::ScriptedLlm;

    fn agent(llm: Arc<ScriptedLlm>) -> SqlAgent {
        let store = DermatologistStore::open_seeded_in_memory().unwrap();
        SqlAgent::new(llm, Arc::new(Mutex::new(store)), AgentConfig::default())
    }

    #[tokio::test]
    async fn test_answers_from_query_rows() {
        let llm = ScriptedLlm::new(vec![
            Ok("```sql\nSELECT name FROM dermatologists WHERE city = 'New York' AND status = 'Active';\n```".into()),
            Ok("Dr. Alice Smith is the active dermatologist in New York.\n".into()),
        ]);
        let answer = agent(llm.clone()).answer("Show all active dermatologists in New York").await.unwrap();

        assert_eq!(answer.text, "Dr. Alice Smith is the active dermatologist in New York.");
        assert_eq!(answer.sql, "SELECT name FROM dermatologists WHERE city = 'New York' AND status = 'Active'");
        assert_eq!(answer.rows.rows, vec![vec!["Dr. Alice Smith".to_string()]]);

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("CREATE TABLE dermatologists"));
        assert!(prompts[1].contains("Dr. Alice Smith"));
    }

    #[tokio::test]
    async fn test_sql_error_is_fed_back() {
        let llm = ScriptedLlm::new(vec![
            Ok("SELECT speciality FROM dermatologists".into()),
            Ok("SELECT name FROM dermatologists WHERE specialties LIKE '%Acne%'".into()),
            Ok("Dr. Alice Smith treats acne.".into()),
        ]);
        let answer = agent(llm.clone()).answer("who treats acne?").await.unwrap();

        assert_eq!(answer.text, "Dr. Alice Smith treats acne.");
        let prompts = llm.prompts();
        assert!(prompts[1].contains("no such column: speciality"));
    }

    #[tokio::test]
    async fn test_write_statements_are_never_run() {
        let llm = ScriptedLlm::new(vec![
            Ok("DELETE FROM dermatologists".into()),
            Ok("DROP TABLE dermatologists".into()),
            Ok("UPDATE dermatologists SET status = 'Inactive'".into()),
        ]);
        let agent = agent(llm);
        let err = agent.answer("remove everyone").await.unwrap_err();

        assert!(matches!(err, AgentError::GaveUp { attempts: 3, .. }));
        assert_eq!(agent.store().lock().await.count().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_blank_question_skips_the_model() {
        let llm = ScriptedLlm::new(vec![]);
        let err = agent(llm.clone()).answer("   ").await.unwrap_err();

        assert!(matches!(err, AgentError::EmptyQuestion));
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_unchanged() {
        let llm = ScriptedLlm::new(vec![Err(LlmError::RateLimited(
            "RESOURCE_EXHAUSTED: Quota exceeded".into(),
        ))]);
        let err = agent(llm.clone()).answer("how many doctors?").await.unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(llm.prompts().len(), 1);
    }
}
