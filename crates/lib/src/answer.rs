//! Answer producers: search-grounded completion (Infobot) and multi-turn chat (Conversational).

use crate::llm::{
    ChatPrompt, GenerationBackend, GenerationError, GenerationParams, CHAT_MODEL, TEXT_MODEL,
};
use crate::search::{SearchBackend, SearchError, SearchResult};
use crate::template::{self, TemplateError};
use crate::webhook::{ConversationalAnswerArgs, InfobotAnswerArgs};

/// A request-fatal failure while producing an answer.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("encoding search results: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One JSON object per line, in result order.
pub fn search_results_block(results: &[SearchResult]) -> Result<String, serde_json::Error> {
    let lines = results
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

/// Search, then complete the context template with the results. Returns the negative response
/// unchanged when nothing usable was found. The results are returned either way.
pub async fn answer_infobot(
    args: &InfobotAnswerArgs,
    search: &dyn SearchBackend,
    generation: &dyn GenerationBackend,
) -> Result<(String, Vec<SearchResult>), AnswerError> {
    let results = search.search(&args.search_query).await?;
    let usable = results.first().is_some_and(SearchResult::has_long_snippet);
    if !usable {
        log::info!(
            "infobot: no usable search result for {:?} ({} result(s)), using negative response",
            args.search_query,
            results.len()
        );
        return Ok((args.negative_response.clone(), results));
    }

    let search_results = search_results_block(&results)?;
    let prompt = template::fill(
        &args.context,
        &[
            ("last_query", args.last_query.as_str()),
            ("search_query", args.search_query.as_str()),
            ("search_results", search_results.as_str()),
        ],
    )?;
    let answer = generation
        .predict(TEXT_MODEL, &GenerationParams::FIXED, &prompt)
        .await?;
    Ok((answer, results))
}

/// Answer the next chat message. History is passed to the model and left untouched.
pub async fn answer_conversational(
    args: &ConversationalAnswerArgs,
    generation: &dyn GenerationBackend,
) -> Result<String, AnswerError> {
    let prompt = ChatPrompt {
        message: &args.message,
        context: &args.context,
        history: &args.history,
        examples: &args.examples,
    };
    let answer = generation
        .chat(CHAT_MODEL, &GenerationParams::FIXED, prompt)
        .await?;
    Ok(answer)
}


#[cfg(test)]
mod tests {
    use super::fakes::{FakeGeneration, FakeSearch};
    use super::*;
    use crate::llm::HistoryTurn;

    fn result(title: &str, long_snippet: Option<&str>) -> SearchResult {
        SearchResult {
            title: Some(title.to_string()),
            snippet: Some(format!("{} snippet", title)),
            link: Some(format!("https://example.com/{}", title)),
            long_snippet: long_snippet.map(str::to_string),
        }
    }

    fn infobot_args() -> InfobotAnswerArgs {
        InfobotAnswerArgs {
            search_query: "hours".to_string(),
            last_query: "Q:parking A:Lot B".to_string(),
            context: "Last: {last_query}\nQuestion: {search_query}\nResults:\n{search_results}"
                .to_string(),
            negative_response: "Sorry, I couldn't find that.".to_string(),
        }
    }

    #[tokio::test]
    async fn infobot_prompt_embeds_query_last_query_and_every_result() {
        let results = vec![
            result("hours", Some("Open 9 to 5")),
            result("holidays", None),
        ];
        let search = FakeSearch::returning(results.clone());
        let generation = FakeGeneration::replying("We are open 9-5.");

        let (answer, returned) = answer_infobot(&infobot_args(), &search, &generation)
            .await
            .unwrap();

        assert_eq!(answer, "We are open 9-5.");
        assert_eq!(returned, results);
        assert_eq!(search.queries.lock().unwrap().as_slice(), ["hours"]);

        let prompts = generation.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        let (model, prompt) = &prompts[0];
        assert_eq!(model, TEXT_MODEL);
        assert!(prompt.contains("Question: hours"));
        assert!(prompt.contains("Last: Q:parking A:Lot B"));
        for r in &results {
            assert!(prompt.contains(&serde_json::to_string(r).unwrap()));
        }
        assert_eq!(
            generation.params.lock().unwrap().as_slice(),
            [GenerationParams::FIXED]
        );
    }

    #[tokio::test]
    async fn infobot_without_results_returns_negative_response() {
        let search = FakeSearch::returning(Vec::new());
        let generation = FakeGeneration::replying("unused");

        let (answer, results) = answer_infobot(&infobot_args(), &search, &generation)
            .await
            .unwrap();

        assert_eq!(answer, "Sorry, I couldn't find that.");
        assert!(results.is_empty());
        assert_eq!(generation.calls(), 0);
    }

    #[tokio::test]
    async fn infobot_top_result_without_long_snippet_returns_negative_response() {
        let results = vec![result("hours", Some("")), result("other", Some("text"))];
        let search = FakeSearch::returning(results.clone());
        let generation = FakeGeneration::replying("unused");

        let (answer, returned) = answer_infobot(&infobot_args(), &search, &generation)
            .await
            .unwrap();

        assert_eq!(answer, "Sorry, I couldn't find that.");
        assert_eq!(returned, results);
        assert_eq!(generation.calls(), 0);
    }

    #[tokio::test]
    async fn infobot_search_failure_is_fatal() {
        let search = FakeSearch {
            fail: true,
            ..Default::default()
        };
        let generation = FakeGeneration::replying("unused");
        let err = answer_infobot(&infobot_args(), &search, &generation)
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerError::Search(_)));
        assert_eq!(generation.calls(), 0);
    }

    #[tokio::test]
    async fn infobot_generation_failure_is_fatal() {
        let search = FakeSearch::returning(vec![result("hours", Some("Open 9 to 5"))]);
        let generation = FakeGeneration {
            fail: true,
            ..Default::default()
        };
        let err = answer_infobot(&infobot_args(), &search, &generation)
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerError::Generation(_)));
    }

    #[tokio::test]
    async fn infobot_bad_template_is_fatal() {
        let search = FakeSearch::returning(vec![result("hours", Some("Open 9 to 5"))]);
        let generation = FakeGeneration::replying("unused");
        let mut args = infobot_args();
        args.context = "Use {unknown}".to_string();
        let err = answer_infobot(&args, &search, &generation).await.unwrap_err();
        assert!(matches!(err, AnswerError::Template(_)));
        assert_eq!(generation.calls(), 0);
    }

    #[tokio::test]
    async fn conversational_passes_message_context_history_and_examples() {
        let generation = FakeGeneration::replying("Sure thing.");
        let args = ConversationalAnswerArgs {
            message: "can you help?".to_string(),
            history: vec![HistoryTurn::user("hi"), HistoryTurn::bot("hello")],
            context: "You are a helpful assistant.".to_string(),
            examples: vec![crate::llm::ExamplePair {
                input_text: "ping".to_string(),
                output_text: "pong".to_string(),
            }],
        };

        let answer = answer_conversational(&args, &generation).await.unwrap();

        assert_eq!(answer, "Sure thing.");
        let chats = generation.chats.lock().unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].model, CHAT_MODEL);
        assert_eq!(chats[0].message, "can you help?");
        assert_eq!(chats[0].context, "You are a helpful assistant.");
        assert_eq!(chats[0].history, args.history);
        assert_eq!(chats[0].examples, 1);
    }

    #[test]
    fn results_block_is_one_json_object_per_line() {
        let block = search_results_block(&[result("a", None), result("b", Some("long"))]).unwrap();
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"title":"a","snippet":"a snippet","link":"https://example.com/a"}"#
        );
        assert!(lines[1].ends_with(r#""long_snippet":"long"}"#));
        assert_eq!(search_results_block(&[]).unwrap(), "");
    }
}
