use crate::config::Settings;
use crate::error::TranslationError;
use crate::question::Question;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One external translation request
pub trait Translate: Send + Sync {
    fn translate(&self, text: &str) -> Result<String, TranslationError>;
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// Pull `responseData.translatedText` out of a MyMemory payload
pub fn parse_translation(body: &str) -> Result<String, TranslationError> {
    let response: MyMemoryResponse =
        serde_json::from_str(body).map_err(|e| TranslationError::Decode(e.to_string()))?;

    response
        .response_data
        .and_then(|data| data.translated_text)
        .filter(|text| !text.is_empty())
        .ok_or(TranslationError::MissingText)
}

/// Blocking client for the MyMemory translation API
#[derive(Clone)]
pub struct MyMemoryClient {
    client: reqwest::blocking::Client,
    base_url: String,
    lang_pair: String,
}

impl MyMemoryClient {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.translate_url.clone(),
            lang_pair: settings.lang_pair(),
        })
    }
}

impl Translate for MyMemoryClient {
    fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", text), ("langpair", self.lang_pair.as_str())])
            .send()
            .map_err(TranslationError::Transport)?;

        if !response.status().is_success() {
            return Err(TranslationError::Status(response.status()));
        }

        let body = response.text().map_err(TranslationError::Transport)?;
        parse_translation(&body)
    }
}

/// Translations already obtained during one loading pass, keyed by exact source text
#[derive(Debug, Default, Clone)]
pub struct TranslationCache {
    entries: HashMap<String, String>,
}

impl TranslationCache {
    pub fn get(&self, text: &str) -> Option<&String> {
        self.entries.get(text)
    }

    pub fn insert(&mut self, text: String, translated: String) {
        self.entries.insert(text, translated);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cached, failure-tolerant translation on top of a [`Translate`] backend.
///
/// Nothing here returns an error: a string that cannot be translated is kept as is.
pub struct BatchTranslator<'a, T: Translate + ?Sized> {
    backend: &'a T,
    cache: TranslationCache,
    failures: u32,
}

impl<'a, T: Translate + ?Sized> BatchTranslator<'a, T> {
    pub fn new(backend: &'a T) -> Self {
        Self {
            backend,
            cache: TranslationCache::default(),
            failures: 0,
        }
    }

    /// Batches that had to be returned untranslated
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn translate_one(&mut self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        if let Some(hit) = self.cache.get(text) {
            return hit.clone();
        }

        let result = self.backend.translate(text);
        self.settle(text, result)
    }

    /// Translate every text concurrently. Output order always matches input order.
    pub fn translate_batch(&mut self, texts: &[String]) -> Vec<String> {
        let mut out: Vec<Option<String>> = texts
            .iter()
            .map(|text| {
                if text.is_empty() {
                    Some(String::new())
                } else {
                    self.cache.get(text).cloned()
                }
            })
            .collect();

        let backend = self.backend;
        let joined: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = out
                .iter()
                .enumerate()
                .filter(|(_, hit)| hit.is_none())
                .map(|(idx, _)| {
                    let text = texts[idx].as_str();
                    (idx, scope.spawn(move || backend.translate(text)))
                })
                .collect();

            // join every handle so a panicking worker cannot escape the scope
            handles
                .into_iter()
                .map(|(idx, handle)| (idx, handle.join()))
                .collect()
        });

        if joined.iter().any(|(_, res)| res.is_err()) {
            self.failures += 1;
            warn!(
                texts = texts.len(),
                "translation batch failed, keeping original text"
            );
            return texts.to_vec();
        }

        for (idx, res) in joined {
            if let Ok(result) = res {
                out[idx] = Some(self.settle(&texts[idx], result));
            }
        }

        out.into_iter()
            .zip(texts)
            .map(|(translated, original)| translated.unwrap_or_else(|| original.clone()))
            .collect()
    }

    /// Translate prompt and answers of one question as a single batch.
    pub fn translate_question(&mut self, question: &Question) -> Question {
        let translated = self.translate_batch(&question.to_batch());
        question.with_batch(translated)
    }

    fn settle(&mut self, text: &str, result: Result<String, TranslationError>) -> String {
        match result {
            Ok(translated) => {
                debug!(source = text, target = %translated, "translated");
                self.cache.insert(text.to_string(), translated.clone());
                translated
            }
            Err(e) => {
                warn!(text, error = %e, "translation failed, keeping original text");
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::QuestionKind;
    use crate::testing::serve_once;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Upper-cases text, fails for anything containing "fail", counts calls
    #[derive(Default)]
    struct Shouty {
        calls: AtomicUsize,
    }

    impl Translate for Shouty {
        fn translate(&self, text: &str) -> Result<String, TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("fail") {
                return Err(TranslationError::MissingText);
            }
            Ok(text.to_uppercase())
        }
    }

    /// Finishes later the earlier the text appears in the batch
    struct Staggered;

    impl Translate for Staggered {
        fn translate(&self, text: &str) -> Result<String, TranslationError> {
            let delay = 40u64.saturating_sub(text.len() as u64 * 10);
            std::thread::sleep(Duration::from_millis(delay));
            Ok(format!("<{text}>"))
        }
    }

    struct Exploding;

    impl Translate for Exploding {
        fn translate(&self, text: &str) -> Result<String, TranslationError> {
            if text == "boom" {
                panic!("backend exploded");
            }
            Ok(text.to_uppercase())
        }
    }

    fn strings(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn parses_translated_text() {
        let body = r#"{"responseData":{"translatedText":"Hola","match":1},"responseStatus":200}"#;
        assert_eq!(parse_translation(body).unwrap(), "Hola");
    }

    #[test]
    fn missing_translated_text_is_an_error() {
        assert_matches!(
            parse_translation(r#"{"responseStatus":403}"#),
            Err(TranslationError::MissingText)
        );
        assert_matches!(
            parse_translation(r#"{"responseData":{"translatedText":""}}"#),
            Err(TranslationError::MissingText)
        );
        assert_matches!(
            parse_translation("oops"),
            Err(TranslationError::Decode(_))
        );
    }

    #[test]
    fn empty_text_is_returned_without_a_call() {
        let backend = Shouty::default();
        let mut translator = BatchTranslator::new(&backend);
        assert_eq!(translator.translate_one(""), "");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cache_hit_skips_the_backend() {
        let backend = Shouty::default();
        let mut translator = BatchTranslator::new(&backend);

        assert_eq!(translator.translate_one("hello"), "HELLO");
        assert_eq!(translator.translate_one("hello"), "HELLO");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        let out = translator.translate_batch(&strings(&["hello", "world"]));
        assert_eq!(out, vec!["HELLO", "WORLD"]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(translator.cache().len(), 2);
    }

    #[test]
    fn failed_translation_falls_back_and_is_not_cached() {
        let backend = Shouty::default();
        let mut translator = BatchTranslator::new(&backend);

        assert_eq!(translator.translate_one("please fail"), "please fail");
        assert_eq!(translator.translate_one("please fail"), "please fail");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(translator.cache().is_empty());
        assert_eq!(translator.failures(), 0);
    }

    #[test]
    fn batch_keeps_slots_when_items_fail_independently() {
        let backend = Shouty::default();
        let mut translator = BatchTranslator::new(&backend);

        let out = translator.translate_batch(&strings(&["prompt", "fail correct", "wrong1", ""]));
        assert_eq!(out, vec!["PROMPT", "fail correct", "WRONG1", ""]);
    }

    #[test]
    fn batch_order_ignores_completion_order() {
        let mut translator = BatchTranslator::new(&Staggered);
        let out = translator.translate_batch(&strings(&["a", "bb", "ccc", "dddd"]));
        assert_eq!(out, vec!["<a>", "<bb>", "<ccc>", "<dddd>"]);
    }

    #[test]
    fn panicking_worker_returns_original_batch() {
        let mut translator = BatchTranslator::new(&Exploding);
        let batch = strings(&["fine", "boom", "also fine"]);

        assert_eq!(translator.translate_batch(&batch), batch);
        assert_eq!(translator.failures(), 1);
    }

    #[test]
    fn question_is_reassembled_by_position() {
        let backend = Shouty::default();
        let mut translator = BatchTranslator::new(&backend);
        let question = Question {
            prompt: "capital of france?".to_string(),
            correct_answer: "paris".to_string(),
            incorrect_answers: vec!["lyon".to_string(), "fail here".to_string()],
            kind: QuestionKind::Multiple,
            difficulty: "easy".to_string(),
        };

        let translated = translator.translate_question(&question);
        assert_eq!(translated.prompt, "CAPITAL OF FRANCE?");
        assert_eq!(translated.correct_answer, "PARIS");
        assert_eq!(translated.incorrect_answers, vec!["LYON", "fail here"]);
        assert_eq!(translated.difficulty, "easy");
    }

    #[test]
    fn client_builds_from_settings() {
        assert!(MyMemoryClient::new(&Settings::default()).is_ok());
    }

    #[test]
    fn client_sends_text_and_language_pair() {
        let (url, server) = serve_once(
            200,
            r#"{"responseData":{"translatedText":"hola"},"responseStatus":200}"#,
        );
        let settings = Settings {
            translate_url: url,
            ..Settings::default()
        };
        let client = MyMemoryClient::new(&settings).unwrap();

        assert_eq!(client.translate("hello & bye").unwrap(), "hola");
        assert_eq!(
            server.join().unwrap(),
            "GET /get?q=hello+%26+bye&langpair=en%7Ces HTTP/1.1"
        );
    }

    #[test]
    fn client_reports_http_errors() {
        let (url, server) = serve_once(503, "{}");
        let settings = Settings {
            translate_url: url,
            ..Settings::default()
        };
        let client = MyMemoryClient::new(&settings).unwrap();

        assert_matches!(
            client.translate("hello"),
            Err(TranslationError::Status(s)) if s.as_u16() == 503
        );
        server.join().unwrap();
    }

    #[test]
    fn unreachable_service_leaves_batch_untouched() {
        let settings = Settings {
            translate_url: "http://127.0.0.1:1/get".to_string(),
            request_timeout_secs: 2,
            ..Settings::default()
        };
        let client = MyMemoryClient::new(&settings).unwrap();
        let mut translator = BatchTranslator::new(&client);

        let batch = strings(&["hello", "world"]);
        assert_eq!(translator.translate_batch(&batch), batch);
        assert_eq!(translator.failures(), 0);
        assert!(translator.cache().is_empty());
    }
}
