//! Yes/no questions and option selection on top of [`get_response`].
//!
//! [`get_response`]: SkillRuntime::get_response

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::collector::ResponseRequest;
use super::errors::HandlerError;
use super::runtime::SkillRuntime;
use crate::domain::dialog::{extract_number, join_word_list, pronounce_number};
use crate::domain::foundation::Message;
use crate::domain::text::match_one;

/// Fuzzy score an answer needs to pick an option by name.
pub const DEFAULT_SELECTION_MIN_CONF: f64 = 0.65;

/// Options offered by [`SkillRuntime::ask_selection`].
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    options: Vec<String>,
    dialog: Option<String>,
    data: Map<String, JsonValue>,
    min_conf: f64,
    numeric: bool,
    num_retries: i32,
}

impl SelectionRequest {
    pub fn new<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            dialog: None,
            data: Map::new(),
            min_conf: DEFAULT_SELECTION_MIN_CONF,
            numeric: false,
            num_retries: -1,
        }
    }

    /// Question asked after the options are read out.
    pub fn dialog(mut self, dialog: impl Into<String>) -> Self {
        self.dialog = Some(dialog.into());
        self
    }

    pub fn data(mut self, data: Map<String, JsonValue>) -> Self {
        self.data = data;
        self
    }

    pub fn min_conf(mut self, min_conf: f64) -> Self {
        self.min_conf = min_conf;
        self
    }

    /// Read the options as a numbered list instead of "a, b or c?".
    pub fn numeric(mut self, numeric: bool) -> Self {
        self.numeric = numeric;
        self
    }

    pub fn num_retries(mut self, num_retries: i32) -> Self {
        self.num_retries = num_retries;
        self
    }
}

impl SkillRuntime {
    /// Asks a yes/no question.
    ///
    /// Returns `"yes"` or `"no"` when the answer contains only one of the two
    /// vocabularies, otherwise the raw answer (`None` without one).
    pub async fn ask_yesno(
        &self,
        source: &Message,
        prompt: &str,
        data: Map<String, JsonValue>,
    ) -> Result<Option<String>, HandlerError> {
        let request = ResponseRequest::new().dialog(prompt).data(data);
        let Some(answer) = self.get_response(source, request).await? else {
            return Ok(None);
        };

        let lang = self.inner.ports.sessions.get(source).lang;
        let yes = self.voc_match(&answer, "yes", Some(&lang), false).await;
        let no = self.voc_match(&answer, "no", Some(&lang), false).await;

        let mapped = match (yes, no) {
            (true, false) => "yes".to_string(),
            (false, true) => "no".to_string(),
            // "yes, I mean no" or something else entirely
            _ => answer,
        };
        Ok(Some(mapped))
    }

    /// Reads out the options and returns the one the user picked, by name
    /// (fuzzy), by "last", or by position ("the second one", "3").
    pub async fn ask_selection(
        &self,
        source: &Message,
        request: SelectionRequest,
    ) -> Result<Option<String>, HandlerError> {
        let SelectionRequest {
            options,
            dialog,
            data,
            min_conf,
            numeric,
            num_retries,
        } = request;

        match options.len() {
            0 => return Ok(None),
            1 => return Ok(options.into_iter().next()),
            _ => {}
        }

        let lang = self.inner.ports.sessions.get(source).lang;
        if numeric {
            for (idx, option) in options.iter().enumerate() {
                let position = pronounce_number(idx as u32 + 1, &lang);
                self.speak(source, &format!("{}, {}", position, option), false, true)
                    .await?;
            }
        } else {
            let or_word = self
                .word(&lang, "or")
                .await
                .unwrap_or_else(|| "or".to_string());
            let listing = format!("{}?", join_word_list(&options, &or_word, ","));
            self.speak(source, &listing, false, true).await?;
        }

        let mut response = ResponseRequest::new().data(data).num_retries(num_retries);
        if let Some(dialog) = dialog {
            response = response.dialog(dialog);
        }
        let Some(answer) = self.get_response(source, response).await? else {
            return Ok(None);
        };

        if let Some((best, score)) = match_one(&answer, &options) {
            if score >= min_conf {
                return Ok(Some(best));
            }
            debug!(answer = %answer, best = %best, score, "Selection below confidence");
        }

        if self.voc_match(&answer, "last", Some(&lang), false).await {
            return Ok(options.last().cloned());
        }

        let picked = extract_number(&answer, true, &lang)
            .map(|n| n as usize)
            .filter(|n| (1..=options.len()).contains(n))
            .map(|n| options[n - 1].clone());
        Ok(picked)
    }
}
