//! Scripted recognizer for tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use image::{DynamicImage, GenericImageView};

use super::{RecognitionRequest, TextRecognizer, TextSpan};
use crate::error::OcrError;

/// What a scripted call returns.
pub(crate) enum Reply {
    Spans(Vec<TextSpan>),
    Fail(String),
}

/// Parameters seen by one recognition call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeenCall {
    pub allowlist: Option<String>,
    pub min_glyph_size: u32,
    pub paragraph: bool,
    pub dimensions: (u32, u32),
}

/// Replies in call order; once the script runs out, every call returns no spans.
#[derive(Default)]
pub(crate) struct ScriptedRecognizer {
    replies: RefCell<VecDeque<Reply>>,
    calls: RefCell<Vec<SeenCall>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a single span of text.
    pub fn text(self, text: &str, confidence: f32) -> Self {
        self.reply(Reply::Spans(vec![TextSpan::new(
            [0.0, 0.0, 40.0, 0.0, 40.0, 12.0, 0.0, 12.0],
            text,
            confidence,
        )]))
    }

    /// Queue an empty result.
    pub fn nothing(self) -> Self {
        self.reply(Reply::Spans(Vec::new()))
    }

    /// Queue a failure.
    pub fn fail(self, reason: &str) -> Self {
        self.reply(Reply::Fail(reason.to_string()))
    }

    pub fn reply(self, reply: Reply) -> Self {
        self.replies.borrow_mut().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<SeenCall> {
        self.calls.borrow().clone()
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(
        &self,
        region: &DynamicImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<TextSpan>, OcrError> {
        self.calls.borrow_mut().push(SeenCall {
            allowlist: request.allowlist.map(str::to_string),
            min_glyph_size: request.min_glyph_size,
            paragraph: request.paragraph,
            dimensions: region.dimensions(),
        });

        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Spans(spans)) => Ok(spans),
            Some(Reply::Fail(reason)) => Err(OcrError::Recognition(reason)),
            None => Ok(Vec::new()),
        }
    }
}
