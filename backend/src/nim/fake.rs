use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::client::{ModelBackend, ModelError, ModelRole, Prompt};
use crate::preprocess::NormalizedImage;

/// Backend that replays canned replies in order and records every call.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<(ModelRole, Result<String, ModelError>)>>,
    calls: Mutex<Vec<(ModelRole, String)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, role: ModelRole, text: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back((role, Ok(text.to_string())));
        self
    }

    pub fn fail(self, role: ModelRole, error: ModelError) -> Self {
        self.replies.lock().unwrap().push_back((role, Err(error)));
        self
    }

    pub fn calls(&self) -> Vec<ModelRole> {
        self.calls.lock().unwrap().iter().map(|(role, _)| *role).collect()
    }

    pub fn prompt_for(&self, role: ModelRole) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, prompt)| prompt.clone())
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn invoke(
        &self,
        role: ModelRole,
        prompt: &Prompt,
        _image: Option<&NormalizedImage>,
    ) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push((role, prompt.text.clone()));
        let (expected, reply) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected {} call", role));
        assert_eq!(expected, role, "calls arrived out of order");
        reply
    }
}
