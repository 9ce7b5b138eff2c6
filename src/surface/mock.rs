use std::sync::{Mutex, PoisonError};

use super::Surface;

/// A region or alert write, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Summary(String),
    Categorization(String),
    Alert(String),
}

#[derive(Debug, Default)]
struct State {
    prompt: String,
    summary: String,
    categorization: String,
    writes: Vec<Record>,
}

/// An in-memory surface for tests. Records every write.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    state: Mutex<State>,
}

impl RecordingSurface {
    pub fn new(prompt: &str) -> Self {
        let surface = Self::default();
        surface.set_prompt(prompt);
        surface
    }

    /// Start with both regions already showing something.
    pub fn with_regions(prompt: &str, summary: &str, categorization: &str) -> Self {
        let surface = Self::new(prompt);
        {
            let mut state = surface.lock();
            state.summary = summary.to_string();
            state.categorization = categorization.to_string();
        }
        surface
    }

    pub fn set_prompt(&self, prompt: &str) {
        self.lock().prompt = prompt.to_string();
    }

    pub fn summary(&self) -> String {
        self.lock().summary.clone()
    }

    pub fn categorization(&self) -> String {
        self.lock().categorization.clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.lock()
            .writes
            .iter()
            .filter_map(|w| match w {
                Record::Alert(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn writes(&self) -> Vec<Record> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Surface for RecordingSurface {
    fn prompt_text(&self) -> String {
        self.lock().prompt.clone()
    }

    fn set_summary(&self, text: &str) {
        let mut state = self.lock();
        state.summary = text.to_string();
        state.writes.push(Record::Summary(text.to_string()));
    }

    fn set_categorization(&self, text: &str) {
        let mut state = self.lock();
        state.categorization = text.to_string();
        state.writes.push(Record::Categorization(text.to_string()));
    }

    fn alert(&self, message: &str) {
        self.lock().writes.push(Record::Alert(message.to_string()));
    }
}
