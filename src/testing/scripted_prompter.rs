use std::collections::VecDeque;
use std::io;

use crate::ui::Prompter;

/// Replays canned answers and records every question asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    replies: VecDeque<String>,
    confirmations: VecDeque<String>,
    asked: Vec<(String, String)>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            confirmations: VecDeque::new(),
            asked: Vec::new(),
        }
    }

    pub fn with_confirmation(mut self, reply: impl Into<String>) -> Self {
        self.confirmations.push_back(reply.into());
        self
    }

    /// `(label, current)` for every setting prompt, in order.
    pub fn asked(&self) -> Vec<(String, String)> {
        self.asked.clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, label: &str, current: &str) -> io::Result<String> {
        self.asked.push((label.to_string(), current.to_string()));
        self.replies
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted reply left"))
    }

    fn confirm(&mut self) -> io::Result<String> {
        self.confirmations.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted confirmation")
        })
    }
}
