use anyhow::{anyhow, bail, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Source of interactive answers (terminal in the binary, scripted in tests)
pub trait Prompt {
    /// Show `message` and return the trimmed answer
    fn ask(&mut self, message: &str) -> Result<String>;
}

/// Terminal prompt backed by rustyline
pub struct LinePrompt {
    editor: DefaultEditor,
}

impl LinePrompt {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| anyhow!("failed to init rustyline: {e}"))?;
        Ok(LinePrompt { editor })
    }
}

impl Prompt for LinePrompt {
    fn ask(&mut self, message: &str) -> Result<String> {
        match self.editor.readline(message) {
            Ok(line) => Ok(line.trim().to_string()),
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => bail!("input cancelled"),
            Err(e) => Err(anyhow!("readline error: {e}")),
        }
    }
}

/// Prompt that replays fixed answers in order
#[cfg(test)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        ScriptedPrompt {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn ask(&mut self, message: &str) -> Result<String> {
        self.asked.push(message.to_string());
        self.answers
            .pop_front()
            .map(|a| a.trim().to_string())
            .ok_or_else(|| anyhow!("no scripted answer for {:?}", message))
    }
}
