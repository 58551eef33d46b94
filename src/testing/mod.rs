mod fake_script_runner;
mod scripted_prompter;

pub use fake_script_runner::FakeScriptRunner;
pub use scripted_prompter::ScriptedPrompter;
