use std::io::Write;

// Everything interactive (2FA code, patient selection, free-text custom
// fields) goes through this trait.
pub trait Prompter: Send + Sync {
    fn prompt(&self, label: &str) -> anyhow::Result<String>;
}

pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&self, label: &str) -> anyhow::Result<String> {
        print!("{label}: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}
