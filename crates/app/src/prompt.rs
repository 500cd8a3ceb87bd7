use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented reader over standard input.
pub struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next line with surrounding whitespace removed; `None` at end of input.
    ///
    /// Cancel safe, so it can sit in a `select!` arm.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_owned()))
    }

    /// Print `question` without a newline and read the reply.
    pub async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        print!("{question}");
        std::io::stdout().flush()?;
        self.next_line().await
    }
}
