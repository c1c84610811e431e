use crate::view::{LineKey, PageLine, Tone};
use owo_colors::OwoColorize;
use std::{collections::BTreeMap, io::Write};

/// Prints page lines whose text or tone changed since the last render
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    colored: bool,
    shown: BTreeMap<LineKey, (String, Tone)>,
}

impl TerminalRenderer {
    pub fn new(colored: bool) -> Self {
        Self {
            colored,
            shown: BTreeMap::new(),
        }
    }

    /// Write changed lines to `out`, returning how many were written
    pub fn render(&mut self, lines: &[PageLine], out: &mut impl Write) -> std::io::Result<usize> {
        let mut written = 0;

        for line in lines {
            let current = (line.status.text.clone(), line.status.tone);
            if self.shown.get(&line.key) == Some(&current) {
                continue;
            }

            writeln!(
                out,
                "{}: {}",
                line.label,
                self.paint(&line.status.text, line.status.tone)
            )?;
            self.shown.insert(line.key, current);
            written += 1;
        }

        // lines that vanished are printed again when they come back
        self.shown
            .retain(|key, _| lines.iter().any(|line| line.key == *key));

        out.flush()?;
        Ok(written)
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.colored {
            return text.to_string();
        }

        match tone {
            Tone::Neutral => text.yellow().to_string(),
            Tone::Alert => text.red().to_string(),
            Tone::Success => text.green().to_string(),
        }
    }
}
