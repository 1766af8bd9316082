use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EventResponse, LayoutCommand, LayoutEngine, LayoutEvent};
use crate::common::config::Config;

/// One input to the engine, as stored in a recording.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStep {
    Event(LayoutEvent),
    Command(LayoutCommand),
}

impl ReplayStep {
    pub fn apply(self, engine: &mut LayoutEngine) -> EventResponse {
        match self {
            ReplayStep::Event(event) => engine.handle_event(event),
            ReplayStep::Command(command) => engine.handle_command(command),
        }
    }
}

/// Writes the config followed by every step, one RON value per line.
pub struct Record {
    file: Option<File>,
}

impl Record {
    pub fn new(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => Some(
                File::create(path).with_context(|| format!("creating {}", path.display()))?,
            ),
            None => None,
        };
        Ok(Self { file })
    }

    pub fn start(&mut self, config: &Config) -> anyhow::Result<()> {
        let Some(file) = self.file.as_mut() else { return Ok(()) };
        writeln!(file, "{}", ron::ser::to_string(config)?)?;
        Ok(())
    }

    pub fn on_step(&mut self, step: &ReplayStep) -> anyhow::Result<()> {
        let Some(file) = self.file.as_mut() else { return Ok(()) };
        writeln!(file, "{}", ron::ser::to_string(step)?)?;
        Ok(())
    }
}

/// Rebuilds an engine from a recording and feeds it every step.
pub fn replay(
    path: &Path,
    mut on_response: impl FnMut(&ReplayStep, &EventResponse),
) -> anyhow::Result<LayoutEngine> {
    let file = BufReader::new(File::open(path)?);
    let mut lines = file.lines();
    let Some(first) = lines.next() else {
        anyhow::bail!("{}: empty recording", path.display());
    };
    let config: Config = ron::de::from_str(&first?)?;
    let mut engine = LayoutEngine::new(config)?;
    for (number, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let step: ReplayStep = ron::de::from_str(&line)
            .with_context(|| format!("{}:{}", path.display(), number + 2))?;
        debug!(?step, "replaying");
        let response = step.clone().apply(&mut engine);
        on_response(&step, &response);
    }
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::layout_engine::{Handle, Reservation, WorkspaceId};

    fn appeared(id: isize) -> ReplayStep {
        ReplayStep::Event(LayoutEvent::WindowAppeared {
            handle: Handle(id),
            workspace: WorkspaceId::default(),
        })
    }

    #[test]
    fn recording_replays_to_the_same_tree() {
        let temp = NamedTempFile::new().unwrap();
        let steps = vec![
            appeared(1),
            ReplayStep::Event(LayoutEvent::WindowFocused { handle: Handle(1) }),
            ReplayStep::Command(LayoutCommand::Reserve(Reservation::Stack)),
            appeared(2),
        ];

        let mut engine = LayoutEngine::new(Config::default()).unwrap();
        let mut record = Record::new(Some(temp.path())).unwrap();
        record.start(&Config::default()).unwrap();
        let mut expected = Vec::new();
        for step in steps {
            record.on_step(&step).unwrap();
            expected.push(step.apply(&mut engine));
        }
        drop(record);

        let mut seen = Vec::new();
        let replayed = replay(temp.path(), |_, response| seen.push(response.clone())).unwrap();
        assert_eq!(seen, expected);
        assert_eq!(replayed.draw_tree(), engine.draw_tree());
    }

    #[test]
    fn empty_recording_is_an_error() {
        let temp = NamedTempFile::new().unwrap();
        assert!(replay(temp.path(), |_, _| {}).is_err());
    }
}
