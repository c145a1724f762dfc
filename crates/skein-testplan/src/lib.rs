//! Test plans: scripted dialogue handlers.
//!
//! A test plan is a [`DialogueHandler`] that expects a specific script of
//! lines, options, and commands from a running program, rendering each
//! line through a string table before comparing. Plans are written in a
//! small text format:
//!
//! ```text
//! # comments and blank lines are skipped
//! line: Hi there!
//! option: Go left
//! option: Go right
//! select: 2
//! command: wave
//! stop
//! ```
//!
//! `select: n` answers the pending options batch by choosing option `n`
//! (1-based). A trailing `stop` is allowed and ignored.

#![warn(rust_2018_idioms)]

use std::fmt;
use std::path::Path;

use skein_markup::{StringTable, StringTableError};
use skein_runtime::{DialogueHandler, DialogueOption, Line, VmError, VmResult};

/// Errors from reading or completing a test plan.
#[derive(Debug, thiserror::Error)]
pub enum TestPlanError {
    /// A step line had no `kind: contents` structure.
    #[error("malformed step {0:?}")]
    MalformedStep(String),

    /// The plan file could not be read.
    #[error("reading test plan: {0}")]
    Io(#[from] std::io::Error),

    /// The dialogue ended with steps left over.
    #[error("stopped on step {index}: {step}")]
    Incomplete {
        /// Index of the first unconsumed step.
        index: usize,
        /// The unconsumed step.
        step: String,
    },

    /// The dialogue never delivered its completion event.
    #[error("did not receive dialogue_complete")]
    NoDialogueComplete,
}

/// One step in a test plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestStep {
    /// The step kind: `line`, `option`, `select`, or `command`.
    pub kind: String,
    /// The expected contents (or the 1-based choice for `select`).
    pub contents: String,
}

impl fmt::Display for TestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.contents)
    }
}

/// Parses the test plan text format.
pub fn read_test_plan(text: &str) -> Result<Vec<TestStep>, TestPlanError> {
    let mut steps = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with("stop") {
            // Superfluous stop at end of file.
            break;
        }
        let (kind, contents) = line
            .split_once(':')
            .ok_or_else(|| TestPlanError::MalformedStep(line.to_string()))?;
        steps.push(TestStep {
            kind: kind.trim().to_string(),
            contents: contents.trim().to_string(),
        });
    }
    Ok(steps)
}

/// A scripted dialogue handler.
pub struct TestPlan {
    table: StringTable,
    steps: Vec<TestStep>,
    step: usize,
    dialogue_completed: bool,
}

impl TestPlan {
    /// Builds a plan over parsed steps, rendering lines with `table`.
    pub fn new(steps: Vec<TestStep>, table: StringTable) -> Self {
        TestPlan {
            table,
            steps,
            step: 0,
            dialogue_completed: false,
        }
    }

    /// Parses plan text and builds the plan.
    pub fn read(text: &str, table: StringTable) -> Result<Self, TestPlanError> {
        Ok(TestPlan::new(read_test_plan(text)?, table))
    }

    /// Loads a plan from a file.
    pub fn load_file(path: impl AsRef<Path>, table: StringTable) -> Result<Self, TestPlanError> {
        let text = std::fs::read_to_string(path)?;
        TestPlan::read(&text, table)
    }

    /// Checks that every step was consumed and the dialogue completed.
    pub fn complete(&self) -> Result<(), TestPlanError> {
        if self.step != self.steps.len() {
            return Err(TestPlanError::Incomplete {
                index: self.step,
                step: self.steps[self.step].to_string(),
            });
        }
        if !self.dialogue_completed {
            return Err(TestPlanError::NoDialogueComplete);
        }
        Ok(())
    }

    fn next_step(&mut self, want: &str) -> VmResult<TestStep> {
        let Some(step) = self.steps.get(self.step) else {
            return Err(VmError::Handler(format!(
                "test plan got {want} after the last step"
            )));
        };
        if step.kind != want {
            return Err(VmError::Handler(format!(
                "test plan got {want}, expected {:?}",
                step.kind
            )));
        }
        let step = step.clone();
        self.step += 1;
        Ok(step)
    }

    fn render(&self, line: &Line) -> VmResult<String> {
        self.table
            .render(line)
            .map(|rendered| rendered.text().to_string())
            .map_err(|err: StringTableError| VmError::Handler(err.to_string()))
    }
}

impl DialogueHandler for TestPlan {
    fn line(&mut self, line: &Line) -> VmResult {
        let rendered = self.render(line)?;
        let step = self.next_step("line")?;
        if rendered != step.contents {
            return Err(VmError::Handler(format!(
                "test plan got line {rendered:?}, want {:?}",
                step.contents
            )));
        }
        Ok(())
    }

    fn options(&mut self, options: &[DialogueOption]) -> VmResult<usize> {
        for option in options {
            let rendered = self.render(&option.line)?;
            let step = self.next_step("option")?;
            if rendered != step.contents {
                return Err(VmError::Handler(format!(
                    "test plan got option {rendered:?}, want {:?}",
                    step.contents
                )));
            }
        }
        let step = self.next_step("select")?;
        let choice: usize = step.contents.parse().map_err(|_| {
            VmError::Handler(format!(
                "test plan select step is not a number: {:?}",
                step.contents
            ))
        })?;
        if choice == 0 {
            return Err(VmError::Handler(
                "test plan select steps are 1-based".to_string(),
            ));
        }
        Ok(choice - 1)
    }

    fn command(&mut self, _vm: &mut skein_runtime::VirtualMachine, command: &str) -> VmResult {
        let step = self.next_step("command")?;
        if command != step.contents {
            return Err(VmError::Handler(format!(
                "test plan got command {command:?}, want {:?}",
                step.contents
            )));
        }
        Ok(())
    }

    fn dialogue_complete(&mut self) -> VmResult {
        self.dialogue_completed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_test_plan_format() {
        let steps = read_test_plan(
            "# a comment\n\nline: Hi there!\noption: Left\noption: Right\nselect: 2\ncommand: wave\nstop\n",
        )
        .unwrap();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].kind, "line");
        assert_eq!(steps[0].contents, "Hi there!");
        assert_eq!(steps[3], TestStep {
            kind: "select".to_string(),
            contents: "2".to_string(),
        });
        assert_eq!(steps[4].kind, "command");
    }

    #[test]
    fn test_malformed_step() {
        assert!(matches!(
            read_test_plan("no colon here"),
            Err(TestPlanError::MalformedStep(_))
        ));
    }

    #[test]
    fn test_complete_requires_all_steps() {
        let table = StringTable::new("en").unwrap();
        let plan = TestPlan::read("line: never seen", table).unwrap();
        assert!(matches!(
            plan.complete(),
            Err(TestPlanError::Incomplete { index: 0, .. })
        ));
    }
}
