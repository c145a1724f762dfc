//! Dialogue content types and the handler contracts.

use crate::async_adapter::AsyncAdapter;
use crate::error::{VmError, VmResult};
use crate::vm::VirtualMachine;

/// A line of dialogue, identified by its string table ID.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    /// The string table ID for the line.
    pub id: String,
    /// Values to interpolate into the user-facing text, in substitution
    /// order.
    pub substitutions: Vec<String>,
}

/// One option (among others) the player could choose.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueOption {
    /// The option's position in its batch. Pass this back to choose it.
    pub id: usize,

    /// The line to present for this option.
    pub line: Line,

    /// The node that runs next if this option is selected.
    pub destination_node: String,

    /// Whether the player should be permitted to select the option. False
    /// for options whose prerequisite condition was not met.
    pub is_available: bool,
}

/// Receives content and lifecycle events from the virtual machine.
///
/// Every method can return an error to abort the run; returning
/// [`VmError::Stop`] ends the run cleanly instead, as if a STOP
/// instruction had executed. All methods except [`options`] have no-op
/// defaults.
///
/// [`options`]: DialogueHandler::options
pub trait DialogueHandler {
    /// A node has begun executing.
    fn node_start(&mut self, _node_name: &str) -> VmResult {
        Ok(())
    }

    /// The machine anticipates it may deliver these lines during the
    /// node. Not every prepared line necessarily runs.
    fn prepare_for_lines(&mut self, _line_ids: &[String]) -> VmResult {
        Ok(())
    }

    /// A line of dialogue was run.
    fn line(&mut self, _line: &Line) -> VmResult {
        Ok(())
    }

    /// A batch of options was delivered. Blocks until a choice is made;
    /// returns the ID of the chosen option.
    fn options(&mut self, options: &[DialogueOption]) -> VmResult<usize>;

    /// A command was run. The machine is passed in so the embedder can
    /// steer it, e.g. by calling [`VirtualMachine::set_node`].
    fn command(&mut self, _vm: &mut VirtualMachine, _command: &str) -> VmResult {
        Ok(())
    }

    /// A node finished executing.
    fn node_complete(&mut self, _node_name: &str) -> VmResult {
        Ok(())
    }

    /// The dialogue as a whole is complete. Called exactly once per run.
    fn dialogue_complete(&mut self) -> VmResult {
        Ok(())
    }
}

/// Receives events from an [`AsyncAdapter`].
///
/// Unlike [`DialogueHandler`], the machine pauses automatically during
/// each event until [`AsyncAdapter::go`], [`AsyncAdapter::go_with_choice`],
/// or [`AsyncAdapter::abort`] is called — from inside the callback or from
/// any other thread.
pub trait AsyncDialogueHandler: Send {
    /// A node has begun executing.
    fn node_start(&mut self, _adapter: &AsyncAdapter, _node_name: &str) {}

    /// The machine anticipates it may deliver these lines during the node.
    fn prepare_for_lines(&mut self, _adapter: &AsyncAdapter, _line_ids: &[String]) {}

    /// A line of dialogue was run.
    fn line(&mut self, _adapter: &AsyncAdapter, _line: &Line) {}

    /// A batch of options was delivered. Continue with
    /// [`AsyncAdapter::go_with_choice`].
    fn options(&mut self, adapter: &AsyncAdapter, options: &[DialogueOption]);

    /// A command was run.
    fn command(&mut self, _adapter: &AsyncAdapter, _command: &str) {}

    /// A node finished executing.
    fn node_complete(&mut self, _adapter: &AsyncAdapter, _node_name: &str) {}

    /// The dialogue as a whole is complete.
    fn dialogue_complete(&mut self, _adapter: &AsyncAdapter) {}
}

/// A [`DialogueHandler`] that accepts every event and always picks the
/// first option. Useful in tests and as a base for embedders that only
/// care about a couple of events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDialogueHandler;

impl DialogueHandler for NoopDialogueHandler {
    fn options(&mut self, options: &[DialogueOption]) -> VmResult<usize> {
        options
            .first()
            .map(|o| o.id)
            .ok_or_else(|| VmError::Handler("no options delivered".to_string()))
    }
}

/// An [`AsyncDialogueHandler`] that continues the machine immediately on
/// every event, picking the first option. The async analog of
/// [`NoopDialogueHandler`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAsyncDialogueHandler;

impl AsyncDialogueHandler for NoopAsyncDialogueHandler {
    fn node_start(&mut self, adapter: &AsyncAdapter, _node_name: &str) {
        let _ = adapter.go();
    }

    fn prepare_for_lines(&mut self, adapter: &AsyncAdapter, _line_ids: &[String]) {
        let _ = adapter.go();
    }

    fn line(&mut self, adapter: &AsyncAdapter, _line: &Line) {
        let _ = adapter.go();
    }

    fn options(&mut self, adapter: &AsyncAdapter, options: &[DialogueOption]) {
        match options.first() {
            Some(option) => {
                let _ = adapter.go_with_choice(option.id);
            }
            None => {
                let _ = adapter.abort(Some(VmError::Handler(
                    "no options delivered".to_string(),
                )));
            }
        }
    }

    fn command(&mut self, adapter: &AsyncAdapter, _command: &str) {
        let _ = adapter.go();
    }

    fn node_complete(&mut self, adapter: &AsyncAdapter, _node_name: &str) {
        let _ = adapter.go();
    }

    fn dialogue_complete(&mut self, adapter: &AsyncAdapter) {
        let _ = adapter.go();
    }
}
